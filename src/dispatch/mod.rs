//! 分发与线程仲裁
//!
//! `Dispatcher` 维护全局深度并驱动处理树；`ThreadArbiter` 把并发调用
//! 串行化为按线程连续的输出块；`LogCore` 把二者装进一个显式的上下文
//! 对象，所有公共入口在一把互斥锁下执行。

mod arbiter;
mod dispatcher;
mod log_core;

pub use arbiter::{DrainReport, QueuedOp, ThreadArbiter};
pub use dispatcher::Dispatcher;
pub use log_core::{ChannelGroup, LogCore};
