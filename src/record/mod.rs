//! 记录与通道数据模型
//!
//! 一条 `Record` 是一次日志事件的不可变快照：内容、通道集合、嵌套深度、
//! 时间戳与产生线程。`Signal` 把记录与轨道开闭、终止等结构事件统一成
//! 处理树的分发单元。

mod channel;
mod content;
mod record;
mod signal;

pub use channel::{Channel, ChannelSet};
pub use content::{Content, ErrorLink, ErrorTrail};
pub use record::Record;
pub use signal::Signal;
