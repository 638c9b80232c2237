//! 终端输出
//!
//! `Sink` 是外部输出介质需要实现的最小契约：一行排版完成的文本。
//! `SinkHandler` 站在每个 sink 之前，承担边距、缩进、轨道括号与
//! 错误链展开等全部排版职责。

mod console_sink;
mod file_sink;
mod memory_sink;
mod registry;
mod sink_handler;
mod trait_;

pub use console_sink::{ConsoleSink, ConsoleSinkConfig, Target};
pub use file_sink::{FileSink, FileSinkConfig};
pub use memory_sink::{MemorySink, MemorySinkConfig};
pub use registry::{create_sink_from_options, register_sinks};
pub use sink_handler::{SinkHandler, SinkHandlerConfig, SinkHandlerCreateConfig};
pub use trait_::Sink;
