use crate::cfg::{create_trait_from_type_options, register_trait, TypeOptions};
use crate::sink::console_sink::{ConsoleSink, ConsoleSinkConfig};
use crate::sink::file_sink::{FileSink, FileSinkConfig};
use crate::sink::memory_sink::{MemorySink, MemorySinkConfig};
use crate::sink::trait_::Sink;
use anyhow::Result;

/// 注册所有内置 Sink 实现
pub fn register_sinks() -> Result<()> {
    register_trait::<ConsoleSink, dyn Sink, ConsoleSinkConfig>("ConsoleSink")?;
    register_trait::<FileSink, dyn Sink, FileSinkConfig>("FileSink")?;
    register_trait::<MemorySink, dyn Sink, MemorySinkConfig>("MemorySink")?;
    Ok(())
}

/// 从 TypeOptions 创建 Sink
pub fn create_sink_from_options(options: &TypeOptions) -> Result<Box<dyn Sink>> {
    create_trait_from_type_options(options)
}
