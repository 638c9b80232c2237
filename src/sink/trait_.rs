use crate::record::ChannelSet;
use anyhow::Result;

/// 终端输出 trait
///
/// sink 需要实现的最小契约：接收一行排版完成的文本并写出。
/// 边距、缩进、轨道括号等排版职责全部在上游的
/// [`SinkHandler`](crate::sink::SinkHandler) 完成。
pub trait Sink: Send {
    /// 写出一行文本，`channels` 为该行所属记录的通道集合
    fn print(&mut self, channels: &ChannelSet, text: &str) -> Result<()>;

    /// 刷新缓冲区（默认空操作）
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
