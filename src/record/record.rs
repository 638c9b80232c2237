use crate::record::channel::ChannelSet;
use crate::record::content::Content;
use std::time::SystemTime;

/// 一条日志记录
///
/// 创建后不可变，分发期间以 `Arc<Record>` 在处理树内共享而非复制。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// 记录内容
    pub content: Content,
    /// 通道集合（已按不变式排序）
    pub channels: ChannelSet,
    /// 产生时所处的轨道嵌套深度
    pub depth: usize,
    /// 产生时刻
    pub timestamp: SystemTime,
    /// 产生线程（已缓存的字符串表示）
    pub thread_id: String,
}

impl Record {
    /// 在指定深度创建记录，时间戳取当前时刻
    pub fn new(channels: ChannelSet, content: Content, depth: usize) -> Self {
        Self {
            content,
            channels,
            depth,
            timestamp: SystemTime::now(),
            // 缓存 thread_id 的字符串表示，避免每次格式化时转换
            thread_id: format!("{:?}", std::thread::current().id()),
        }
    }

    /// 基于本记录派生一条新记录（如折叠汇总），继承通道与深度，时间戳取当前时刻
    pub fn derived(&self, content: Content) -> Self {
        Self {
            content,
            channels: self.channels.clone(),
            depth: self.depth,
            timestamp: SystemTime::now(),
            thread_id: self.thread_id.clone(),
        }
    }

    /// 是否携带 `Force` 强制标记
    pub fn is_forced(&self) -> bool {
        self.channels.is_forced()
    }
}
