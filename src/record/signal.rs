use crate::record::record::Record;
use std::sync::Arc;
use std::time::SystemTime;

/// 处理树分发信号
///
/// 只有 `Log` 与 `StartTrack` 携带记录，`EndTrack`/`Shutdown` 仅携带结构元数据。
/// 轨道是严格的栈结构：每个 `StartTrack` 将全局深度加一，匹配的 `EndTrack` 减一。
#[derive(Debug, Clone)]
pub enum Signal {
    /// 一条普通记录
    Log(Arc<Record>),
    /// 打开一层轨道，记录为轨道标题（深度为加一之前的值）
    StartTrack(Arc<Record>),
    /// 关闭一层轨道，深度为减一之后的值
    EndTrack {
        depth: usize,
        timestamp: SystemTime,
    },
    /// 终止信号，整个处理树只收到一次
    Shutdown,
}

impl Signal {
    /// 是否为结构信号（需要在派生记录之后继续向下传播）
    pub fn is_structural(&self) -> bool {
        !matches!(self, Signal::Log(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::channel::ChannelSet;
    use crate::record::content::Content;

    #[test]
    fn test_signal_is_structural() {
        let record = Arc::new(Record::new(ChannelSet::empty(), Content::text("x"), 0));

        assert!(!Signal::Log(record.clone()).is_structural());
        assert!(Signal::StartTrack(record).is_structural());
        assert!(Signal::EndTrack {
            depth: 0,
            timestamp: SystemTime::now()
        }
        .is_structural());
        assert!(Signal::Shutdown.is_structural());
    }
}
