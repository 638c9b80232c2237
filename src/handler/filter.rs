use crate::handler::trait_::Handler;
use crate::record::{Channel, Record};
use std::sync::Arc;

/// 谓词过滤处理器
///
/// 以任意谓词决定记录去留。与 [`Visibility`](crate::handler::Visibility)
/// 的区别：这里的判定条件是调用方代码而非通道集合，因此不提供声明式
/// 配置入口。携带 `Force` 的记录同样无条件放行。
pub struct ChannelFilter {
    predicate: Box<dyn Fn(&Record) -> bool + Send>,
}

impl ChannelFilter {
    /// 以谓词创建过滤器，谓词返回 true 表示放行
    pub fn new(predicate: impl Fn(&Record) -> bool + Send + 'static) -> Self {
        Self {
            predicate: Box::new(predicate),
        }
    }

    /// 只放行携带指定通道的记录
    pub fn accept_channel(channel: Channel) -> Self {
        Self::new(move |record| record.channels.contains(&channel))
    }

    /// 拦下携带指定通道的记录
    pub fn reject_channel(channel: Channel) -> Self {
        Self::new(move |record| !record.channels.contains(&channel))
    }
}

impl Handler for ChannelFilter {
    fn handle(&mut self, record: &Arc<Record>) -> Vec<Arc<Record>> {
        if record.is_forced() || (self.predicate)(record) {
            vec![record.clone()]
        } else {
            Vec::new()
        }
    }

    fn name(&self) -> &'static str {
        "filter"
    }
}
