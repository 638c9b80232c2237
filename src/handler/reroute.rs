use crate::handler::trait_::Handler;
use crate::record::{Channel, Record};
use serde::Deserialize;
use std::sync::Arc;

/// Rerouter 配置
#[derive(Debug, Clone, Deserialize)]
pub struct RerouterConfig {
    /// 改名前的通道
    pub from: Channel,
    /// 改名后的通道
    pub to: Channel,
}

/// 通道改名处理器
///
/// 命中 `from` 通道的记录派生出一份新记录，通道集合中的 `from` 替换为
/// `to`，内容与深度不变。未命中的记录原样透传。
pub struct Rerouter {
    config: RerouterConfig,
}

impl Rerouter {
    pub fn new(config: RerouterConfig) -> Self {
        Self { config }
    }

    /// 便捷构造
    pub fn rename(from: Channel, to: Channel) -> Self {
        Self::new(RerouterConfig { from, to })
    }
}

impl Handler for Rerouter {
    fn handle(&mut self, record: &Arc<Record>) -> Vec<Arc<Record>> {
        if !record.channels.contains(&self.config.from) {
            return vec![record.clone()];
        }

        let rerouted = Record {
            content: record.content.clone(),
            channels: record.channels.rename(&self.config.from, &self.config.to),
            depth: record.depth,
            timestamp: record.timestamp,
            thread_id: record.thread_id.clone(),
        };
        vec![Arc::new(rerouted)]
    }

    fn name(&self) -> &'static str {
        "rerouter"
    }
}

crate::impl_from!(RerouterConfig => Rerouter);
crate::impl_box_from!(Rerouter => dyn Handler);
