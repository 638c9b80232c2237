use crate::record::ChannelSet;
use crate::sink::trait_::Sink;
use anyhow::Result;
use serde::Deserialize;
use std::sync::{Arc, Mutex};

/// MemorySink 配置（无配置项，保留空结构以接入装配表）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MemorySinkConfig {}

/// 内存捕获 sink
///
/// 把写出的行缓存在内存里供断言检查，是本 crate 自身以及下游使用方
/// 的测试工具。`clone` 得到的句柄共享同一份缓冲，因此可以把 sink
/// 装进处理树之后继续通过句柄读取输出。
#[derive(Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new(_config: MemorySinkConfig) -> Self {
        Self::default()
    }

    /// 捕获到的所有行
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// 清空缓冲
    pub fn clear(&self) {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

impl Sink for MemorySink {
    fn print(&mut self, _channels: &ChannelSet, text: &str) -> Result<()> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(text.to_string());
        Ok(())
    }
}

crate::impl_from!(MemorySinkConfig => MemorySink);
crate::impl_box_from!(MemorySink => dyn Sink);
