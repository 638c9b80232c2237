use crate::record::{Channel, ChannelSet};
use crate::sink::trait_::Sink;
use anyhow::Result;
use serde::Deserialize;
use smart_default::SmartDefault;
use std::io::{self, Write};

/// 输出目标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, SmartDefault)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    #[default]
    Stdout,
    Stderr,
}

/// ConsoleSink 配置
#[derive(Debug, Clone, Deserialize, SmartDefault)]
#[serde(default)]
pub struct ConsoleSinkConfig {
    /// 默认输出目标
    pub target: Target,

    /// 带 error/stderr 通道的行改写标准错误
    #[default = true]
    pub split_streams: bool,
}

/// 终端输出 sink
pub struct ConsoleSink {
    config: ConsoleSinkConfig,
}

impl ConsoleSink {
    pub fn new(config: ConsoleSinkConfig) -> Self {
        Self { config }
    }

    fn target_for(&self, channels: &ChannelSet) -> Target {
        if self.config.split_streams
            && (channels.contains(&Channel::Stderr) || channels.contains(&Channel::Error))
        {
            Target::Stderr
        } else if channels.contains(&Channel::Stdout) {
            Target::Stdout
        } else {
            self.config.target
        }
    }
}

impl Sink for ConsoleSink {
    fn print(&mut self, channels: &ChannelSet, text: &str) -> Result<()> {
        match self.target_for(channels) {
            Target::Stdout => {
                let mut stdout = io::stdout().lock();
                writeln!(stdout, "{}", text)?;
                stdout.flush()?;
            }
            Target::Stderr => {
                let mut stderr = io::stderr().lock();
                writeln!(stderr, "{}", text)?;
                stderr.flush()?;
            }
        }
        Ok(())
    }
}

crate::impl_from!(ConsoleSinkConfig => ConsoleSink);
crate::impl_box_from!(ConsoleSink => dyn Sink);
