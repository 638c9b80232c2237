use crate::record::ChannelSet;
use crate::sink::trait_::Sink;
use anyhow::Result;
use serde::Deserialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

/// FileSink 配置
#[derive(Debug, Clone, Deserialize)]
pub struct FileSinkConfig {
    /// 日志文件路径
    pub file_path: String,
}

/// 文件输出 sink
///
/// 以追加模式写入文件，父目录不存在时自动创建。打开或写入失败按
/// 运行期 IO 错误处理：在标准错误上报告一次，之后降级为空操作，
/// 绝不让日志写入失败影响宿主程序。
pub struct FileSink {
    file: Option<File>,
    config: FileSinkConfig,
    reported: bool,
}

impl FileSink {
    pub fn new(config: FileSinkConfig) -> Self {
        let file = Self::open(&config.file_path);
        let mut sink = Self {
            file: None,
            config,
            reported: false,
        };
        match file {
            Ok(file) => sink.file = Some(file),
            Err(err) => sink.report(&err),
        }
        sink
    }

    /// 日志文件路径
    pub fn path(&self) -> &str {
        &self.config.file_path
    }

    /// 是否已降级为空操作
    pub fn is_degraded(&self) -> bool {
        self.file.is_none()
    }

    fn open(file_path: &str) -> Result<File> {
        let path = PathBuf::from(file_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(OpenOptions::new().create(true).append(true).open(&path)?)
    }

    /// 只报告一次，之后静默
    fn report(&mut self, err: &anyhow::Error) {
        if !self.reported {
            eprintln!(
                "tracklog: file sink '{}' degraded to no-op: {}",
                self.config.file_path, err
            );
            self.reported = true;
        }
        self.file = None;
    }
}

impl Sink for FileSink {
    fn print(&mut self, _channels: &ChannelSet, text: &str) -> Result<()> {
        let Some(file) = self.file.as_mut() else {
            return Ok(());
        };

        let result = writeln!(file, "{}", text);
        if let Err(err) = result {
            self.report(&err.into());
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(file) = self.file.as_mut() {
            let result = file.flush();
            if let Err(err) = result {
                self.report(&err.into());
            }
        }
        Ok(())
    }
}

crate::impl_from!(FileSinkConfig => FileSink);
crate::impl_box_from!(FileSink => dyn Sink);
