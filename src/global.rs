//! 进程级默认核心
//!
//! 首次使用时惰性初始化，默认装一个输出到终端的 sink。`init` 可以在
//! 日志开始之前整体替换处理树。这里的自由函数是 [`LogCore`] 同名方法
//! 的薄封装，宏 [`log!`](crate::log!) / [`logf!`](crate::logf!) 也落到
//! 这一层。

use crate::dispatch::{ChannelGroup, LogCore};
use crate::handler::HandlerTree;
use crate::record::{ChannelSet, Content};
use crate::sink::{ConsoleSink, ConsoleSinkConfig, SinkHandler};
use anyhow::Result;
use once_cell::sync::Lazy;
use std::fmt;

/// 全局 LogCore 单例
///
/// 默认包含一个输出到终端的 sink
static GLOBAL_CORE: Lazy<LogCore> = Lazy::new(|| {
    let core = LogCore::new();
    let handler = SinkHandler::with_sink(ConsoleSink::new(ConsoleSinkConfig::default()));
    core.install(HandlerTree::root().with_child(HandlerTree::node(handler)))
        .expect("fresh core has no open tracks");
    core
});

/// 获取全局核心
pub fn core() -> &'static LogCore {
    &GLOBAL_CORE
}

/// 整体替换全局核心的处理树
///
/// 只允许在没有轨道开启时调用，日志开始之后的装配是配置错误。
pub fn init(tree: HandlerTree) -> Result<()> {
    core().install(tree)
}

/// 在当前深度记录一条日志（全局）
pub fn log(channels: impl Into<ChannelSet>, content: impl Into<Content>) {
    core().log(channels, content);
}

/// 格式化并记录一条日志（全局）
pub fn logf(channels: impl Into<ChannelSet>, args: fmt::Arguments<'_>) {
    core().logf(channels, args);
}

/// 打开一层轨道（全局）
pub fn start_track(channels: impl Into<ChannelSet>, title: impl Into<Content>) {
    core().start_track(channels, title);
}

/// 关闭最内层轨道（全局）
pub fn end_track() {
    core().end_track();
}

/// 关闭最内层轨道并核对标题（全局）
pub fn end_track_titled(title: &str) {
    core().end_track_titled(title);
}

/// 打开线程分组（全局）
pub fn start_threads(title: impl Into<Content>) {
    core().start_threads(title);
}

/// 当前线程声明完成（全局）
pub fn finish_thread() {
    core().finish_thread();
}

/// 关闭线程分组（全局）
pub fn end_threads(title: &str) {
    core().end_threads(title);
}

/// 终止全局核心
pub fn shutdown() {
    core().shutdown();
}

/// 预绑定一组通道（全局）
pub fn group(channels: impl Into<ChannelSet>) -> ChannelGroup<'static> {
    core().group(channels)
}
