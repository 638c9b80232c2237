//! 日志宏
//!
//! 面向全局核心的便捷入口，通道列表与内容用 `;` 分隔。
//!
//! # 示例
//!
//! ```ignore
//! use tracklog::record::Channel;
//!
//! tracklog::log!("plain message");
//! tracklog::log!(Channel::Debug; "tagged message");
//! tracklog::logf!(Channel::Warn; "usage at {}%", 93);
//! ```

/// 记录一条日志（全局核心）
///
/// # 示例
///
/// ```ignore
/// log!("started");
/// log!(Channel::Debug, Channel::custom("db"); "pool ready");
/// ```
#[macro_export]
macro_rules! log {
    ($($channel:expr),+ ; $content:expr) => {
        $crate::global::log([$($channel),+], $content)
    };
    ($content:expr) => {
        $crate::global::log($crate::record::ChannelSet::empty(), $content)
    };
}

/// 格式化并记录一条日志（全局核心）
///
/// # 示例
///
/// ```ignore
/// logf!("loaded {} entries", n);
/// logf!(Channel::Warn; "usage at {}%", usage);
/// ```
#[macro_export]
macro_rules! logf {
    ($($channel:expr),+ ; $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::global::logf([$($channel),+], format_args!($fmt $(, $arg)*))
    };
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::global::logf($crate::record::ChannelSet::empty(), format_args!($fmt $(, $arg)*))
    };
}
