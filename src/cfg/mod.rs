//! 声明式装配支持
//!
//! `TypeOptions` 描述一个组件（类型名 + 配置），注册表负责在启动时把它
//! 实例化为 trait object。装配只发生在日志开始之前，属于启动期配置：
//! 这里的任何失败都是致命错误，直接向调用方返回 `Err`，不做降级。

mod macros;
mod registry;
mod type_options;

pub use registry::{create_trait_from_type_options, register_trait};
pub use type_options::TypeOptions;

use thiserror::Error;

/// 配置错误
///
/// 与运行期的使用性错误不同，这一类错误发生在装配阶段，一律快速失败。
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 组件名未注册
    #[error("type '{0}' is not registered for this component")]
    TypeNotRegistered(String),

    /// 目标 trait 没有任何注册实现
    #[error("no implementations registered for this component")]
    NoImplementations,

    /// 组件配置无法解析
    #[error("invalid options for type '{type_name}': {source}")]
    InvalidOptions {
        type_name: String,
        #[source]
        source: serde_json::Error,
    },

    /// 有轨道开启时禁止修改处理树形状
    #[error("handler tree shape is frozen while tracks are open (depth = {0})")]
    TreeLocked(usize),
}
