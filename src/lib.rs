//! tracklog - 层次化、按通道路由的日志核心
//!
//! 日志事件从任意调用点（可能并发）进入，按嵌套的「轨道」组织成逻辑
//! 作用域，流经一棵可组合的处理树（过滤、折叠、改名、落地），并保证
//! 多线程同时打日志时输出仍然可读。
//!
//! # 特性
//!
//! - 通道路由：内置 error/warn/debug/force/stdout/stderr，自定义通道任意扩展
//! - 轨道嵌套：StartTrack/EndTrack 构成严格的栈，sink 按深度缩进并配对括号
//! - 处理树：Visibility、ChannelFilter、Rerouter、RepeatCollapser、SinkHandler
//!   自由组合，父节点输出扇出到每个子节点
//! - 线程仲裁：start_threads/finish_thread/end_threads 把并发输出串行成
//!   按线程连续的块
//! - 声明式装配：JSON5 配置一次性构建处理树
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use tracklog::record::Channel;
//!
//! fn main() -> anyhow::Result<()> {
//!     // 使用 JSON5 配置构建处理树（组件会自动注册）
//!     let tree = tracklog::build_tree_from_json(r#"
//!         [
//!             {
//!                 type: "Visibility",
//!                 options: { mode: "show_all" },
//!                 children: [
//!                     {
//!                         type: "RepeatCollapser",
//!                         children: [
//!                             { type: "SinkHandler", options: { sink: { type: "ConsoleSink" } } }
//!                         ]
//!                     }
//!                 ]
//!             }
//!         ]
//!     "#)?;
//!     tracklog::global::init(tree)?;
//!
//!     tracklog::log!(Channel::Debug; "application started");
//!     tracklog::global::start_track(Channel::custom("boot"), "loading config");
//!     tracklog::logf!("entries = {}", 42);
//!     tracklog::global::end_track();
//!
//!     tracklog::global::shutdown();
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod cfg;
pub mod dispatch;
pub mod global;
pub mod handler;
pub mod macros;
pub mod record;
pub mod sink;

// 重新导出主要的公共 API
pub use builder::{branch, build_tree, build_tree_from_json, chain, HandlerTreeConfig};
pub use cfg::{create_trait_from_type_options, register_trait, ConfigError, TypeOptions};
pub use dispatch::{ChannelGroup, Dispatcher, LogCore, ThreadArbiter};
pub use handler::{
    create_handler_from_options, register_handlers, ChannelFilter, CollapsePolicy, Handler,
    HandlerTree, RepeatCollapser, RepeatCollapserConfig, Rerouter, Visibility, VisibilityConfig,
};
pub use record::{Channel, ChannelSet, Content, ErrorTrail, Record, Signal};
pub use sink::{
    create_sink_from_options, register_sinks, ConsoleSink, FileSink, MemorySink, Sink,
    SinkHandler, SinkHandlerConfig,
};
