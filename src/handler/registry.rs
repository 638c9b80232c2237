use crate::cfg::{create_trait_from_type_options, register_trait, TypeOptions};
use crate::handler::dedup::{RepeatCollapser, RepeatCollapserConfig};
use crate::handler::reroute::{Rerouter, RerouterConfig};
use crate::handler::trait_::Handler;
use crate::handler::visibility::{Visibility, VisibilityConfig};
use crate::sink::{register_sinks, SinkHandler, SinkHandlerCreateConfig};
use anyhow::Result;

/// 注册所有内置 Handler 实现
///
/// SinkHandler 的配置里嵌套 sink 组件，因此一并注册全部内置 Sink。
pub fn register_handlers() -> Result<()> {
    register_sinks()?;
    register_trait::<Visibility, dyn Handler, VisibilityConfig>("Visibility")?;
    register_trait::<Rerouter, dyn Handler, RerouterConfig>("Rerouter")?;
    register_trait::<RepeatCollapser, dyn Handler, RepeatCollapserConfig>("RepeatCollapser")?;
    register_trait::<SinkHandler, dyn Handler, SinkHandlerCreateConfig>("SinkHandler")?;
    Ok(())
}

/// 从 TypeOptions 创建 Handler
pub fn create_handler_from_options(options: &TypeOptions) -> Result<Box<dyn Handler>> {
    create_trait_from_type_options(options)
}
