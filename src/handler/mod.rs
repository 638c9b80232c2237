//! 记录处理器与处理树
//!
//! `Handler` 是处理树节点的多态单元：可见性过滤、谓词过滤、通道改名、
//! 重复折叠，以及终端 sink 的排版适配。`HandlerTree` 把它们组织成
//! 有序的树，父节点的输出扇出到每一个子节点。

mod dedup;
mod filter;
mod registry;
mod reroute;
mod trait_;
mod tree;
mod visibility;

pub use dedup::{
    CollapsePolicy, CollapsePolicyKind, ExactPolicy, MessagePolicy, RepeatCollapser,
    RepeatCollapserConfig,
};
pub use filter::ChannelFilter;
pub use registry::{create_handler_from_options, register_handlers};
pub use reroute::{Rerouter, RerouterConfig};
pub use trait_::Handler;
pub use tree::HandlerTree;
pub use visibility::{Visibility, VisibilityConfig, VisibilityMode};
