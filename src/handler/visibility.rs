use crate::handler::trait_::Handler;
use crate::record::{Channel, Record};
use serde::Deserialize;
use smart_default::SmartDefault;
use std::collections::HashSet;
use std::sync::Arc;

/// 可见性模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityMode {
    /// 默认全部显示，维护排除集合
    ShowAll,
    /// 默认全部隐藏，维护放行集合
    HideAll,
}

/// Visibility 配置
#[derive(Debug, Clone, Deserialize, SmartDefault)]
#[serde(default)]
pub struct VisibilityConfig {
    /// 可见性模式
    #[default(VisibilityMode::ShowAll)]
    pub mode: VisibilityMode,

    /// 初始集合：show_all 模式下为排除集，hide_all 模式下为放行集
    pub channels: Vec<Channel>,
}

/// 按通道过滤记录的可见性处理器
///
/// 携带 `Force` 标记的记录无条件放行。结构信号（轨道开闭、终止）从不
/// 被过滤，保证下游 sink 的括号配对不被破坏。
pub struct Visibility {
    mode: VisibilityMode,
    set: HashSet<Channel>,
}

impl Visibility {
    pub fn new(config: VisibilityConfig) -> Self {
        Self {
            mode: config.mode,
            set: config.channels.into_iter().collect(),
        }
    }

    /// 默认全部显示
    pub fn show_all() -> Self {
        Self {
            mode: VisibilityMode::ShowAll,
            set: HashSet::new(),
        }
    }

    /// 默认全部隐藏
    pub fn hide_all() -> Self {
        Self {
            mode: VisibilityMode::HideAll,
            set: HashSet::new(),
        }
    }

    /// 放行一个通道，返回该通道的有效可见性是否发生了变化
    pub fn also_show(&mut self, channel: Channel) -> bool {
        match self.mode {
            VisibilityMode::ShowAll => self.set.remove(&channel),
            VisibilityMode::HideAll => self.set.insert(channel),
        }
    }

    /// 隐藏一个通道，返回该通道的有效可见性是否发生了变化
    pub fn also_hide(&mut self, channel: Channel) -> bool {
        match self.mode {
            VisibilityMode::ShowAll => self.set.insert(channel),
            VisibilityMode::HideAll => self.set.remove(&channel),
        }
    }

    /// 指定通道当前是否可见
    pub fn is_visible(&self, channel: &Channel) -> bool {
        match self.mode {
            VisibilityMode::ShowAll => !self.set.contains(channel),
            VisibilityMode::HideAll => self.set.contains(channel),
        }
    }

    fn passes(&self, record: &Record) -> bool {
        match self.mode {
            // show_all：任一通道被排除即拦下
            VisibilityMode::ShowAll => {
                !record.channels.iter().any(|c| self.set.contains(c))
            }
            // hide_all：任一通道被放行即通过
            VisibilityMode::HideAll => {
                record.channels.iter().any(|c| self.set.contains(c))
            }
        }
    }
}

impl Handler for Visibility {
    fn handle(&mut self, record: &Arc<Record>) -> Vec<Arc<Record>> {
        if record.is_forced() || self.passes(record) {
            vec![record.clone()]
        } else {
            Vec::new()
        }
    }

    fn name(&self) -> &'static str {
        "visibility"
    }
}

crate::impl_from!(VisibilityConfig => Visibility);
crate::impl_box_from!(Visibility => dyn Handler);
