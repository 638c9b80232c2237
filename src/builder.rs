//! 处理树装配
//!
//! 两种装配方式：`chain`/`branch` 组合子面向代码，`HandlerTreeConfig`
//! 面向声明式配置（JSON5）。两者都在日志开始之前执行一次，运行期不再
//! 触碰树的形状。

use crate::cfg::TypeOptions;
use crate::handler::{create_handler_from_options, register_handlers, Handler, HandlerTree};
use anyhow::Result;
use serde::Deserialize;
use std::sync::Once;

/// 注册所有内置组件（只执行一次）
static REGISTER_ONCE: Once = Once::new();

fn ensure_registered() {
    REGISTER_ONCE.call_once(|| {
        let _ = register_handlers();
    });
}

/// 串联：处理器依次成为上一个的唯一子节点
///
/// `chain(vec![a, b, c])` 得到 `a -> b -> c` 的单链，信号从 a 流向 c。
pub fn chain(handlers: Vec<Box<dyn Handler>>) -> HandlerTree {
    let mut iter = handlers.into_iter().rev();
    let mut tree = match iter.next() {
        Some(handler) => HandlerTree::from_boxed(handler),
        None => return HandlerTree::root(),
    };
    for handler in iter {
        tree = HandlerTree::from_boxed(handler).with_child(tree);
    }
    tree
}

/// 并联：多个子树挂在同一个合成根下，各自独立接收全部信号
pub fn branch(subtrees: Vec<HandlerTree>) -> HandlerTree {
    let mut root = HandlerTree::root();
    for subtree in subtrees {
        root.push_child(subtree);
    }
    root
}

/// 处理树的声明式配置
///
/// 每个节点是一个组件描述（`type` + `options`）加可选的 `children`：
///
/// ```json5
/// [
///     {
///         type: "Visibility",
///         options: { mode: "show_all" },
///         children: [
///             { type: "SinkHandler", options: { sink: { type: "ConsoleSink" } } }
///         ]
///     }
/// ]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct HandlerTreeConfig {
    /// 节点上的处理器组件
    #[serde(flatten)]
    pub handler: TypeOptions,

    /// 子节点，按声明顺序接收信号
    #[serde(default)]
    pub children: Vec<HandlerTreeConfig>,
}

/// 从配置构建处理树（合成根 + 顶层节点列表）
pub fn build_tree(configs: &[HandlerTreeConfig]) -> Result<HandlerTree> {
    ensure_registered();
    let mut root = HandlerTree::root();
    for config in configs {
        root.push_child(build_node(config)?);
    }
    Ok(root)
}

/// 从 JSON5 文本构建处理树
pub fn build_tree_from_json(json: &str) -> Result<HandlerTree> {
    let configs: Vec<HandlerTreeConfig> = json5::from_str(json)?;
    build_tree(&configs)
}

fn build_node(config: &HandlerTreeConfig) -> Result<HandlerTree> {
    let handler = create_handler_from_options(&config.handler)?;
    let mut node = HandlerTree::from_boxed(handler);
    for child in &config.children {
        node.push_child(build_node(child)?);
    }
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{RepeatCollapser, RepeatCollapserConfig, Visibility};
    use crate::sink::{MemorySink, SinkHandler};

    #[test]
    fn test_chain_shape() {
        let tree = chain(vec![
            Box::new(Visibility::show_all()),
            Box::new(RepeatCollapser::new(RepeatCollapserConfig::default())),
            Box::new(SinkHandler::with_sink(MemorySink::default())),
        ]);

        // a -> b -> c 单链
        assert_eq!(tree.handler_name(), Some("visibility"));
        assert_eq!(tree.child_count(), 1);
        let second = &tree.children()[0];
        assert_eq!(second.handler_name(), Some("repeat_collapser"));
        assert_eq!(second.child_count(), 1);
        let third = &second.children()[0];
        assert_eq!(third.handler_name(), Some("sink"));
        assert_eq!(third.child_count(), 0);
    }

    #[test]
    fn test_chain_empty_is_root() {
        let tree = chain(Vec::new());
        assert!(tree.is_root());
        assert_eq!(tree.child_count(), 0);
    }

    #[test]
    fn test_branch_shape() {
        let tree = branch(vec![
            chain(vec![
                Box::new(Visibility::hide_all()),
                Box::new(SinkHandler::with_sink(MemorySink::default())),
            ]),
            chain(vec![Box::new(SinkHandler::with_sink(MemorySink::default()))]),
        ]);

        assert!(tree.is_root());
        assert_eq!(tree.child_count(), 2);
        assert_eq!(tree.children()[0].handler_name(), Some("visibility"));
        assert_eq!(tree.children()[1].handler_name(), Some("sink"));
    }

    #[test]
    fn test_build_tree_from_json() -> Result<()> {
        let tree = build_tree_from_json(
            r#"
            [
                {
                    type: "Visibility",
                    options: { mode: "show_all" },
                    children: [
                        {
                            type: "RepeatCollapser",
                            children: [
                                {
                                    type: "SinkHandler",
                                    options: {
                                        margin_width: 0,
                                        sink: { type: "MemorySink" }
                                    }
                                }
                            ]
                        }
                    ]
                }
            ]
        "#,
        )?;

        // 配置声明的父子结构原样可见
        assert!(tree.is_root());
        assert_eq!(tree.child_count(), 1);
        let vis = &tree.children()[0];
        assert_eq!(vis.handler_name(), Some("visibility"));
        let dedup = &vis.children()[0];
        assert_eq!(dedup.handler_name(), Some("repeat_collapser"));
        let sink = &dedup.children()[0];
        assert_eq!(sink.handler_name(), Some("sink"));
        Ok(())
    }

    #[test]
    fn test_build_tree_unknown_type_fails() {
        let result = build_tree_from_json(r#"[ { type: "NoSuchHandler" } ]"#);
        assert!(result.is_err());
    }
}
