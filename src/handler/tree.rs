use crate::handler::trait_::Handler;
use crate::record::Signal;

/// 处理树
///
/// 有序的处理器树：父节点的输出扇出到每一个子节点。`handler` 仅在
/// 合成根节点上为 `None`。树形状由分发器独占持有，只允许在没有
/// 轨道开启时修改（该约束由分发器负责检查）。
pub struct HandlerTree {
    handler: Option<Box<dyn Handler>>,
    children: Vec<HandlerTree>,
}

impl HandlerTree {
    /// 合成根节点
    pub fn root() -> Self {
        Self {
            handler: None,
            children: Vec::new(),
        }
    }

    /// 以一个处理器为内容的节点
    pub fn node(handler: impl Handler + 'static) -> Self {
        Self {
            handler: Some(Box::new(handler)),
            children: Vec::new(),
        }
    }

    /// 以 boxed 处理器为内容的节点（装配表用）
    pub fn from_boxed(handler: Box<dyn Handler>) -> Self {
        Self {
            handler: Some(handler),
            children: Vec::new(),
        }
    }

    /// 追加一个子树，子节点按注册顺序接收信号
    pub fn push_child(&mut self, child: HandlerTree) -> &mut HandlerTree {
        self.children.push(child);
        self.children.last_mut().expect("child was just pushed")
    }

    /// 链式构造用：追加子树后返回整棵树
    pub fn with_child(mut self, child: HandlerTree) -> Self {
        self.children.push(child);
        self
    }

    pub fn is_root(&self) -> bool {
        self.handler.is_none()
    }

    /// 节点上处理器的名称（根节点为 None）
    pub fn handler_name(&self) -> Option<&'static str> {
        self.handler.as_ref().map(|h| h.name())
    }

    pub fn children(&self) -> &[HandlerTree] {
        &self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// 深度优先分发一个信号
    ///
    /// 顺序约定：本节点产出的每条记录先以 `Log` 送达子节点，之后
    /// 结构信号（若有）才到达同一个子节点。这保证折叠器冲刷出的
    /// 汇总行出现在所属轨道的收尾之前。
    pub fn process(&mut self, signal: &Signal) {
        let outputs = match (&mut self.handler, signal) {
            // 根节点：Log 透传，结构信号不产生合成记录
            (None, Signal::Log(record)) => vec![record.clone()],
            (None, _) => Vec::new(),
            (Some(handler), Signal::Log(record)) => handler.handle(record),
            (Some(handler), Signal::StartTrack(record)) => handler.on_start_track(record),
            (Some(handler), Signal::EndTrack { depth, timestamp }) => {
                handler.on_end_track(*depth, *timestamp)
            }
            (Some(handler), Signal::Shutdown) => handler.on_shutdown(),
        };

        for child in &mut self.children {
            for record in &outputs {
                child.process(&Signal::Log(record.clone()));
            }
            if signal.is_structural() {
                child.process(signal);
            }
        }
    }
}

impl std::fmt::Debug for HandlerTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerTree")
            .field("handler", &self.handler_name())
            .field("children", &self.children)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ChannelSet, Content, Record};
    use std::sync::{Arc, Mutex};
    use std::time::SystemTime;

    /// 记录收到的所有事件，用于验证分发顺序
    #[derive(Clone, Default)]
    struct Recorder {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl Handler for Recorder {
        fn handle(&mut self, record: &Arc<Record>) -> Vec<Arc<Record>> {
            self.events
                .lock()
                .unwrap()
                .push(format!("log:{}", record.content));
            vec![record.clone()]
        }

        fn on_start_track(&mut self, record: &Arc<Record>) -> Vec<Arc<Record>> {
            self.events
                .lock()
                .unwrap()
                .push(format!("start:{}", record.content));
            Vec::new()
        }

        fn on_end_track(&mut self, new_depth: usize, _timestamp: SystemTime) -> Vec<Arc<Record>> {
            self.events
                .lock()
                .unwrap()
                .push(format!("end:{}", new_depth));
            Vec::new()
        }

        fn on_shutdown(&mut self) -> Vec<Arc<Record>> {
            self.events.lock().unwrap().push("shutdown".to_string());
            Vec::new()
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    /// 在收到结构信号时冲刷一条固定记录
    struct FlushOnEnd;

    impl Handler for FlushOnEnd {
        fn handle(&mut self, record: &Arc<Record>) -> Vec<Arc<Record>> {
            vec![record.clone()]
        }

        fn on_end_track(&mut self, _new_depth: usize, _timestamp: SystemTime) -> Vec<Arc<Record>> {
            vec![Arc::new(Record::new(
                ChannelSet::empty(),
                Content::text("flushed"),
                0,
            ))]
        }
    }

    fn log_signal(text: &str) -> Signal {
        Signal::Log(Arc::new(Record::new(
            ChannelSet::empty(),
            Content::text(text),
            0,
        )))
    }

    #[test]
    fn test_root_passes_log_through() {
        let recorder = Recorder::default();
        let mut tree = HandlerTree::root().with_child(HandlerTree::node(recorder.clone()));

        tree.process(&log_signal("hello"));

        assert_eq!(recorder.events(), vec!["log:hello"]);
    }

    #[test]
    fn test_children_visited_in_registration_order() {
        let first = Recorder::default();
        let second = Recorder::default();
        let mut tree = HandlerTree::root()
            .with_child(HandlerTree::node(first.clone()))
            .with_child(HandlerTree::node(second.clone()));

        tree.process(&log_signal("a"));

        assert_eq!(first.events(), vec!["log:a"]);
        assert_eq!(second.events(), vec!["log:a"]);
    }

    #[test]
    fn test_structural_signal_propagates_after_flushed_records() {
        let leaf = Recorder::default();
        let mut flush_node = HandlerTree::node(FlushOnEnd);
        flush_node.push_child(HandlerTree::node(leaf.clone()));
        let mut tree = HandlerTree::root().with_child(flush_node);

        tree.process(&Signal::EndTrack {
            depth: 0,
            timestamp: SystemTime::now(),
        });

        // 冲刷记录先到达，结构信号随后
        assert_eq!(leaf.events(), vec!["log:flushed", "end:0"]);
    }

    #[test]
    fn test_shutdown_reaches_every_node() {
        let a = Recorder::default();
        let b = Recorder::default();
        let mut chain = HandlerTree::node(a.clone());
        chain.push_child(HandlerTree::node(b.clone()));
        let mut tree = HandlerTree::root().with_child(chain);

        tree.process(&Signal::Shutdown);

        assert_eq!(a.events(), vec!["shutdown"]);
        assert_eq!(b.events(), vec!["shutdown"]);
    }

    #[test]
    fn test_tree_shape_inspection() {
        let tree = HandlerTree::root()
            .with_child(
                HandlerTree::node(Recorder::default())
                    .with_child(HandlerTree::node(Recorder::default())),
            )
            .with_child(HandlerTree::node(Recorder::default()));

        assert!(tree.is_root());
        assert_eq!(tree.child_count(), 2);
        assert_eq!(tree.children()[0].child_count(), 1);
        assert_eq!(tree.children()[0].handler_name(), Some("recorder"));
        assert_eq!(tree.children()[1].child_count(), 0);
    }
}
