use crate::cfg::ConfigError;
use crate::handler::HandlerTree;
use crate::record::{Channel, ChannelSet, Content, Record, Signal};
use std::sync::Arc;
use std::time::SystemTime;

/// 分发器
///
/// 独占持有处理树根节点，维护全局嵌套深度与打开轨道的标题栈，把公共
/// API 调用翻译成类型化信号推入树中。调用方的使用性错误（不配对的
/// `end_track`、终止后继续打日志）以警告记录回流同一条管道，绝不上抛；
/// 装配阶段的配置错误（有轨道开启时改树）则直接返回 `Err`。
pub struct Dispatcher {
    root: HandlerTree,
    depth: usize,
    titles: Vec<String>,
    down: bool,
    warned_after_shutdown: bool,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            root: HandlerTree::root(),
            depth: 0,
            titles: Vec::new(),
            down: false,
            warned_after_shutdown: false,
        }
    }

    /// 当前嵌套深度
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// 是否已终止
    pub fn is_down(&self) -> bool {
        self.down
    }

    /// 检视当前处理树
    pub fn tree(&self) -> &HandlerTree {
        &self.root
    }

    /// 整体替换处理树，仅允许在没有轨道开启时进行
    pub fn install(&mut self, tree: HandlerTree) -> Result<(), ConfigError> {
        if self.depth != 0 {
            return Err(ConfigError::TreeLocked(self.depth));
        }
        self.root = if tree.is_root() {
            tree
        } else {
            HandlerTree::root().with_child(tree)
        };
        Ok(())
    }

    /// 向根节点追加一个子树，仅允许在没有轨道开启时进行
    pub fn add_child(&mut self, child: HandlerTree) -> Result<(), ConfigError> {
        if self.depth != 0 {
            return Err(ConfigError::TreeLocked(self.depth));
        }
        self.root.push_child(child);
        Ok(())
    }

    /// 在当前深度分发一条记录
    pub fn log(&mut self, channels: ChannelSet, content: Content) {
        if self.down {
            self.warn_shutdown();
            return;
        }
        let record = Arc::new(Record::new(channels, content, self.depth));
        self.root.process(&Signal::Log(record));
    }

    /// 打开一层轨道
    ///
    /// 标题记录建在加一*之前*的深度，展示缩进与父层对齐。
    pub fn start_track(&mut self, channels: ChannelSet, title: Content) {
        if self.down {
            self.warn_shutdown();
            return;
        }
        let record = Arc::new(Record::new(channels, title, self.depth));
        self.titles.push(record.content.to_string());
        self.root.process(&Signal::StartTrack(record));
        self.depth += 1;
    }

    /// 关闭最内层轨道
    ///
    /// `expected_title` 只做尽力而为的一致性检查：不匹配时发警告，
    /// 轨道照常关闭。没有打开的轨道时 `end_track` 是使用性错误。
    pub fn end_track(&mut self, expected_title: Option<&str>) {
        if self.down {
            self.warn_shutdown();
            return;
        }
        if self.depth == 0 {
            self.warn("end_track called with no open track".to_string());
            return;
        }

        let title = self.titles.pop().unwrap_or_default();
        if let Some(expected) = expected_title {
            if expected != title {
                self.warn(format!(
                    "end_track expected '{}' but innermost track is '{}'",
                    expected, title
                ));
            }
        }

        // 先减深度，信号携带减一之后的值
        self.depth -= 1;
        self.root.process(&Signal::EndTrack {
            depth: self.depth,
            timestamp: SystemTime::now(),
        });
    }

    /// 终止：强制收拢所有未关闭的轨道，下发 Shutdown，之后拒绝一切调用
    pub fn shutdown(&mut self) {
        if self.down {
            return;
        }
        while self.depth > 0 {
            self.titles.pop();
            self.depth -= 1;
            self.root.process(&Signal::EndTrack {
                depth: self.depth,
                timestamp: SystemTime::now(),
            });
        }
        self.root.process(&Signal::Shutdown);
        self.down = true;
    }

    /// 使用性警告：以 Warn + Force 记录回流管道，Force 保证不被过滤
    pub(crate) fn warn(&mut self, message: String) {
        let channels = ChannelSet::new(vec![Channel::Warn, Channel::Force]);
        let record = Arc::new(Record::new(channels, Content::text(message), self.depth));
        self.root.process(&Signal::Log(record));
    }

    fn warn_shutdown(&mut self) {
        if !self.warned_after_shutdown {
            self.warned_after_shutdown = true;
            self.warn("logging call after shutdown ignored".to_string());
        }
    }
}
