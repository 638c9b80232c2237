use crate::handler::trait_::Handler;
use crate::record::{Content, Record};
use serde::Deserialize;
use smart_default::SmartDefault;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// 重复判定与汇总策略
pub trait CollapsePolicy: Send {
    /// 两条记录是否算作重复
    fn equals(&self, prev: &Record, next: &Record) -> bool;

    /// 生成汇总内容，`omitted` 为被折叠掉的条数
    fn summarize(&self, omitted: u64) -> Content {
        Content::Text(format!("(last message repeated {} times)", omitted))
    }
}

/// 内容与通道都相同才算重复
pub struct ExactPolicy;

impl CollapsePolicy for ExactPolicy {
    fn equals(&self, prev: &Record, next: &Record) -> bool {
        prev.content == next.content && prev.channels == next.channels
    }
}

/// 只比较内容，忽略通道差异
pub struct MessagePolicy;

impl CollapsePolicy for MessagePolicy {
    fn equals(&self, prev: &Record, next: &Record) -> bool {
        prev.content == next.content
    }
}

/// 内置策略名
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollapsePolicyKind {
    Exact,
    Message,
}

/// RepeatCollapser 配置
#[derive(Debug, Clone, Deserialize, SmartDefault)]
#[serde(default)]
pub struct RepeatCollapserConfig {
    /// 重复判定策略
    #[default(CollapsePolicyKind::Exact)]
    pub policy: CollapsePolicyKind,

    /// 距上次打印超过该时长的重复不再直接打印（毫秒）
    #[default = 1000]
    pub max_wait_millis: u64,

    /// 同一条记录连续打印的上限，超过后转为计数
    #[default = 1]
    pub force_print_threshold: u64,
}

/// 每层轨道一个折叠状态框架
struct Frame {
    last: Option<Arc<Record>>,
    times_seen: u64,
    times_printed: u64,
    last_printed_at: SystemTime,
    /// 所在轨道整体被折叠，内部记录静默丢弃（只计数）
    suppressed: bool,
    /// 本层（含子层）是否真的打印过内容
    something_printed: bool,
}

impl Frame {
    fn fresh(suppressed: bool) -> Self {
        Self {
            last: None,
            times_seen: 0,
            times_printed: 0,
            last_printed_at: UNIX_EPOCH,
            suppressed,
            something_printed: false,
        }
    }
}

/// 重复记录折叠处理器
///
/// 连续的重复记录折叠为一条 `(last message repeated N times)` 汇总。
/// 折叠状态按轨道分层：`StartTrack` 压入新框架，`EndTrack` 弹出，
/// 因此兄弟轨道之间的重复检测互不串扰；整条重复的*轨道*同样可以
/// 被折叠成一条汇总。携带 `Force` 的记录绕过重复判定。
pub struct RepeatCollapser {
    policy: Box<dyn CollapsePolicy>,
    max_wait: Duration,
    force_print_threshold: u64,
    frames: Vec<Frame>,
}

impl RepeatCollapser {
    pub fn new(config: RepeatCollapserConfig) -> Self {
        let policy: Box<dyn CollapsePolicy> = match config.policy {
            CollapsePolicyKind::Exact => Box::new(ExactPolicy),
            CollapsePolicyKind::Message => Box::new(MessagePolicy),
        };
        Self::with_policy(policy, config)
    }

    /// 使用自定义策略创建
    pub fn with_policy(policy: Box<dyn CollapsePolicy>, config: RepeatCollapserConfig) -> Self {
        Self {
            policy,
            max_wait: Duration::from_millis(config.max_wait_millis),
            force_print_threshold: config.force_print_threshold,
            frames: vec![Frame::fresh(false)],
        }
    }

    fn top(&self) -> &Frame {
        self.frames.last().expect("frame stack is never empty")
    }

    fn top_mut(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("frame stack is never empty")
    }

    /// 冲刷栈顶框架的未打印重复，生成汇总记录
    fn flush_top(&mut self) -> Vec<Arc<Record>> {
        let policy = &self.policy;
        let frame = self.frames.last_mut().expect("frame stack is never empty");
        Self::flush_frame(frame, policy.as_ref())
    }

    fn flush_frame(frame: &mut Frame, policy: &dyn CollapsePolicy) -> Vec<Arc<Record>> {
        if frame.times_seen <= frame.times_printed {
            return Vec::new();
        }
        let omitted = frame.times_seen - frame.times_printed;
        frame.times_printed = frame.times_seen;
        match &frame.last {
            Some(last) => vec![Arc::new(last.derived(policy.summarize(omitted)))],
            None => Vec::new(),
        }
    }

    /// 以 `record` 作为新的基准记录重置栈顶框架（视为已打印一次）
    fn reset_top(&mut self, record: &Arc<Record>, now: SystemTime) {
        let frame = self.top_mut();
        frame.last = Some(record.clone());
        frame.times_seen = 1;
        frame.times_printed = 1;
        frame.last_printed_at = now;
        frame.something_printed = true;
    }
}

impl Handler for RepeatCollapser {
    fn handle(&mut self, record: &Arc<Record>) -> Vec<Arc<Record>> {
        let now = record.timestamp;

        // Force：先冲刷挂起的汇总，再无条件打印
        if record.is_forced() {
            let mut out = self.flush_top();
            out.push(record.clone());
            self.reset_top(record, now);
            return out;
        }

        if self.top().suppressed {
            // 所在轨道已整体折叠：静默丢弃，只计数
            self.top_mut().times_seen += 1;
            return Vec::new();
        }

        let last = self.top().last.clone();
        match last {
            None => {
                self.reset_top(record, now);
                vec![record.clone()]
            }
            Some(last) if self.policy.equals(&last, record) => {
                let within_wait = now
                    .duration_since(self.top().last_printed_at)
                    .map(|d| d <= self.max_wait)
                    .unwrap_or(true);
                if within_wait && self.top().times_seen < self.force_print_threshold {
                    // 短时间内的少量重复照常打印，避免实时输出被吞
                    let frame = self.top_mut();
                    frame.times_seen += 1;
                    frame.times_printed += 1;
                    frame.last_printed_at = now;
                    frame.something_printed = true;
                    vec![record.clone()]
                } else {
                    self.top_mut().times_seen += 1;
                    Vec::new()
                }
            }
            Some(_) => {
                // 不同记录：先冲刷汇总，再打印新记录
                let mut out = self.flush_top();
                out.push(record.clone());
                self.reset_top(record, now);
                out
            }
        }
    }

    fn on_start_track(&mut self, record: &Arc<Record>) -> Vec<Arc<Record>> {
        let now = record.timestamp;
        let mut out = Vec::new();
        let mut suppress_child = false;

        if self.top().suppressed {
            // 祖先已折叠，整个子轨道继续静默
            self.top_mut().times_seen += 1;
            suppress_child = true;
        } else if record.is_forced() {
            out = self.flush_top();
            self.reset_top(record, now);
        } else {
            let last = self.top().last.clone();
            match last {
                None => self.reset_top(record, now),
                Some(last) if self.policy.equals(&last, record) => {
                    let within_wait = now
                        .duration_since(self.top().last_printed_at)
                        .map(|d| d <= self.max_wait)
                        .unwrap_or(true);
                    if within_wait && self.top().times_seen < self.force_print_threshold {
                        let frame = self.top_mut();
                        frame.times_seen += 1;
                        frame.times_printed += 1;
                        frame.last_printed_at = now;
                    } else {
                        // 整条轨道视为重复：子树静默，只在父层计数
                        self.top_mut().times_seen += 1;
                        suppress_child = true;
                    }
                }
                Some(_) => {
                    out = self.flush_top();
                    self.reset_top(record, now);
                }
            }
        }

        self.frames.push(Frame::fresh(suppress_child));
        out
    }

    fn on_end_track(&mut self, _new_depth: usize, _timestamp: SystemTime) -> Vec<Arc<Record>> {
        if self.frames.len() <= 1 {
            // 根框架不随轨道弹出
            return Vec::new();
        }
        let mut child = self.frames.pop().expect("stack depth checked above");
        let mut out = Vec::new();

        if !child.suppressed {
            // 汇总在 EndTrack 信号之前下发，保证出现在收尾括号之前
            out = Self::flush_frame(&mut child, self.policy.as_ref());
        } else if child.something_printed {
            // 被折叠的轨道里有 Force 记录逃逸：父层不再把它计为完全折叠
            let parent = self.top_mut();
            parent.times_printed += 1;
        }

        self.top_mut().something_printed |= child.something_printed;
        out
    }

    fn on_shutdown(&mut self) -> Vec<Arc<Record>> {
        let mut out = Vec::new();
        // 分发器在终止前会补发 EndTrack，这里兜底清空残留框架
        while self.frames.len() > 1 {
            let mut child = self.frames.pop().expect("stack depth checked above");
            if !child.suppressed {
                out.extend(Self::flush_frame(&mut child, self.policy.as_ref()));
            }
        }
        out.extend(self.flush_top());
        out
    }

    fn name(&self) -> &'static str {
        "repeat_collapser"
    }
}

crate::impl_from!(RepeatCollapserConfig => RepeatCollapser);
crate::impl_box_from!(RepeatCollapser => dyn Handler);
