use crate::dispatch::arbiter::{QueuedOp, ThreadArbiter};
use crate::dispatch::dispatcher::Dispatcher;
use crate::handler::HandlerTree;
use crate::record::{Channel, ChannelSet, Content};
use anyhow::Result;
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::thread;

/// 日志核心上下文
///
/// 进程内全部可变状态（深度计数、处理树、线程所有权）集中在这一个
/// 对象里，生命周期显式可控，可以在测试中独立创建多个实例。进程级
/// 默认实例见 [`global`](crate::global) 模块。
///
/// 所有入口在同一把互斥锁下串行执行；核心内部没有任何异步挂起点，
/// 一次调用要么当场分发，要么排进所属线程的积压队列后立即返回。
pub struct LogCore {
    state: Mutex<CoreState>,
}

struct CoreState {
    dispatcher: Dispatcher,
    arbiter: ThreadArbiter,
}

impl CoreState {
    fn dispatch(&mut self, op: QueuedOp) {
        match op {
            QueuedOp::Log { channels, content } => self.dispatcher.log(channels, content),
            QueuedOp::StartTrack { channels, title } => {
                self.dispatcher.start_track(channels, title)
            }
            QueuedOp::EndTrack { expected_title } => {
                self.dispatcher.end_track(expected_title.as_deref())
            }
            // Finish 标记只在仲裁器内部消化
            QueuedOp::Finish => {}
        }
    }
}

impl Default for LogCore {
    fn default() -> Self {
        Self::new()
    }
}

impl LogCore {
    /// 创建空核心（处理树只有合成根节点）
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CoreState {
                dispatcher: Dispatcher::new(),
                arbiter: ThreadArbiter::new(),
            }),
        }
    }

    // 日志子系统不能因为锁中毒挂掉宿主程序
    fn lock(&self) -> MutexGuard<'_, CoreState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 整体替换处理树，仅允许在没有轨道开启时进行
    pub fn install(&self, tree: HandlerTree) -> Result<()> {
        self.lock().dispatcher.install(tree)?;
        Ok(())
    }

    /// 向根节点追加一个子树，仅允许在没有轨道开启时进行
    pub fn add_handler(&self, child: HandlerTree) -> Result<()> {
        self.lock().dispatcher.add_child(child)?;
        Ok(())
    }

    /// 当前嵌套深度
    pub fn depth(&self) -> usize {
        self.lock().dispatcher.depth()
    }

    /// 是否已终止
    pub fn is_down(&self) -> bool {
        self.lock().dispatcher.is_down()
    }

    fn submit(&self, op: QueuedOp) {
        let mut state = self.lock();
        let tid = thread::current().id();
        if let Some(op) = state.arbiter.admit(tid, op) {
            state.dispatch(op);
        }
    }

    /// 在当前深度记录一条日志
    pub fn log(&self, channels: impl Into<ChannelSet>, content: impl Into<Content>) {
        self.submit(QueuedOp::Log {
            channels: channels.into(),
            content: content.into(),
        });
    }

    /// 格式化并记录一条日志
    pub fn logf(&self, channels: impl Into<ChannelSet>, args: fmt::Arguments<'_>) {
        self.log(channels, Content::from(args));
    }

    /// 打开一层轨道
    pub fn start_track(&self, channels: impl Into<ChannelSet>, title: impl Into<Content>) {
        self.submit(QueuedOp::StartTrack {
            channels: channels.into(),
            title: title.into(),
        });
    }

    /// 关闭最内层轨道
    pub fn end_track(&self) {
        self.submit(QueuedOp::EndTrack {
            expected_title: None,
        });
    }

    /// 关闭最内层轨道并核对标题
    pub fn end_track_titled(&self, title: &str) {
        self.submit(QueuedOp::EndTrack {
            expected_title: Some(title.to_string()),
        });
    }

    /// 打开线程分组：建立一层合成轨道，之后的并发调用按线程串行化
    pub fn start_threads(&self, title: impl Into<Content>) {
        let mut state = self.lock();
        if state.arbiter.is_threaded() {
            state
                .dispatcher
                .warn("start_threads called inside an open thread block".to_string());
            return;
        }
        state
            .dispatcher
            .start_track(ChannelSet::empty(), title.into());
        state.arbiter.begin();
    }

    /// 当前线程声明完成，分发权交给下一个等待线程
    pub fn finish_thread(&self) {
        let mut state = self.lock();
        if !state.arbiter.is_threaded() {
            state
                .dispatcher
                .warn("finish_thread called outside a thread block".to_string());
            return;
        }
        let tid = thread::current().id();
        let replay = state.arbiter.finish(tid);
        for op in replay {
            state.dispatch(op);
        }
    }

    /// 关闭线程分组
    ///
    /// 没调用过 finish_thread 的线程产生使用性警告，其积压被强制排空，
    /// 之后合成轨道关闭。
    pub fn end_threads(&self, title: &str) {
        let mut state = self.lock();
        if !state.arbiter.is_threaded() {
            state
                .dispatcher
                .warn("end_threads called without start_threads".to_string());
            return;
        }
        let report = state.arbiter.end(thread::current().id());
        for tid in &report.unfinished {
            state.dispatcher.warn(format!(
                "thread {:?} never called finish_thread; draining its backlog",
                tid
            ));
        }
        for op in report.ops {
            state.dispatch(op);
        }
        state.dispatcher.end_track(Some(title));
    }

    /// 终止：排空线程积压、收拢所有轨道、冻结核心
    pub fn shutdown(&self) {
        let mut state = self.lock();
        if state.arbiter.is_threaded() {
            let report = state.arbiter.end(thread::current().id());
            for op in report.ops {
                state.dispatch(op);
            }
        }
        state.dispatcher.shutdown();
    }

    /// 预绑定一组通道，后续调用不必重复携带
    pub fn group(&self, channels: impl Into<ChannelSet>) -> ChannelGroup<'_> {
        ChannelGroup {
            core: self,
            channels: channels.into(),
        }
    }
}

/// 通道分组句柄
///
/// 把一组通道绑定到核心引用上，重复的调用点不必每次重复通道列表。
pub struct ChannelGroup<'a> {
    core: &'a LogCore,
    channels: ChannelSet,
}

impl ChannelGroup<'_> {
    /// 在绑定通道上追加一个通道，返回新的分组
    pub fn with(&self, channel: Channel) -> Self {
        Self {
            core: self.core,
            channels: self.channels.clone().with(channel),
        }
    }

    /// 绑定的通道集合
    pub fn channels(&self) -> &ChannelSet {
        &self.channels
    }

    pub fn log(&self, content: impl Into<Content>) {
        self.core.log(self.channels.clone(), content);
    }

    pub fn logf(&self, args: fmt::Arguments<'_>) {
        self.core.logf(self.channels.clone(), args);
    }

    pub fn start_track(&self, title: impl Into<Content>) {
        self.core.start_track(self.channels.clone(), title);
    }

    pub fn end_track(&self) {
        self.core.end_track();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{MemorySink, SinkHandler, SinkHandlerConfig};

    fn core_with_capture() -> (LogCore, MemorySink) {
        let capture = MemorySink::default();
        let config = SinkHandlerConfig {
            margin_width: 0,
            indent_unit: "  ".to_string(),
            min_lines_for_note: usize::MAX,
            min_elapsed_millis_for_note: u64::MAX,
            ..SinkHandlerConfig::default()
        };
        let core = LogCore::new();
        core.install(HandlerTree::root().with_child(HandlerTree::node(
            SinkHandler::with_sink_config(Box::new(capture.clone()), config),
        )))
        .unwrap();
        (core, capture)
    }

    #[test]
    fn test_log_and_logf() {
        let (core, capture) = core_with_capture();

        core.log(Channel::Debug, "plain");
        core.logf(Channel::Debug, format_args!("value = {}", 7));

        assert_eq!(capture.lines(), vec!["plain", "value = 7"]);
    }

    #[test]
    fn test_track_round_trip() {
        let (core, capture) = core_with_capture();

        core.start_track(ChannelSet::empty(), "job");
        core.log(ChannelSet::empty(), "step");
        core.end_track_titled("job");

        assert_eq!(capture.lines(), vec!["job {", "  step", "}"]);
        assert_eq!(core.depth(), 0);
    }

    #[test]
    fn test_unthreaded_finish_thread_warns() {
        let (core, capture) = core_with_capture();

        core.finish_thread();

        assert!(capture
            .lines()
            .iter()
            .any(|l| l.contains("outside a thread block")));
    }

    #[test]
    fn test_thread_block_single_thread() {
        let (core, capture) = core_with_capture();

        core.start_threads("workers");
        core.log(ChannelSet::empty(), "w1");
        core.finish_thread();
        core.end_threads("workers");

        assert_eq!(capture.lines(), vec!["workers {", "  w1", "}"]);
    }

    #[test]
    fn test_nested_start_threads_warns() {
        let (core, capture) = core_with_capture();

        core.start_threads("outer");
        core.start_threads("inner");

        assert!(capture
            .lines()
            .iter()
            .any(|l| l.contains("inside an open thread block")));

        core.finish_thread();
        core.end_threads("outer");
    }

    #[test]
    fn test_channel_group_binds_channels() {
        let capture = MemorySink::default();
        let config = SinkHandlerConfig {
            margin_width: 10,
            indent_unit: "  ".to_string(),
            min_lines_for_note: usize::MAX,
            min_elapsed_millis_for_note: u64::MAX,
            ..SinkHandlerConfig::default()
        };
        let core = LogCore::new();
        core.install(HandlerTree::root().with_child(HandlerTree::node(
            SinkHandler::with_sink_config(Box::new(capture.clone()), config),
        )))
        .unwrap();

        let group = core.group(Channel::custom("db"));
        group.log("connected");
        group.logf(format_args!("pool = {}", 4));

        let lines = capture.lines();
        assert!(lines[0].starts_with("[db]"));
        assert!(lines[0].ends_with("connected"));
        assert!(lines[1].ends_with("pool = 4"));
    }

    #[test]
    fn test_channel_group_with_extra_channel() {
        let (core, _capture) = core_with_capture();

        let group = core.group(Channel::custom("db"));
        let extended = group.with(Channel::Warn);

        assert!(extended.channels().contains(&Channel::custom("db")));
        assert!(extended.channels().contains(&Channel::Warn));
        assert_eq!(group.channels().len(), 1);
    }

    #[test]
    fn test_shutdown_freezes_core() {
        let (core, capture) = core_with_capture();

        core.log(ChannelSet::empty(), "before");
        core.shutdown();
        assert!(core.is_down());

        let count = capture.lines().len();
        core.log(ChannelSet::empty(), "after");
        core.log(ChannelSet::empty(), "after again");
        // 终止后第一次调用产生一条警告，其余静默
        assert_eq!(capture.lines().len(), count + 1);
    }
}
