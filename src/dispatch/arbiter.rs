use crate::record::{ChannelSet, Content};
use std::collections::{HashMap, VecDeque};
use std::thread::ThreadId;

/// 排队等待重放的操作
///
/// 非持有线程的调用被压入各自的积压队列，所有权交接时按原始顺序重放。
#[derive(Debug)]
pub enum QueuedOp {
    Log {
        channels: ChannelSet,
        content: Content,
    },
    StartTrack {
        channels: ChannelSet,
        title: Content,
    },
    EndTrack {
        expected_title: Option<String>,
    },
    /// finish_thread 标记，交接时按序生效
    Finish,
}

/// end_threads 的排空报告
pub struct DrainReport {
    /// 需要立即重放的操作（各线程积压按排队顺序拼接）
    pub ops: Vec<QueuedOp>,
    /// 从未调用 finish_thread 的线程
    pub unfinished: Vec<ThreadId>,
}

/// 线程仲裁器
///
/// 把并发调用方串行化为按线程连续的输出块。同一时刻至多一个线程持有
/// 分发权：持有线程的调用立即分发，其余线程的调用进入各自的 FIFO
/// 积压。持有线程调用 `finish` 后，分发权按到达顺序交给下一个等待
/// 线程，并先完整排空它的积压，之后才考虑更新的调用。代价是跨线程
/// 的墙钟顺序可能乱序，换来的是每个线程的输出绝不与他人交错。
///
/// 交接采用平面的 FIFO 循环：被交接线程的积压若以 `Finish` 标记收尾，
/// 循环直接推进到下一个等待者，因此每个等待者最终都会被服务到。
pub struct ThreadArbiter {
    threaded: bool,
    owner: Option<ThreadId>,
    ready: VecDeque<ThreadId>,
    backlogs: HashMap<ThreadId, VecDeque<QueuedOp>>,
}

impl Default for ThreadArbiter {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadArbiter {
    pub fn new() -> Self {
        Self {
            threaded: false,
            owner: None,
            ready: VecDeque::new(),
            backlogs: HashMap::new(),
        }
    }

    pub fn is_threaded(&self) -> bool {
        self.threaded
    }

    /// 当前持有分发权的线程
    pub fn owner(&self) -> Option<ThreadId> {
        self.owner
    }

    /// 打开线程分组
    pub fn begin(&mut self) {
        self.threaded = true;
    }

    /// 线程提交一个操作
    ///
    /// 返回 `Some(op)` 表示调用方应立即分发；`None` 表示已排队，调用
    /// 直接返回，不阻塞。
    pub fn admit(&mut self, tid: ThreadId, op: QueuedOp) -> Option<QueuedOp> {
        if !self.threaded {
            return Some(op);
        }
        match self.owner {
            None => {
                // 无人持有：当场接管
                self.owner = Some(tid);
                Some(op)
            }
            Some(owner) if owner == tid => Some(op),
            Some(_) => {
                self.backlogs.entry(tid).or_default().push_back(op);
                if !self.ready.contains(&tid) {
                    self.ready.push_back(tid);
                }
                None
            }
        }
    }

    /// 线程声明完成
    ///
    /// 持有线程：释放分发权并交接，返回接棒线程需要重放的积压。
    /// 非持有线程：`Finish` 作为标记排进自己的积压，交接时按序生效。
    pub fn finish(&mut self, tid: ThreadId) -> Vec<QueuedOp> {
        if !self.threaded {
            return Vec::new();
        }
        if self.owner == Some(tid) {
            self.owner = None;
            self.handoff()
        } else {
            self.backlogs
                .entry(tid)
                .or_default()
                .push_back(QueuedOp::Finish);
            if !self.ready.contains(&tid) {
                self.ready.push_back(tid);
            }
            Vec::new()
        }
    }

    /// FIFO 交接循环
    fn handoff(&mut self) -> Vec<QueuedOp> {
        let mut out = Vec::new();
        while let Some(next) = self.ready.pop_front() {
            let mut backlog = self.backlogs.remove(&next).unwrap_or_default();
            let mut finished = false;
            while let Some(op) = backlog.pop_front() {
                if matches!(op, QueuedOp::Finish) {
                    finished = true;
                    break;
                }
                out.push(op);
            }
            if finished {
                // Finish 之后的残余操作属于该线程新的一轮，重新排到队尾
                if !backlog.is_empty() {
                    self.backlogs.insert(next, backlog);
                    self.ready.push_back(next);
                }
                continue;
            }
            self.owner = Some(next);
            break;
        }
        out
    }

    /// 关闭线程分组：强制排空所有积压，报告未 finish 的线程
    ///
    /// `caller` 是发起 end_threads 的线程，不计入未完成名单。
    pub fn end(&mut self, caller: ThreadId) -> DrainReport {
        let mut unfinished = Vec::new();
        if let Some(owner) = self.owner.take() {
            if owner != caller {
                unfinished.push(owner);
            }
        }

        let mut ops = Vec::new();
        while let Some(next) = self.ready.pop_front() {
            let mut saw_finish = false;
            if let Some(mut backlog) = self.backlogs.remove(&next) {
                while let Some(op) = backlog.pop_front() {
                    if matches!(op, QueuedOp::Finish) {
                        saw_finish = true;
                        continue;
                    }
                    ops.push(op);
                }
            }
            if !saw_finish {
                unfinished.push(next);
            }
        }

        self.backlogs.clear();
        self.threaded = false;
        DrainReport { ops, unfinished }
    }
}
