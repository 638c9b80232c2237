use crate::record::Record;
use std::sync::Arc;
use std::time::SystemTime;

/// 记录处理器 trait
///
/// 处理树中的一个节点。分发器在单一互斥锁下驱动整棵树，
/// 因此处理器可以安全地持有可变状态（`&mut self`）。
///
/// 返回值语义：
/// - `handle` 返回要传递给子节点的记录集合。透传处理器返回输入本身，
///   过滤器可能返回空集，折叠器可能返回「汇总 + 新记录」。
/// - 结构方法（`on_start_track` 等）返回的是*额外*要下发的记录
///   （例如折叠器冲刷出的汇总行）；结构信号本身总会继续向下传播，
///   且保证在这些额外记录之后到达同一个子节点。
pub trait Handler: Send {
    /// 处理一条记录，返回传递给子节点的记录集合
    fn handle(&mut self, record: &Arc<Record>) -> Vec<Arc<Record>>;

    /// 一层轨道开启，记录为轨道标题
    fn on_start_track(&mut self, _record: &Arc<Record>) -> Vec<Arc<Record>> {
        Vec::new()
    }

    /// 一层轨道关闭，`new_depth` 为关闭之后的深度
    fn on_end_track(&mut self, _new_depth: usize, _timestamp: SystemTime) -> Vec<Arc<Record>> {
        Vec::new()
    }

    /// 终止信号，处理器应冲刷所有缓存状态
    fn on_shutdown(&mut self) -> Vec<Arc<Record>> {
        Vec::new()
    }

    /// 处理器名称，用于树形结构的检视与调试输出
    fn name(&self) -> &'static str {
        "handler"
    }
}
