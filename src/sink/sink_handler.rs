use crate::cfg::{create_trait_from_type_options, TypeOptions};
use crate::handler::Handler;
use crate::record::{Channel, ChannelSet, Content, ErrorTrail, Record};
use crate::sink::trait_::Sink;
use anyhow::Result;
use serde::Deserialize;
use smart_default::SmartDefault;
use std::sync::Arc;
use std::time::SystemTime;

/// SinkHandler 排版配置
#[derive(Debug, Clone, Deserialize, SmartDefault)]
#[serde(default)]
pub struct SinkHandlerConfig {
    /// 左侧通道边距的固定宽度，0 表示不输出边距
    #[default = 16]
    pub margin_width: usize,

    /// 每层深度的缩进单元
    #[default = "  "]
    pub indent_unit: String,

    /// 轨道内打印行数达到该值时，收尾括号附带标题回显
    #[default = 10]
    pub min_lines_for_note: usize,

    /// 轨道耗时达到该值时，收尾括号附带标题回显（毫秒）
    #[default = 1000]
    pub min_elapsed_millis_for_note: u64,

    /// 每行前缀记录时间戳（UTC 当日时刻）
    #[default = false]
    pub show_timestamp: bool,
}

/// 声明式装配用的创建配置：嵌套的 sink 组件 + 排版参数
#[derive(Debug, Clone, Deserialize)]
pub struct SinkHandlerCreateConfig {
    /// 终端 sink 组件
    pub sink: TypeOptions,

    /// 排版参数
    #[serde(flatten)]
    pub layout: SinkHandlerConfig,
}

/// 一层已开启的轨道
struct TrackFrame {
    title: String,
    channels: ChannelSet,
    depth: usize,
    started_at: SystemTime,
    /// 开括号是否已经打印（轨道产出第一行输出时才打印）
    opened: bool,
    /// 轨道内已打印的内容行数
    lines: usize,
}

/// sink 排版处理器
///
/// 持有一个终端 [`Sink`]，负责它之前的全部排版职责：固定宽度的通道
/// 边距、按深度缩进、轨道开闭括号与耗时回显、错误链展开。轨道括号
/// 惰性打印：开启后没有任何输出的轨道不会留下一对空括号。
///
/// sink 的写出失败按运行期 IO 错误处理：报告一次后整体降级为空操作。
pub struct SinkHandler {
    sink: Box<dyn Sink>,
    config: SinkHandlerConfig,
    tracks: Vec<TrackFrame>,
    degraded: bool,
}

impl SinkHandler {
    /// 从声明式配置创建，sink 组件经注册表实例化
    pub fn new(config: SinkHandlerCreateConfig) -> Result<Self> {
        let sink: Box<dyn Sink> = create_trait_from_type_options(&config.sink)?;
        Ok(Self::with_sink_config(sink, config.layout))
    }

    /// 以默认排版参数包装一个 sink
    pub fn with_sink(sink: impl Sink + 'static) -> Self {
        Self::with_sink_config(Box::new(sink), SinkHandlerConfig::default())
    }

    /// 以指定排版参数包装一个 sink
    pub fn with_sink_config(sink: Box<dyn Sink>, config: SinkHandlerConfig) -> Self {
        Self {
            sink,
            config,
            tracks: Vec::new(),
            degraded: false,
        }
    }

    /// 写出一行；失败时报告一次并降级为空操作
    fn emit(&mut self, channels: &ChannelSet, text: &str) {
        if self.degraded {
            return;
        }
        if let Err(err) = self.sink.print(channels, text) {
            eprintln!("tracklog: sink degraded to no-op: {}", err);
            self.degraded = true;
        }
    }

    /// 固定宽度的通道边距，Force 是内部标记不进入边距
    fn margin(&self, channels: &ChannelSet) -> String {
        let width = self.config.margin_width;
        if width == 0 {
            return String::new();
        }

        let label = channels
            .iter()
            .filter(|c| !matches!(c, Channel::Force))
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");

        let mut margin = if label.is_empty() {
            String::new()
        } else {
            format!("[{}]", label)
        };
        if margin.chars().count() > width {
            // 超宽时截断，保留收尾括号
            margin = margin.chars().take(width - 1).collect();
            margin.push(']');
        }
        format!("{:<width$} ", margin, width = width)
    }

    fn indent(&self, depth: usize) -> String {
        self.config.indent_unit.repeat(depth)
    }

    /// 可选的时间戳前缀，手动分解 UTC 当日时刻，不引入日期库
    fn stamp(&self, time: SystemTime) -> String {
        if !self.config.show_timestamp {
            return String::new();
        }
        let duration = time
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default();
        let secs_in_day = duration.as_secs() % 86400;
        format!(
            "{:02}:{:02}:{:02}.{:03} ",
            secs_in_day / 3600,
            (secs_in_day % 3600) / 60,
            secs_in_day % 60,
            duration.subsec_millis()
        )
    }

    /// 补打所有尚未打印的开括号
    fn open_pending(&mut self) {
        for i in 0..self.tracks.len() {
            if self.tracks[i].opened {
                continue;
            }
            let channels = self.tracks[i].channels.clone();
            let line = format!(
                "{}{}{}{} {{",
                self.stamp(self.tracks[i].started_at),
                self.margin(&channels),
                self.indent(self.tracks[i].depth),
                self.tracks[i].title
            );
            self.emit(&channels, &line);
            self.tracks[i].opened = true;
        }
    }

    /// 把记录内容展开为输出行
    fn render_content(&self, content: &Content) -> Vec<String> {
        match content {
            Content::Text(text) => text.split('\n').map(str::to_string).collect(),
            Content::Error(trail) => Self::render_error(trail),
        }
    }

    fn render_error(trail: &ErrorTrail) -> Vec<String> {
        let mut lines = Vec::new();
        let base_trace: &[String] = trail
            .links
            .first()
            .map(|link| link.trace.as_slice())
            .unwrap_or(&[]);

        for (i, link) in trail.links.iter().enumerate() {
            if i == 0 {
                lines.push(link.message.clone());
                for frame in &link.trace {
                    lines.push(format!("  {}", frame));
                }
            } else {
                lines.push(format!("caused by: {}", link.message));
                // 与最外层调用栈共有的尾部行省略
                let shared = common_suffix_len(&link.trace, base_trace);
                for frame in &link.trace[..link.trace.len() - shared] {
                    lines.push(format!("  {}", frame));
                }
                if shared > 0 {
                    lines.push(format!("  ... {} more", shared));
                }
            }
        }
        lines
    }
}

/// 两个行序列共有的尾部长度
fn common_suffix_len(a: &[String], b: &[String]) -> usize {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

impl Handler for SinkHandler {
    fn handle(&mut self, record: &Arc<Record>) -> Vec<Arc<Record>> {
        self.open_pending();

        let lines = self.render_content(&record.content);
        let head = format!(
            "{}{}",
            self.stamp(record.timestamp),
            self.margin(&record.channels)
        );
        let continuation = " ".repeat(head.chars().count());
        let indent = self.indent(record.depth);

        for (i, line) in lines.iter().enumerate() {
            let prefix = if i == 0 { &head } else { &continuation };
            let text = format!("{}{}{}", prefix, indent, line);
            self.emit(&record.channels, &text);
        }

        let count = lines.len();
        for frame in &mut self.tracks {
            frame.lines += count;
        }

        // sink 是终端节点，不向下游传播
        Vec::new()
    }

    fn on_start_track(&mut self, record: &Arc<Record>) -> Vec<Arc<Record>> {
        self.tracks.push(TrackFrame {
            title: record.content.to_string(),
            channels: record.channels.clone(),
            depth: record.depth,
            started_at: record.timestamp,
            opened: false,
            lines: 0,
        });
        Vec::new()
    }

    fn on_end_track(&mut self, _new_depth: usize, timestamp: SystemTime) -> Vec<Arc<Record>> {
        let Some(frame) = self.tracks.pop() else {
            return Vec::new();
        };
        if !frame.opened {
            // 空轨道：开括号从未打印，收尾也不打印
            return Vec::new();
        }

        let elapsed = timestamp
            .duration_since(frame.started_at)
            .unwrap_or_default();
        let mut line = format!(
            "{}{}{}}}",
            self.stamp(timestamp),
            self.margin(&frame.channels),
            self.indent(frame.depth)
        );
        if frame.lines >= self.config.min_lines_for_note
            || elapsed.as_millis() as u64 >= self.config.min_elapsed_millis_for_note
        {
            line.push_str(&format!(
                " <- {} [{:.3}s]",
                frame.title,
                elapsed.as_secs_f64()
            ));
        }
        self.emit(&frame.channels, &line);
        Vec::new()
    }

    fn on_shutdown(&mut self) -> Vec<Arc<Record>> {
        if !self.degraded {
            if let Err(err) = self.sink.flush() {
                eprintln!("tracklog: sink degraded to no-op: {}", err);
                self.degraded = true;
            }
        }
        Vec::new()
    }

    fn name(&self) -> &'static str {
        "sink"
    }
}

crate::impl_from!(SinkHandlerCreateConfig => SinkHandler, expect: "failed to assemble sink handler");
crate::impl_box_from!(SinkHandler => dyn Handler);
