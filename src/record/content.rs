use std::error::Error as StdError;
use std::fmt;

/// 记录内容
///
/// 普通文本，或在 emit 时捕获好的错误链快照。创建后不再变化。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// 文本内容
    Text(String),
    /// 错误链内容
    Error(ErrorTrail),
}

impl Content {
    pub fn text(s: impl Into<String>) -> Self {
        Content::Text(s.into())
    }

    /// 从任意标准错误捕获错误链
    pub fn from_error(err: &(dyn StdError + 'static)) -> Self {
        Content::Error(ErrorTrail::capture(err))
    }

    /// 从 anyhow 错误捕获错误链
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        Content::Error(ErrorTrail::capture_anyhow(err))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text(s) => Some(s),
            Content::Error(_) => None,
        }
    }
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Content::Text(s) => write!(f, "{}", s),
            Content::Error(trail) => match trail.links.first() {
                Some(link) => write!(f, "{}", link.message),
                None => write!(f, "<error>"),
            },
        }
    }
}

impl From<String> for Content {
    fn from(s: String) -> Self {
        Content::Text(s)
    }
}

impl From<&str> for Content {
    fn from(s: &str) -> Self {
        Content::Text(s.to_string())
    }
}

impl From<fmt::Arguments<'_>> for Content {
    fn from(args: fmt::Arguments<'_>) -> Self {
        Content::Text(args.to_string())
    }
}

/// 错误链快照
///
/// 在 emit 时刻沿 `source()` 链展开并固化为纯数据，处理树内不再持有原错误对象。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorTrail {
    /// 自外向内的错误链，第一项为最外层错误
    pub links: Vec<ErrorLink>,
}

/// 错误链中的一环
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorLink {
    /// 错误消息
    pub message: String,
    /// 可选的调用栈行（按自顶向下顺序）
    pub trace: Vec<String>,
}

impl ErrorLink {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            trace: Vec::new(),
        }
    }

    pub fn with_trace(mut self, trace: Vec<String>) -> Self {
        self.trace = trace;
        self
    }
}

impl ErrorTrail {
    /// 沿标准错误的 `source()` 链捕获
    pub fn capture(err: &(dyn StdError + 'static)) -> Self {
        let mut links = vec![ErrorLink::new(err.to_string())];
        let mut source = err.source();
        while let Some(cause) = source {
            links.push(ErrorLink::new(cause.to_string()));
            source = cause.source();
        }
        Self { links }
    }

    /// 沿 anyhow 错误的 `chain()` 捕获
    pub fn capture_anyhow(err: &anyhow::Error) -> Self {
        let links = err
            .chain()
            .map(|cause| ErrorLink::new(cause.to_string()))
            .collect();
        Self { links }
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
