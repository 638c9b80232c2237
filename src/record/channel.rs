use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// 日志通道
///
/// 既是路由键也是展示标签。内置通道之外，调用方可以用任意字符串自定义通道。
/// `Force` 是特殊标记：携带它的记录会绕过下游所有可见性过滤与重复折叠。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Channel {
    /// 错误通道
    Error,
    /// 警告通道
    Warn,
    /// 调试通道
    Debug,
    /// 强制输出标记
    Force,
    /// 标准输出通道
    Stdout,
    /// 标准错误通道
    Stderr,
    /// 调用方自定义通道
    Custom(String),
}

impl Channel {
    /// 自定义通道的便捷构造
    pub fn custom(name: impl Into<String>) -> Self {
        Channel::Custom(name.into())
    }

    /// 排序优先级：Force 恒为最前，内置通道其次，自定义通道最后
    pub(crate) fn rank(&self) -> u8 {
        match self {
            Channel::Force => 0,
            Channel::Error => 1,
            Channel::Warn => 2,
            Channel::Debug => 3,
            Channel::Stdout => 4,
            Channel::Stderr => 5,
            Channel::Custom(_) => 6,
        }
    }

    /// 是否为内置通道
    pub fn is_builtin(&self) -> bool {
        !matches!(self, Channel::Custom(_))
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Error => write!(f, "error"),
            Channel::Warn => write!(f, "warn"),
            Channel::Debug => write!(f, "debug"),
            Channel::Force => write!(f, "force"),
            Channel::Stdout => write!(f, "stdout"),
            Channel::Stderr => write!(f, "stderr"),
            Channel::Custom(name) => write!(f, "{}", name),
        }
    }
}

impl FromStr for Channel {
    type Err = std::convert::Infallible;

    /// 内置名称解析为内置通道，其余一律视为自定义通道
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "error" => Channel::Error,
            "warn" => Channel::Warn,
            "debug" => Channel::Debug,
            "force" => Channel::Force,
            "stdout" => Channel::Stdout,
            "stderr" => Channel::Stderr,
            other => Channel::Custom(other.to_string()),
        })
    }
}

// 序列化为纯字符串，配置里写 "debug" 或 "request" 均可
impl Serialize for Channel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Channel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(s.parse().expect("channel parsing is infallible"))
    }
}

/// 有序去重的通道集合
///
/// 不变式：`Force` 存在时必然排在第一位，内置通道在自定义通道之前，
/// 自定义通道之间保持插入顺序。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct ChannelSet {
    channels: Vec<Channel>,
}

impl ChannelSet {
    /// 空集合
    pub fn empty() -> Self {
        Self::default()
    }

    /// 从通道列表构建，自动去重并按不变式排序
    pub fn new(channels: Vec<Channel>) -> Self {
        let mut set = Self { channels };
        set.normalize();
        set
    }

    /// 追加一个通道，保持不变式
    pub fn with(mut self, channel: Channel) -> Self {
        self.channels.push(channel);
        self.normalize();
        self
    }

    /// 与另一个集合合并
    pub fn union(&self, other: &ChannelSet) -> ChannelSet {
        let mut channels = self.channels.clone();
        channels.extend(other.channels.iter().cloned());
        ChannelSet::new(channels)
    }

    /// 将 `from` 通道改名为 `to`，生成新集合
    pub fn rename(&self, from: &Channel, to: &Channel) -> ChannelSet {
        let channels = self
            .channels
            .iter()
            .map(|c| if c == from { to.clone() } else { c.clone() })
            .collect();
        ChannelSet::new(channels)
    }

    pub fn contains(&self, channel: &Channel) -> bool {
        self.channels.contains(channel)
    }

    /// 是否带有 `Force` 强制标记
    pub fn is_forced(&self) -> bool {
        // Force 排序后恒为第一位
        matches!(self.channels.first(), Some(Channel::Force))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Channel> {
        self.channels.iter()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// 去重后做稳定排序：rank 相同的条目保持原有相对顺序
    fn normalize(&mut self) {
        let mut seen = Vec::with_capacity(self.channels.len());
        self.channels.retain(|c| {
            if seen.contains(c) {
                false
            } else {
                seen.push(c.clone());
                true
            }
        });
        self.channels.sort_by_key(Channel::rank);
    }
}

impl fmt::Display for ChannelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, channel) in self.channels.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", channel)?;
        }
        Ok(())
    }
}

impl From<Vec<Channel>> for ChannelSet {
    fn from(channels: Vec<Channel>) -> Self {
        ChannelSet::new(channels)
    }
}

impl From<Channel> for ChannelSet {
    fn from(channel: Channel) -> Self {
        ChannelSet::new(vec![channel])
    }
}

impl<const N: usize> From<[Channel; N]> for ChannelSet {
    fn from(channels: [Channel; N]) -> Self {
        ChannelSet::new(channels.into_iter().collect())
    }
}

impl FromIterator<Channel> for ChannelSet {
    fn from_iter<I: IntoIterator<Item = Channel>>(iter: I) -> Self {
        ChannelSet::new(iter.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for ChannelSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let channels = Vec::<Channel>::deserialize(deserializer)?;
        Ok(ChannelSet::new(channels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_from_str() {
        assert_eq!("error".parse::<Channel>().unwrap(), Channel::Error);
        assert_eq!("force".parse::<Channel>().unwrap(), Channel::Force);
        assert_eq!(
            "request".parse::<Channel>().unwrap(),
            Channel::Custom("request".to_string())
        );
    }

    #[test]
    fn test_channel_display() {
        assert_eq!(Channel::Error.to_string(), "error");
        assert_eq!(Channel::Stdout.to_string(), "stdout");
        assert_eq!(Channel::custom("db").to_string(), "db");
    }

    #[test]
    fn test_channel_set_force_first() {
        let set = ChannelSet::new(vec![
            Channel::custom("request"),
            Channel::Debug,
            Channel::Force,
        ]);

        let ordered: Vec<_> = set.iter().cloned().collect();
        assert_eq!(
            ordered,
            vec![Channel::Force, Channel::Debug, Channel::custom("request")]
        );
        assert!(set.is_forced());
    }

    #[test]
    fn test_channel_set_builtins_before_custom() {
        let set = ChannelSet::new(vec![
            Channel::custom("b"),
            Channel::custom("a"),
            Channel::Warn,
        ]);

        let ordered: Vec<_> = set.iter().cloned().collect();
        // 自定义通道之间保持插入顺序
        assert_eq!(
            ordered,
            vec![Channel::Warn, Channel::custom("b"), Channel::custom("a")]
        );
    }

    #[test]
    fn test_channel_set_dedup() {
        let set = ChannelSet::new(vec![Channel::Debug, Channel::Debug, Channel::Debug]);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_channel_set_rename() {
        let set = ChannelSet::new(vec![Channel::Debug, Channel::custom("old")]);
        let renamed = set.rename(&Channel::custom("old"), &Channel::custom("new"));

        assert!(renamed.contains(&Channel::custom("new")));
        assert!(!renamed.contains(&Channel::custom("old")));
        assert!(renamed.contains(&Channel::Debug));
    }

    #[test]
    fn test_channel_set_union() {
        let a = ChannelSet::from(Channel::Debug);
        let b = ChannelSet::from(Channel::custom("request"));
        let merged = a.union(&b);

        assert_eq!(merged.len(), 2);
        assert!(merged.contains(&Channel::Debug));
        assert!(merged.contains(&Channel::custom("request")));
    }

    #[test]
    fn test_channel_set_display() {
        let set = ChannelSet::new(vec![Channel::custom("db"), Channel::Error]);
        assert_eq!(set.to_string(), "error db");
    }

    #[test]
    fn test_channel_serde_roundtrip() {
        let set = ChannelSet::new(vec![Channel::Force, Channel::Warn, Channel::custom("io")]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["force","warn","io"]"#);

        let parsed: ChannelSet = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, set);
    }

    #[test]
    fn test_channel_set_deserialize_normalizes() {
        // 反序列化输入乱序也要恢复不变式
        let parsed: ChannelSet = serde_json::from_str(r#"["io","force","error"]"#).unwrap();
        let ordered: Vec<_> = parsed.iter().cloned().collect();
        assert_eq!(
            ordered,
            vec![Channel::Force, Channel::Error, Channel::custom("io")]
        );
    }
}
