// 组件注册表：按 trait 分组的名称 -> 构造函数映射

use anyhow::Result;
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::cfg::type_options::TypeOptions;
use crate::cfg::ConfigError;

// 构造函数统一返回 Box<dyn Any>，内部实际装的是 Box<dyn Trait>
type TraitConstructor = Box<dyn Fn(JsonValue) -> Result<Box<dyn Any + Send>> + Send + Sync>;

// 每个 Trait 一张独立的注册表：外层 key 是 Trait 的 TypeId，内层 key 是组件名
static TRAIT_REGISTRY: Lazy<RwLock<HashMap<TypeId, HashMap<String, TraitConstructor>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// 为实现特定 Trait 的类型注册构造函数
///
/// 同一 Trait 下可注册多个实现，运行时根据 `TypeOptions` 的名称创建 trait object。
///
/// # 示例
///
/// ```ignore
/// register_trait::<ConsoleSink, dyn Sink, ConsoleSinkConfig>("ConsoleSink")?;
/// let sink: Box<dyn Sink> = create_trait_from_type_options(&type_options)?;
/// ```
pub fn register_trait<T, Trait, Config>(type_name: &str) -> Result<()>
where
    T: Send + 'static,
    Trait: ?Sized + Send + 'static,
    Config: DeserializeOwned + 'static,
    T: From<Config>,
    Box<T>: Into<Box<Trait>>,
{
    let name = type_name.to_string();
    let registered_name = name.clone();
    let constructor: TraitConstructor = Box::new(move |value| {
        // 配置缺省时按空对象解析，组件的 serde(default) 自行兜底
        let value = if value.is_null() {
            JsonValue::Object(Default::default())
        } else {
            value
        };
        let config: Config =
            serde_json::from_value(value).map_err(|source| ConfigError::InvalidOptions {
                type_name: registered_name.clone(),
                source,
            })?;
        let instance = T::from(config);
        let trait_object: Box<Trait> = Box::new(instance).into();
        Ok(Box::new(trait_object) as Box<dyn Any + Send>)
    });

    let mut registry = TRAIT_REGISTRY
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    registry
        .entry(TypeId::of::<Trait>())
        .or_default()
        .insert(name, constructor);
    Ok(())
}

/// 根据 TypeOptions 创建 trait object
pub fn create_trait_from_type_options<Trait>(type_options: &TypeOptions) -> Result<Box<Trait>>
where
    Trait: ?Sized + Send + 'static,
{
    let registry = TRAIT_REGISTRY
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    let trait_registry = registry
        .get(&TypeId::of::<Trait>())
        .ok_or(ConfigError::NoImplementations)?;

    let constructor = trait_registry
        .get(&type_options.type_name)
        .ok_or_else(|| ConfigError::TypeNotRegistered(type_options.type_name.clone()))?;

    let any_box = constructor(type_options.options.clone())?;

    // 从 Box<dyn Any> 中取回 Box<dyn Trait>
    any_box
        .downcast::<Box<Trait>>()
        .map(|boxed| *boxed)
        .map_err(|_| anyhow::anyhow!("failed to downcast to target trait type"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    #[derive(Debug, Clone, Deserialize)]
    struct EnglishGreeterConfig {
        name: String,
    }

    struct EnglishGreeter {
        name: String,
    }

    impl From<EnglishGreeterConfig> for EnglishGreeter {
        fn from(config: EnglishGreeterConfig) -> Self {
            Self { name: config.name }
        }
    }

    impl Greeter for EnglishGreeter {
        fn greet(&self) -> String {
            format!("hello, {}", self.name)
        }
    }

    impl From<Box<EnglishGreeter>> for Box<dyn Greeter> {
        fn from(greeter: Box<EnglishGreeter>) -> Self {
            greeter as Box<dyn Greeter>
        }
    }

    #[derive(Debug, Clone, Deserialize, Default)]
    #[serde(default)]
    struct SilentGreeterConfig {
        enabled: bool,
    }

    struct SilentGreeter {
        enabled: bool,
    }

    impl From<SilentGreeterConfig> for SilentGreeter {
        fn from(config: SilentGreeterConfig) -> Self {
            Self {
                enabled: config.enabled,
            }
        }
    }

    impl Greeter for SilentGreeter {
        fn greet(&self) -> String {
            if self.enabled {
                "...".to_string()
            } else {
                String::new()
            }
        }
    }

    impl From<Box<SilentGreeter>> for Box<dyn Greeter> {
        fn from(greeter: Box<SilentGreeter>) -> Self {
            greeter as Box<dyn Greeter>
        }
    }

    #[test]
    fn test_register_and_create() -> Result<()> {
        register_trait::<EnglishGreeter, dyn Greeter, EnglishGreeterConfig>("english")?;

        let opts = TypeOptions {
            type_name: "english".to_string(),
            options: serde_json::json!({ "name": "alice" }),
        };

        let greeter: Box<dyn Greeter> = create_trait_from_type_options(&opts)?;
        assert_eq!(greeter.greet(), "hello, alice");
        Ok(())
    }

    #[test]
    fn test_null_options_use_defaults() -> Result<()> {
        register_trait::<SilentGreeter, dyn Greeter, SilentGreeterConfig>("silent")?;

        let opts = TypeOptions {
            type_name: "silent".to_string(),
            options: JsonValue::Null,
        };

        let greeter: Box<dyn Greeter> = create_trait_from_type_options(&opts)?;
        assert_eq!(greeter.greet(), "");
        Ok(())
    }

    #[test]
    fn test_unregistered_type_error() -> Result<()> {
        register_trait::<EnglishGreeter, dyn Greeter, EnglishGreeterConfig>("known")?;

        let opts = TypeOptions {
            type_name: "unknown".to_string(),
            options: serde_json::json!({}),
        };

        let result: Result<Box<dyn Greeter>> = create_trait_from_type_options(&opts);
        assert!(result.is_err());
        assert!(result.err().unwrap().to_string().contains("not registered"));
        Ok(())
    }

    #[test]
    fn test_invalid_options_error() -> Result<()> {
        register_trait::<EnglishGreeter, dyn Greeter, EnglishGreeterConfig>("strict")?;

        let opts = TypeOptions {
            type_name: "strict".to_string(),
            options: serde_json::json!({ "wrong_field": 1 }),
        };

        let result: Result<Box<dyn Greeter>> = create_trait_from_type_options(&opts);
        assert!(result.is_err());
        Ok(())
    }
}
