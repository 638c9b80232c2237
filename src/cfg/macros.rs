//! 装配相关的宏
//!
//! 注册表要求组件实现 `From<Config>`，并能从 `Box<T>` 转成 `Box<dyn Trait>`，
//! 这两个宏消除相应的样板代码。

/// 为配置类型实现 From trait
///
/// 两种模式：
/// 1. `impl_from!(ConfigType => Type)` - 调用 `Type::new(config)`
/// 2. `impl_from!(ConfigType => Type, expect: "错误消息")` - `new` 可能失败时使用，
///    装配阶段的失败是致命错误，直接 expect
#[macro_export]
macro_rules! impl_from {
    ($config_type:ty => $target_type:ty) => {
        impl From<$config_type> for $target_type {
            fn from(config: $config_type) -> Self {
                <$target_type>::new(config)
            }
        }
    };

    ($config_type:ty => $target_type:ty, expect: $msg:literal) => {
        impl From<$config_type> for $target_type {
            fn from(config: $config_type) -> Self {
                <$target_type>::new(config).expect($msg)
            }
        }
    };
}

/// 为 Box<T> 实现到 Box<dyn Trait> 的转换
///
/// 用法：`impl_box_from!(Type => dyn TraitName)`
#[macro_export]
macro_rules! impl_box_from {
    ($source_type:ty => dyn $trait_name:path) => {
        impl From<Box<$source_type>> for Box<dyn $trait_name> {
            fn from(source: Box<$source_type>) -> Self {
                source as Box<dyn $trait_name>
            }
        }
    };
}
