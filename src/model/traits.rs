//! 实体 trait 定义模块
//!
//! 定义实体的命名能力和包装形状的解包规则

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::sync::Arc;

/// 实体特征
///
/// 任何能序列化为文档、并由调用者自行赋予主键的结构体都可以作为实体。
/// 默认情况下集合名由类型名推导；重写 `collection_name` 可以显式指定
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + Unpin + 'static {
    /// 显式集合名，优先级最高
    fn collection_name() -> Option<Cow<'static, str>> {
        None
    }

    /// 组合链上被嵌入类型的集合名
    ///
    /// 只有在自身没有显式集合名时才会使用
    fn embedded_collection_name() -> Option<Cow<'static, str>> {
        None
    }

    /// upsert冲突判定所依据的自然键
    ///
    /// 非空时首次upsert会在这些字段上确保唯一索引，并发upsert依靠该索引收敛为一条文档。
    /// 默认为空，引擎不会替调用者创建任何索引
    fn upsert_keys() -> &'static [&'static str] {
        &[]
    }
}

/// 可解析集合名的值形状
///
/// 结构体本身、引用、`Box`、`Arc`、`Option`、`Vec`、切片和数组都解包到同一个最内层实体类型
pub trait Resolvable {
    /// 最内层实体类型
    type Element: Entity;
}

impl<T: Resolvable + ?Sized> Resolvable for &T {
    type Element = T::Element;
}

impl<T: Resolvable + ?Sized> Resolvable for &mut T {
    type Element = T::Element;
}

impl<T: Resolvable + ?Sized> Resolvable for Box<T> {
    type Element = T::Element;
}

impl<T: Resolvable + ?Sized> Resolvable for Arc<T> {
    type Element = T::Element;
}

impl<T: Resolvable> Resolvable for Option<T> {
    type Element = T::Element;
}

impl<T: Resolvable> Resolvable for Vec<T> {
    type Element = T::Element;
}

impl<T: Resolvable> Resolvable for [T] {
    type Element = T::Element;
}

impl<T: Resolvable, const N: usize> Resolvable for [T; N] {
    type Element = T::Element;
}

/// `Vec<Box<T>>` 也可以作为查询结果的目标
impl<T: Entity> Entity for Box<T> {
    fn collection_name() -> Option<Cow<'static, str>> {
        T::collection_name()
    }

    fn embedded_collection_name() -> Option<Cow<'static, str>> {
        T::embedded_collection_name()
    }

    fn upsert_keys() -> &'static [&'static str] {
        T::upsert_keys()
    }
}
