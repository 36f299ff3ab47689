//! 集合名解析
//!
//! 解析顺序：元素类型的显式集合名 > 组合链上的显式集合名 > 由类型名推导。
//! 结果按 `TypeId` 缓存，类型到集合名的映射在进程内不会改变

use dashmap::DashMap;
use rat_logger::debug;
use serde::{Deserialize, Serialize};
use std::any::TypeId;

use super::{Entity, Resolvable};
use crate::error::{MgoDbError, MgoDbResult};

/// 类型名到集合名的转换规则
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NamingRule {
    /// `CarOwner` -> `car_owner`
    #[default]
    SnakeCase,
    /// `CarOwner` -> `carowner`
    Lowercase,
}

impl NamingRule {
    pub fn apply(&self, ident: &str) -> String {
        match self {
            NamingRule::SnakeCase => to_snake_case(ident),
            NamingRule::Lowercase => ident.to_lowercase(),
        }
    }
}

/// 不是结构体的内置类型名
const PRIMITIVE_NAMES: &[&str] = &[
    "bool", "char", "str", "String", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16",
    "u32", "u64", "u128", "usize", "f32", "f64",
];

/// 集合名解析器
#[derive(Debug, Default)]
pub struct CollectionResolver {
    rule: NamingRule,
    cache: DashMap<TypeId, String>,
}

impl CollectionResolver {
    pub fn new(rule: NamingRule) -> Self {
        Self {
            rule,
            cache: DashMap::new(),
        }
    }

    pub fn rule(&self) -> NamingRule {
        self.rule
    }

    /// 按静态类型解析集合名
    pub fn resolve<V: Resolvable + ?Sized>(&self) -> MgoDbResult<String> {
        self.resolve_element::<V::Element>()
    }

    /// 按值解析集合名，只看值的静态类型，不看字段内容
    pub fn resolve_value<V: Resolvable + ?Sized>(&self, _value: &V) -> MgoDbResult<String> {
        self.resolve::<V>()
    }

    fn resolve_element<E: Entity>(&self) -> MgoDbResult<String> {
        let type_id = TypeId::of::<E>();
        if let Some(cached) = self.cache.get(&type_id).map(|name| name.value().clone()) {
            return Ok(cached);
        }

        let type_name = std::any::type_name::<E>();
        let name = match E::collection_name().or_else(E::embedded_collection_name) {
            Some(explicit) => explicit.into_owned(),
            None => derive_collection_name(type_name, self.rule)?,
        };
        validate_collection_name(type_name, &name)?;

        debug!("解析集合名: {} -> {}", type_name, name);
        self.cache.insert(type_id, name.clone());
        Ok(name)
    }

    /// 已缓存的类型数量
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

/// 从完整类型路径推导集合名
///
/// 去掉模块路径和泛型参数后按规则转换；元组、切片、引用和内置类型无法推导
pub fn derive_collection_name(type_name: &str, rule: NamingRule) -> MgoDbResult<String> {
    let unsupported = |reason: &str| MgoDbError::ResolutionError {
        type_name: type_name.to_string(),
        message: crate::i18n::tf("error.resolution", &[("reason", reason)]),
    };

    let head = type_name.trim();
    let is_fn_pointer = head.starts_with("fn") && head.contains('(');
    if head.starts_with(['(', '[', '&', '*']) || head.starts_with("dyn ") || is_fn_pointer {
        return Err(unsupported("not a nominal type"));
    }

    let without_generics = head.split('<').next().unwrap_or(head);
    let ident = without_generics.rsplit("::").next().unwrap_or(without_generics);

    if ident.is_empty() || ident.contains('{') || !ident.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(unsupported("anonymous type"));
    }
    if PRIMITIVE_NAMES.contains(&ident) {
        return Err(unsupported("primitive type"));
    }

    Ok(rule.apply(ident))
}

/// 校验集合名是否能在MongoDB中使用
pub fn validate_collection_name(type_name: &str, name: &str) -> MgoDbResult<()> {
    let reason = if name.is_empty() {
        Some("empty collection name")
    } else if name.contains('$') {
        Some("collection name contains '$'")
    } else if name.contains('\0') {
        Some("collection name contains NUL")
    } else if name.starts_with("system.") {
        Some("collection name uses the reserved system. prefix")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(MgoDbError::ResolutionError {
            type_name: type_name.to_string(),
            message: crate::i18n::tf("error.resolution", &[("reason", reason)]),
        }),
        None => Ok(()),
    }
}

fn to_snake_case(ident: &str) -> String {
    let chars: Vec<char> = ident.chars().collect();
    let mut out = String::with_capacity(ident.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = if i > 0 { Some(chars[i - 1]) } else { None };
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p == '_' => false,
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.map_or(false, |n| n.is_lowercase()),
                _ => false,
            };
            if boundary {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }

    out
}
