//! MongoDB工具函数模块
//!
//! 实体与BSON文档之间的转换，以及过滤条件的结构检查

use mongodb::bson::{self, Bson, Document};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{MgoDbError, MgoDbResult};

/// 将实体序列化为文档
pub(crate) fn to_document<T: Serialize + ?Sized>(value: &T) -> MgoDbResult<Document> {
    match bson::to_bson(value)? {
        Bson::Document(document) => Ok(document),
        other => Err(MgoDbError::SerializationError {
            message: format!("实体必须序列化为文档，实际为 {:?}", other.element_type()),
        }),
    }
}

/// 将文档反序列化为实体
pub(crate) fn from_document<T: DeserializeOwned>(document: Document) -> MgoDbResult<T> {
    Ok(bson::from_document(document)?)
}

/// 提取过滤条件的顶层等值键
///
/// 只有形如 `{ "carId": 1, "name": "X" }` 的过滤条件能被唯一索引覆盖；
/// 顶层操作符（`$or` 等）或操作符文档（`{ "price": { "$gt": 1 } }`）都会被拒绝
pub(crate) fn equality_keys(filter: &Document) -> MgoDbResult<Vec<String>> {
    let rejected = |reason: String| MgoDbError::InvalidArgument {
        field: "filter".to_string(),
        message: crate::i18n::tf("error.upsert_filter", &[("reason", &reason)]),
    };

    if filter.is_empty() {
        return Err(rejected("empty filter".to_string()));
    }

    let mut keys = Vec::with_capacity(filter.len());
    for (key, value) in filter {
        if key.starts_with('$') {
            return Err(rejected(format!("operator key '{}'", key)));
        }
        if let Bson::Document(inner) = value {
            if inner.keys().any(|k| k.starts_with('$')) {
                return Err(rejected(format!("operator value for '{}'", key)));
            }
        }
        keys.push(key.clone());
    }
    Ok(keys)
}

/// 唯一索引的名称，同一组键总是得到同一个名称
pub(crate) fn unique_index_name(keys: &[String]) -> String {
    format!("uniq_{}", keys.join("_"))
}
