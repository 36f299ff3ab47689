//! MongoDB索引管理模块

use mongodb::bson::Document;
use mongodb::error::ErrorKind;
use mongodb::options::IndexOptions;
use mongodb::{ClientSession, Collection, IndexModel};
use rat_logger::{debug, warn};

use crate::error::{classify, is_duplicate_key_code, MgoDbError, MgoDbResult};

/// 已存在同名或同键但选项不同的索引
const INDEX_CONFLICT_CODES: [i32; 2] = [85, 86];

/// 在会话中创建索引，返回索引名
pub(crate) async fn create_index(
    collection: &Collection<Document>,
    session: &mut ClientSession,
    keys: Document,
    name: Option<String>,
    unique: bool,
) -> MgoDbResult<String> {
    let mut index_options = IndexOptions::default();
    index_options.name = name;
    index_options.unique = Some(unique);

    let index_model = IndexModel::builder()
        .keys(keys)
        .options(index_options)
        .build();

    debug!("创建MongoDB索引: collection={}, unique={}", collection.name(), unique);

    collection
        .create_index_with_session(index_model, None, session)
        .await
        .map(|result| result.index_name)
        .map_err(|e| classify(collection.name(), e))
}

/// 确保唯一索引存在
///
/// 服务器上已有同键索引（名称或选项不同）时视为已满足，只记录警告。
/// 集合中已有重复值导致索引无法建立时返回 `OperationError`，而不是 `DuplicateKey`
pub(crate) async fn ensure_unique_index(
    collection: &Collection<Document>,
    session: &mut ClientSession,
    keys: &[String],
    name: String,
) -> MgoDbResult<()> {
    let mut index_keys = Document::new();
    for key in keys {
        index_keys.insert(key.as_str(), 1);
    }

    let mut index_options = IndexOptions::default();
    index_options.name = Some(name.clone());
    index_options.unique = Some(true);

    let index_model = IndexModel::builder()
        .keys(index_keys)
        .options(index_options)
        .build();

    match collection
        .create_index_with_session(index_model, None, session)
        .await
    {
        Ok(_) => {
            debug!("唯一索引已就绪: collection={}, index={}", collection.name(), name);
            Ok(())
        }
        Err(e) => match e.kind.as_ref() {
            ErrorKind::Command(command_error) if INDEX_CONFLICT_CODES.contains(&command_error.code) => {
                warn!(
                    "集合 {} 上已有同键索引，沿用现有索引: {}",
                    collection.name(),
                    command_error.message
                );
                Ok(())
            }
            ErrorKind::Command(command_error) if is_duplicate_key_code(command_error.code) => {
                warn!(
                    "集合 {} 已有重复值，无法建立唯一索引 {}: {}",
                    collection.name(),
                    name,
                    command_error.message
                );
                Err(unique_index_conflict(collection.name(), keys, &command_error.message))
            }
            _ => Err(classify(collection.name(), e)),
        },
    }
}

/// 唯一索引因已有重复值无法建立
pub(crate) fn unique_index_conflict(collection: &str, keys: &[String], message: &str) -> MgoDbError {
    MgoDbError::OperationError {
        message: crate::i18n::tf(
            "error.unique_index_conflict",
            &[
                ("collection", collection),
                ("keys", &keys.join(",")),
                ("message", message),
            ],
        ),
    }
}
