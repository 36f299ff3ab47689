//! 错误处理模块
//!
//! 把MongoDB驱动返回的各种错误归类为一组稳定的错误类型，
//! 调用者只需要对 `MgoDbError` 做模式匹配即可区分"未找到"和真正的操作失败

use mongodb::error::{ErrorKind, WriteFailure};
use thiserror::Error;

/// 主键/唯一索引冲突的错误码
const DUPLICATE_KEY_CODES: [i32; 3] = [11000, 11001, 12582];

/// rat_mgodb 错误类型
#[derive(Error, Debug)]
pub enum MgoDbError {
    /// 期望至少匹配一条文档，但没有任何匹配
    #[error("未找到匹配的文档: {collection}")]
    NotFound { collection: String },

    /// 唯一约束冲突
    #[error("唯一键冲突 ({collection}): {message}")]
    DuplicateKey { collection: String, message: String },

    /// 调用参数不合法（分页、排序、过滤条件等）
    #[error("参数错误: {field} - {message}")]
    InvalidArgument { field: String, message: String },

    /// 连接池已满且策略为立即失败
    #[error("连接池已耗尽: 最大会话数 {max_pool_size}")]
    PoolExhausted { max_pool_size: usize },

    /// 连接/传输失败，包括超时和未初始化
    #[error("连接错误: {message}")]
    ConnectionError { message: String },

    /// 其他后端操作失败
    #[error("操作失败: {message}")]
    OperationError { message: String },

    /// 无法为给定类型解析集合名
    #[error("集合名解析失败: {type_name} - {message}")]
    ResolutionError { type_name: String, message: String },

    /// 实体与BSON文档之间转换失败
    #[error("序列化错误: {message}")]
    SerializationError { message: String },

    /// 配置错误
    #[error("配置错误: {message}")]
    ConfigError { message: String },

    /// IO错误
    #[error("IO错误: {0}")]
    IoError(#[from] std::io::Error),
}

/// 结果类型别名
pub type MgoDbResult<T> = Result<T, MgoDbError>;

impl MgoDbError {
    /// 是否为零匹配
    pub fn is_not_found(&self) -> bool {
        matches!(self, MgoDbError::NotFound { .. })
    }

    /// 是否为唯一键冲突
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, MgoDbError::DuplicateKey { .. })
    }

    /// 是否为资源或传输层错误
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            MgoDbError::ConnectionError { .. } | MgoDbError::PoolExhausted { .. }
        )
    }
}

/// 便捷宏：构造常见错误
#[macro_export]
macro_rules! mgo_error {
    (not_found, $collection:expr) => {
        $crate::error::MgoDbError::NotFound {
            collection: $collection.to_string(),
        }
    };
    (invalid_argument, $field:expr, $message:expr) => {
        $crate::error::MgoDbError::InvalidArgument {
            field: $field.to_string(),
            message: $message.to_string(),
        }
    };
    (connection, $message:expr) => {
        $crate::error::MgoDbError::ConnectionError {
            message: $message.to_string(),
        }
    };
    (operation, $message:expr) => {
        $crate::error::MgoDbError::OperationError {
            message: $message.to_string(),
        }
    };
    (serialization, $message:expr) => {
        $crate::error::MgoDbError::SerializationError {
            message: $message.to_string(),
        }
    };
    (config, $message:expr) => {
        $crate::error::MgoDbError::ConfigError {
            message: $message.to_string(),
        }
    };
    (resolution, $type_name:expr, $message:expr) => {
        $crate::error::MgoDbError::ResolutionError {
            type_name: $type_name.to_string(),
            message: $message.to_string(),
        }
    };
}

/// 判断错误码是否为唯一键冲突
pub fn is_duplicate_key_code(code: i32) -> bool {
    DUPLICATE_KEY_CODES.contains(&code)
}

/// 批量写入中的单条失败
#[derive(Debug, Clone, PartialEq)]
pub struct WriteFailureEntry {
    /// 文档在批次中的下标
    pub index: usize,
    pub code: i32,
    pub message: String,
}

/// 把批量写入的所有失败汇总成一条操作错误
pub fn summarize_write_failures(
    collection: &str,
    total: usize,
    failures: &[WriteFailureEntry],
) -> MgoDbError {
    let details = failures
        .iter()
        .map(|f| format!("#{} [{}] {}", f.index, f.code, f.message))
        .collect::<Vec<_>>()
        .join("; ");

    MgoDbError::OperationError {
        message: crate::i18n::tf(
            "error.bulk_write",
            &[
                ("collection", collection),
                ("failed", &failures.len().to_string()),
                ("total", &total.to_string()),
                ("details", &details),
            ],
        ),
    }
}

/// 提取批量写入错误中的逐条失败，非批量写入错误返回 `None`
///
/// 写关注错误没有对应的文档下标，记为 `total`
pub(crate) fn bulk_write_failures(
    err: &mongodb::error::Error,
    total: usize,
) -> Option<Vec<WriteFailureEntry>> {
    let ErrorKind::BulkWrite(failure) = err.kind.as_ref() else {
        return None;
    };

    let mut entries: Vec<WriteFailureEntry> = failure
        .write_errors
        .as_ref()
        .map(|errors| {
            errors
                .iter()
                .map(|e| WriteFailureEntry {
                    index: e.index,
                    code: e.code,
                    message: e.message.clone(),
                })
                .collect()
        })
        .unwrap_or_default();
    if let Some(concern) = &failure.write_concern_error {
        entries.push(WriteFailureEntry {
            index: total,
            code: concern.code,
            message: concern.message.clone(),
        });
    }
    Some(entries)
}

/// 归类驱动错误
///
/// 不做任何重试，只负责把错误翻译成调用者可以匹配的类型
pub fn classify(collection: &str, err: mongodb::error::Error) -> MgoDbError {
    classify_batch(collection, 0, err)
}

/// 归类驱动错误，`total` 为批量写入的文档总数
pub(crate) fn classify_batch(
    collection: &str,
    total: usize,
    err: mongodb::error::Error,
) -> MgoDbError {
    let classified = match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if is_duplicate_key_code(write_error.code) =>
        {
            MgoDbError::DuplicateKey {
                collection: collection.to_string(),
                message: write_error.message.clone(),
            }
        }
        ErrorKind::Command(command_error) if is_duplicate_key_code(command_error.code) => {
            MgoDbError::DuplicateKey {
                collection: collection.to_string(),
                message: command_error.message.clone(),
            }
        }
        ErrorKind::BulkWrite(_) => {
            let entries = bulk_write_failures(&err, total).unwrap_or_default();
            summarize_write_failures(collection, total.max(entries.len()), &entries)
        }
        ErrorKind::ServerSelection { message, .. }
        | ErrorKind::DnsResolve { message, .. }
        | ErrorKind::ConnectionPoolCleared { message, .. }
        | ErrorKind::Authentication { message, .. } => MgoDbError::ConnectionError {
            message: crate::i18n::tf("error.connection", &[("message", message.as_str())]),
        },
        ErrorKind::Io(io_error) => MgoDbError::ConnectionError {
            message: crate::i18n::tf("error.connection", &[("message", &io_error.to_string())]),
        },
        ErrorKind::InvalidArgument { message, .. } => MgoDbError::InvalidArgument {
            field: collection.to_string(),
            message: message.clone(),
        },
        ErrorKind::BsonSerialization(e) => MgoDbError::SerializationError {
            message: e.to_string(),
        },
        ErrorKind::BsonDeserialization(e) => MgoDbError::SerializationError {
            message: e.to_string(),
        },
        _ => MgoDbError::OperationError {
            message: crate::i18n::tf(
                "error.operation",
                &[("collection", collection), ("message", &err.to_string())],
            ),
        },
    };

    rat_logger::debug!("驱动错误归类: collection={}, result={}", collection, classified);
    classified
}

impl From<mongodb::bson::ser::Error> for MgoDbError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        MgoDbError::SerializationError {
            message: err.to_string(),
        }
    }
}

impl From<mongodb::bson::de::Error> for MgoDbError {
    fn from(err: mongodb::bson::de::Error) -> Self {
        MgoDbError::SerializationError {
            message: err.to_string(),
        }
    }
}
