//! rat_mgodb - 面向MongoDB的泛型数据访问层
//!
//! 调用者直接操作带类型的实体（结构体、引用、切片、`Vec`、`Box` 等），
//! 集合名由类型决定，会话由有上限的连接池按操作借出和归还

// 导出所有公共模块
pub mod error;
pub mod i18n;
pub mod types;
pub mod pool;
pub mod model;
pub mod adapter;
pub mod config;
pub mod odm;

// 重新导出常用类型和函数
pub use error::{MgoDbError, MgoDbResult};
pub use types::{
    MongoDbConnectionBuilder, PaginationConfig, QueryOptions, SortConfig, SortDirection,
};
pub use pool::{AcquirePolicy, ConnectionPool, PoolConfig, PoolStatus, PooledSession};
pub use model::{CollectionResolver, Entity, NamingRule, Resolvable};
pub use config::{MgoConfig, MgoConfigBuilder, PoolConfigBuilder};
pub use odm::{InsertBatch, MgoEngine, UpsertOutcome};
pub use odm::global::{
    aggregate, aggregate_into, collection_name, count, create_index, drop_database, engine,
    execute, exists, find, find_into, find_one, find_one_and_update, find_one_into,
    health_check, init as init_engine, init_with_config, insert, insert_batch, insert_many,
    install, is_initialized, pool_status, remove_one, server_version, shutdown, update_one,
    upsert_one,
};

// 驱动的文档类型，过滤条件、更新文档和聚合管道都直接使用
pub use mongodb::bson::{self, doc, Document};

// 条件编译调试宏 - 只有在 debug 模式下才输出调试信息
#[cfg(debug_assertions)]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        rat_logger::debug!($($arg)*);
    };
}

#[cfg(not(debug_assertions))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        // 在 release 模式下不输出调试信息
    };
}

/// 初始化rat_mgodb库
///
/// 这个函数只初始化多语言错误消息系统，不会建立任何连接。
/// 全局引擎由 `init_engine(uri, max_pool_size, socket_timeout)` 建立
///
/// 注意：日志系统由调用者自行初始化，本库不会自动初始化日志
pub fn init() {
    i18n::ErrorMessageI18n::init();
}

/// 库版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 库名称
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// 获取库信息
pub fn get_info() -> String {
    format!("{} v{}", NAME, VERSION)
}
