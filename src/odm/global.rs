//! # 全局实体引擎和便捷函数
//!
//! 进程级的引擎槽位。重新初始化会替换槽位，旧引擎的连接池立即关闭，
//! 正在执行的操作持有旧引擎的引用，完成后随之释放

use arc_swap::ArcSwapOption;
use futures::future::BoxFuture;
use mongodb::bson::Document;
use once_cell::sync::Lazy;
use rat_logger::info;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{MgoConfig, PoolConfig};
use crate::error::{MgoDbError, MgoDbResult};
use crate::model::{Entity, Resolvable};
use crate::odm::batch::InsertBatch;
use crate::odm::handlers::UpsertOutcome;
use crate::odm::manager_core::MgoEngine;
use crate::pool::{PoolStatus, PooledSession};

/// 全局实体引擎实例
static GLOBAL_ENGINE: Lazy<ArcSwapOption<MgoEngine>> = Lazy::new(|| ArcSwapOption::from(None));

/// 初始化全局引擎
///
/// 在crate根部以 `init_engine` 导出，与只设置错误消息语言的 `rat_mgodb::init` 无关。
/// 地址无法解析或无法连通时返回 `ConnectionError`
pub async fn init(uri: &str, max_pool_size: u32, socket_timeout: Duration) -> MgoDbResult<()> {
    let pool = PoolConfig::builder()
        .max_pool_size(max_pool_size)
        .socket_timeout(socket_timeout)
        .build()?;
    let config = MgoConfig::builder().uri(uri).pool(pool).build()?;
    init_with_config(config).await
}

/// 按完整配置初始化全局引擎
pub async fn init_with_config(config: MgoConfig) -> MgoDbResult<()> {
    let engine = MgoEngine::connect(config).await?;
    install(engine);
    Ok(())
}

/// 安装一个已建立的引擎，返回前一个引擎是否存在
pub fn install(engine: MgoEngine) -> bool {
    match GLOBAL_ENGINE.swap(Some(Arc::new(engine))) {
        Some(previous) => {
            info!("替换全局实体引擎: 旧数据库={}", previous.database_name());
            previous.close();
            true
        }
        None => false,
    }
}

/// 获取全局引擎，未初始化时返回 `ConnectionError`
pub fn engine() -> MgoDbResult<Arc<MgoEngine>> {
    GLOBAL_ENGINE.load_full().ok_or_else(|| MgoDbError::ConnectionError {
        message: crate::i18n::t("error.not_initialized"),
    })
}

/// 是否已初始化
pub fn is_initialized() -> bool {
    GLOBAL_ENGINE.load().is_some()
}

/// 卸载全局引擎并关闭其连接池
pub fn shutdown() -> bool {
    match GLOBAL_ENGINE.swap(None) {
        Some(previous) => {
            info!("关闭全局实体引擎: database={}", previous.database_name());
            previous.close();
            true
        }
        None => false,
    }
}

/// 便捷函数：插入一个实体
pub async fn insert<T: Entity + Resolvable>(entity: &T) -> MgoDbResult<()> {
    engine()?.insert(entity).await
}

/// 便捷函数：批量插入同类实体
pub async fn insert_many<T: Entity + Resolvable>(entities: &[T]) -> MgoDbResult<usize> {
    engine()?.insert_many(entities).await
}

/// 便捷函数：插入异构批次
pub async fn insert_batch(batch: InsertBatch) -> MgoDbResult<usize> {
    engine()?.insert_batch(batch).await
}

/// 便捷函数：查找一条
pub async fn find_one<T: Entity + Resolvable>(filter: Document) -> MgoDbResult<T> {
    engine()?.find_one(filter).await
}

/// 便捷函数：查找一条并写入调用者的值
pub async fn find_one_into<T: Entity + Resolvable>(out: &mut T, filter: Document) -> MgoDbResult<()> {
    engine()?.find_one_into(out, filter).await
}

/// 便捷函数：分页查询
pub async fn find<T, S>(filter: Document, page: u64, page_size: u64, sort: &[S]) -> MgoDbResult<Vec<T>>
where
    T: Entity + Resolvable,
    S: AsRef<str>,
{
    engine()?.find(filter, page, page_size, sort).await
}

/// 便捷函数：分页查询并写入调用者的列表
pub async fn find_into<T, S>(out: &mut Vec<T>, filter: Document, page: u64, page_size: u64, sort: &[S]) -> MgoDbResult<()>
where
    T: Entity + Resolvable,
    S: AsRef<str>,
{
    engine()?.find_into(out, filter, page, page_size, sort).await
}

/// 便捷函数：更新一条（只写）
pub async fn update_one<V: Resolvable + ?Sized>(filter: Document, update: Document) -> MgoDbResult<()> {
    engine()?.update_one::<V>(filter, update).await
}

/// 便捷函数：更新一条并返回更新后的值
pub async fn find_one_and_update<T: Entity + Resolvable>(filter: Document, update: Document) -> MgoDbResult<T> {
    engine()?.find_one_and_update(filter, update).await
}

/// 便捷函数：upsert
pub async fn upsert_one<T: Entity + Resolvable>(entity: &T, filter: Document) -> MgoDbResult<UpsertOutcome> {
    engine()?.upsert_one(entity, filter).await
}

/// 便捷函数：删除一条
pub async fn remove_one<V: Resolvable + ?Sized>(filter: Document) -> MgoDbResult<()> {
    engine()?.remove_one::<V>(filter).await
}

/// 便捷函数：计数
pub async fn count<V: Resolvable + ?Sized>(filter: Document) -> MgoDbResult<u64> {
    engine()?.count::<V>(filter).await
}

/// 便捷函数：是否存在
pub async fn exists<V: Resolvable + ?Sized>(filter: Document) -> MgoDbResult<bool> {
    engine()?.exists::<V>(filter).await
}

/// 便捷函数：聚合
pub async fn aggregate<T: Entity + Resolvable>(pipeline: Vec<Document>) -> MgoDbResult<Vec<T>> {
    engine()?.aggregate(pipeline).await
}

/// 便捷函数：聚合并写入调用者的列表
pub async fn aggregate_into<T: Entity + Resolvable>(out: &mut Vec<T>, pipeline: Vec<Document>) -> MgoDbResult<()> {
    engine()?.aggregate_into(out, pipeline).await
}

/// 便捷函数：借出会话执行自定义操作
pub async fn execute<F, R>(f: F) -> MgoDbResult<R>
where
    F: for<'s> FnOnce(&'s mut PooledSession) -> BoxFuture<'s, MgoDbResult<R>>,
{
    engine()?.execute(f).await
}

/// 便捷函数：创建索引
pub async fn create_index<V: Resolvable + ?Sized>(keys: Document, unique: bool) -> MgoDbResult<String> {
    engine()?.create_index::<V>(keys, unique).await
}

/// 便捷函数：删除当前数据库
pub async fn drop_database() -> MgoDbResult<()> {
    engine()?.drop_database().await
}

/// 便捷函数：服务器版本
pub async fn server_version() -> MgoDbResult<String> {
    engine()?.server_version().await
}

/// 便捷函数：健康检查，未初始化时返回false
pub async fn health_check() -> bool {
    match engine() {
        Ok(engine) => engine.health_check().await,
        Err(_) => false,
    }
}

/// 便捷函数：类型对应的集合名
pub fn collection_name<V: Resolvable + ?Sized>() -> MgoDbResult<String> {
    engine()?.collection_name::<V>()
}

/// 便捷函数：连接池状态
pub fn pool_status() -> MgoDbResult<PoolStatus> {
    Ok(engine()?.pool_status())
}
