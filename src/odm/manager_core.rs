//! # 实体引擎核心实现

use futures::future::BoxFuture;
use parking_lot::Mutex;
use rat_logger::{debug, info, warn};
use std::collections::HashSet;

use crate::config::MgoConfig;
use crate::error::MgoDbResult;
use crate::model::{CollectionResolver, Resolvable};
use crate::pool::{ConnectionPool, PoolStatus, PooledSession};

/// 实体引擎
///
/// 显式持有连接池和集合名解析器，可以为不同数据库各建一个实例。
/// 所有操作都独立借出会话，操作结束（包括出错）即归还
pub struct MgoEngine {
    pub(crate) pool: ConnectionPool,
    pub(crate) resolver: CollectionResolver,
    /// upsert前是否自动确保实体声明的自然键上的唯一索引
    pub(crate) ensure_upsert_index: bool,
    /// 已确保过唯一索引的 "集合/键" 组合
    pub(crate) upsert_indexes: Mutex<HashSet<String>>,
}

impl MgoEngine {
    /// 按配置建立连接池并创建引擎
    pub async fn connect(config: MgoConfig) -> MgoDbResult<Self> {
        config.validate()?;
        let pool = ConnectionPool::connect(&config.uri, config.database.as_deref(), config.pool.clone()).await?;
        let engine = Self::new(pool, CollectionResolver::new(config.naming_rule), config.ensure_upsert_index);
        info!(
            "实体引擎已就绪: database={}, naming_rule={:?}, ensure_upsert_index={}",
            engine.pool.database_name(),
            config.naming_rule,
            config.ensure_upsert_index
        );
        Ok(engine)
    }

    /// 使用已建立的连接池创建引擎
    pub fn new(pool: ConnectionPool, resolver: CollectionResolver, ensure_upsert_index: bool) -> Self {
        Self {
            pool,
            resolver,
            ensure_upsert_index,
            upsert_indexes: Mutex::new(HashSet::new()),
        }
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    pub fn resolver(&self) -> &CollectionResolver {
        &self.resolver
    }

    /// 类型对应的集合名
    pub fn collection_name<V: Resolvable + ?Sized>(&self) -> MgoDbResult<String> {
        self.resolver.resolve::<V>()
    }

    pub fn pool_status(&self) -> PoolStatus {
        self.pool.status()
    }

    /// 当前数据库名
    pub fn database_name(&self) -> &str {
        self.pool.database_name()
    }

    /// 健康检查
    pub async fn health_check(&self) -> bool {
        match self.pool.ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!("健康检查失败: {}", e);
                false
            }
        }
    }

    /// 获取服务器版本
    pub async fn server_version(&self) -> MgoDbResult<String> {
        self.pool.server_version().await
    }

    /// 删除当前数据库（仅供测试/维护使用）
    pub async fn drop_database(&self) -> MgoDbResult<()> {
        self.pool.drop_database(self.pool.database_name()).await?;
        // 索引随数据库一起消失
        self.upsert_indexes.lock().clear();
        Ok(())
    }

    /// 借出一个会话执行任意驱动操作
    ///
    /// 会话在 `f` 返回的future完成后归还，无论成功还是失败。
    /// `f` 内部的网络往返由调用者自行控制超时
    pub async fn execute<F, R>(&self, f: F) -> MgoDbResult<R>
    where
        F: for<'s> FnOnce(&'s mut PooledSession) -> BoxFuture<'s, MgoDbResult<R>>,
    {
        let mut session = self.pool.acquire().await?;
        debug!("执行自定义操作: session={}", session.id());
        let result = f(&mut session).await;
        session.release();
        result
    }

    /// 关闭引擎，之后的操作全部返回连接错误
    pub fn close(&self) {
        self.pool.close();
    }
}

impl std::fmt::Debug for MgoEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MgoEngine")
            .field("pool", &self.pool)
            .field("naming_rule", &self.resolver.rule())
            .field("ensure_upsert_index", &self.ensure_upsert_index)
            .finish()
    }
}
