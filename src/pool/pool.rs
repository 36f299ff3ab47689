//! 连接池核心模块

use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use rat_logger::{debug, info, warn};
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::{PoolConfig, PooledSession, SessionLimiter};
use crate::error::{classify, MgoDbError, MgoDbResult};

/// 未指定数据库时使用的默认库名
pub const DEFAULT_DATABASE: &str = "test";

/// 连接池状态快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    /// 最大会话数
    pub max_pool_size: usize,
    /// 当前借出的会话数
    pub live_sessions: usize,
    /// 可立即借出的会话数
    pub available: usize,
}

/// 连接池
///
/// 持有一个已拨号的驱动客户端（驱动内部维护socket池），
/// 并通过会话限制器保证同时存活的会话不超过 `max_pool_size`
pub struct ConnectionPool {
    client: Client,
    database: Database,
    config: PoolConfig,
    limiter: SessionLimiter,
    next_session_id: AtomicU64,
}

impl ConnectionPool {
    /// 建立连接池
    ///
    /// 地址格式错误或无法连通时返回 `ConnectionError`
    pub async fn connect(uri: &str, database: Option<&str>, config: PoolConfig) -> MgoDbResult<Self> {
        crate::config::core::validate_pool(&config)?;

        let socket_timeout = config.socket_timeout();

        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|e| MgoDbError::ConnectionError {
                message: crate::i18n::tf("error.connection", &[("message", &e.to_string())]),
            })?;

        options.max_pool_size = Some(config.max_pool_size);
        options.min_pool_size = Some(config.min_pool_size.min(config.max_pool_size));
        options.connect_timeout = Some(socket_timeout);
        options.server_selection_timeout = Some(socket_timeout);
        if options.app_name.is_none() {
            options.app_name = Some(crate::NAME.to_string());
        }

        let database_name = database
            .map(str::to_string)
            .or_else(|| options.default_database.clone())
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        let client = Client::with_options(options).map_err(|e| MgoDbError::ConnectionError {
            message: crate::i18n::tf("error.connection", &[("message", &e.to_string())]),
        })?;

        let pool = Self {
            database: client.database(&database_name),
            client,
            limiter: SessionLimiter::new(
                config.max_pool_size as usize,
                config.acquire_policy,
                socket_timeout,
            ),
            config,
            next_session_id: AtomicU64::new(1),
        };

        // 启动时必须能连通，否则视为配置问题
        pool.ping().await.map_err(|e| MgoDbError::ConnectionError {
            message: crate::i18n::tf("error.connection", &[("message", &e.to_string())]),
        })?;

        info!(
            "连接池已建立: database={}, max_pool_size={}, socket_timeout={:?}",
            database_name, pool.config.max_pool_size, socket_timeout
        );
        Ok(pool)
    }

    /// 借出一个独立会话
    pub async fn acquire(&self) -> MgoDbResult<PooledSession> {
        let lease = self.limiter.acquire().await?;
        let session = self
            .timed("start_session", async {
                self.client
                    .start_session(None)
                    .await
                    .map_err(|e| classify(self.database.name(), e))
            })
            .await?;

        let id = self.next_session_id.fetch_add(1, Ordering::SeqCst);
        Ok(PooledSession::new(id, self.database.clone(), session, lease))
    }

    /// 以socket超时包裹一次网络往返，超时返回 `ConnectionError`
    pub async fn timed<F, R>(&self, operation: &str, fut: F) -> MgoDbResult<R>
    where
        F: Future<Output = MgoDbResult<R>>,
    {
        with_timeout(operation, self.socket_timeout(), fut).await
    }

    /// 检查后端连通性
    ///
    /// 与其他操作一样占用一个会话名额，连接池关闭后返回 `ConnectionError`
    pub async fn ping(&self) -> MgoDbResult<()> {
        let _lease = self.limiter.acquire().await?;
        self.timed("ping", async {
            self.database
                .run_command(doc! { "ping": 1 }, None)
                .await
                .map(|_| ())
                .map_err(|e| classify(self.database.name(), e))
        })
        .await
    }

    /// 获取服务器版本
    pub async fn server_version(&self) -> MgoDbResult<String> {
        let _lease = self.limiter.acquire().await?;
        let info = self
            .timed("buildInfo", async {
                self.database
                    .run_command(doc! { "buildInfo": 1 }, None)
                    .await
                    .map_err(|e| classify(self.database.name(), e))
            })
            .await?;

        info.get_str("version")
            .map(str::to_string)
            .map_err(|e| crate::mgo_error!(operation, format!("buildInfo 缺少版本号: {}", e)))
    }

    /// 删除整个数据库（仅供测试/维护使用）
    pub async fn drop_database(&self, name: &str) -> MgoDbResult<()> {
        let _lease = self.limiter.acquire().await?;
        warn!("删除数据库: {}", name);
        let database = self.client.database(name);
        self.timed("dropDatabase", async {
            database.drop(None).await.map_err(|e| classify(name, e))
        })
        .await
    }

    /// 关闭连接池，之后的借出和往返全部失败，已借出的会话不受影响
    pub fn close(&self) {
        if !self.limiter.is_closed() {
            debug!("关闭连接池: database={}", self.database.name());
            self.limiter.close();
        }
    }

    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            max_pool_size: self.limiter.max(),
            live_sessions: self.limiter.live(),
            available: self.limiter.available(),
        }
    }

    pub fn database_name(&self) -> &str {
        self.database.name()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn socket_timeout(&self) -> Duration {
        self.config.socket_timeout()
    }
}

/// 以超时包裹一次网络往返，超时返回 `ConnectionError`
pub async fn with_timeout<F, R>(operation: &str, timeout: Duration, fut: F) -> MgoDbResult<R>
where
    F: Future<Output = MgoDbResult<R>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!("{} 超时: {:?}", operation, timeout);
            Err(MgoDbError::ConnectionError {
                message: crate::i18n::tf(
                    "error.timeout",
                    &[
                        ("operation", operation),
                        ("millis", &timeout.as_millis().to_string()),
                    ],
                ),
            })
        }
    }
}

impl Drop for ConnectionPool {
    fn drop(&mut self) {
        self.close();
        debug!("连接池已释放: database={}", self.database.name());
    }
}

impl std::fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("database", &self.database.name())
            .field("config", &self.config)
            .field("status", &self.status())
            .finish()
    }
}
