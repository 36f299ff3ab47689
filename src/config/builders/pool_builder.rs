//! # 连接池配置构建器模块
//!
//! 提供连接池配置的构建器实现，支持链式调用和严格验证

use rat_logger::info;
use std::time::Duration;

use crate::error::MgoDbError;
use crate::pool::{AcquirePolicy, PoolConfig};

/// 连接池配置构建器
///
/// 最大会话数和socket超时必须显式设置
#[derive(Debug, Default)]
pub struct PoolConfigBuilder {
    max_pool_size: Option<u32>,
    min_pool_size: Option<u32>,
    socket_timeout: Option<Duration>,
    acquire_policy: Option<AcquirePolicy>,
}

impl PoolConfigBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置最大会话数
    ///
    /// # 参数
    ///
    /// * `max_pool_size` - 同时存活的最大会话数
    pub fn max_pool_size(mut self, max_pool_size: u32) -> Self {
        self.max_pool_size = Some(max_pool_size);
        self
    }

    /// 设置驱动保持的最小连接数
    pub fn min_pool_size(mut self, min_pool_size: u32) -> Self {
        self.min_pool_size = Some(min_pool_size);
        self
    }

    /// 设置socket超时
    ///
    /// # 参数
    ///
    /// * `timeout` - 获取会话和每次网络往返的超时
    pub fn socket_timeout(mut self, timeout: Duration) -> Self {
        self.socket_timeout = Some(timeout);
        self
    }

    /// 设置连接池已满时的获取策略
    pub fn acquire_policy(mut self, policy: AcquirePolicy) -> Self {
        self.acquire_policy = Some(policy);
        self
    }

    /// 构建连接池配置
    ///
    /// # 错误
    ///
    /// 必需项未设置或取值不合理时返回 `ConfigError`
    pub fn build(self) -> Result<PoolConfig, MgoDbError> {
        let max_pool_size = self
            .max_pool_size
            .ok_or_else(|| crate::mgo_error!(config, "最大会话数必须设置"))?;

        let socket_timeout = self
            .socket_timeout
            .ok_or_else(|| crate::mgo_error!(config, "socket超时必须设置"))?;

        let socket_timeout_ms = u64::try_from(socket_timeout.as_millis())
            .map_err(|_| crate::mgo_error!(config, "socket超时过大"))?;

        let config = PoolConfig {
            max_pool_size,
            min_pool_size: self.min_pool_size.unwrap_or(0),
            socket_timeout_ms,
            acquire_policy: self.acquire_policy.unwrap_or_default(),
        };
        crate::config::core::validate_pool(&config)?;

        info!(
            "创建连接池配置: 最大会话数={}, socket超时={}ms, 策略={:?}",
            config.max_pool_size, config.socket_timeout_ms, config.acquire_policy
        );
        Ok(config)
    }
}
