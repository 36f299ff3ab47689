//! 连接池配置模块

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 连接池已满时的获取策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcquirePolicy {
    /// 等待空闲会话，最长等待一个socket超时
    #[default]
    Block,
    /// 立即返回 `PoolExhausted`
    FailFast,
}

/// 连接池配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// 同时存活的最大会话数，同时也是驱动连接池的上限
    pub max_pool_size: u32,
    /// 驱动保持的最小连接数
    #[serde(default)]
    pub min_pool_size: u32,
    /// socket超时（毫秒），适用于获取会话和每次网络往返
    pub socket_timeout_ms: u64,
    /// 获取策略
    #[serde(default)]
    pub acquire_policy: AcquirePolicy,
}

impl PoolConfig {
    /// 创建连接池配置构建器
    pub fn builder() -> crate::config::PoolConfigBuilder {
        crate::config::PoolConfigBuilder::new()
    }

    /// socket超时
    pub fn socket_timeout(&self) -> Duration {
        Duration::from_millis(self.socket_timeout_ms)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_pool_size: 128,
            min_pool_size: 0,
            socket_timeout_ms: 30_000,
            acquire_policy: AcquirePolicy::Block,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_defaults_to_block() {
        assert_eq!(AcquirePolicy::default(), AcquirePolicy::Block);
        assert_eq!(PoolConfig::default().acquire_policy, AcquirePolicy::Block);
    }

    #[test]
    fn missing_policy_deserializes_as_block() {
        let config: PoolConfig = serde_json::from_str(r#"{ "max_pool_size": 8, "socket_timeout_ms": 500 }"#).unwrap();
        assert_eq!(config.acquire_policy, AcquirePolicy::Block);
        assert_eq!(config.min_pool_size, 0);
        assert_eq!(config.socket_timeout(), Duration::from_millis(500));
    }
}
