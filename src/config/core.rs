//! # 配置管理模块 - 核心配置类型
//!
//! 连接地址、数据库名、连接池和集合命名规则。
//! 支持从TOML/JSON文件加载，地址可以由环境变量覆盖

use rat_logger::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{MgoDbError, MgoDbResult};
use crate::model::NamingRule;
use crate::pool::PoolConfig;

/// 约定的地址环境变量
pub const DEFAULT_URI_ENV: &str = "MONGODB";

/// 默认连接地址
pub const DEFAULT_URI: &str = "mongodb://127.0.0.1:27017/test";

fn default_true() -> bool {
    true
}

/// 数据访问层配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MgoConfig {
    /// 连接地址
    pub uri: String,
    /// 数据库名，未设置时使用地址中的默认库，再退回到 "test"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// 由类型名推导集合名的规则
    #[serde(default)]
    pub naming_rule: NamingRule,
    /// upsert前是否自动确保实体声明的自然键上的唯一索引
    #[serde(default = "default_true")]
    pub ensure_upsert_index: bool,
    /// 连接池配置
    #[serde(default)]
    pub pool: PoolConfig,
}

impl Default for MgoConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.to_string(),
            database: None,
            naming_rule: NamingRule::default(),
            ensure_upsert_index: true,
            pool: PoolConfig::default(),
        }
    }
}

impl MgoConfig {
    /// 创建配置构建器
    pub fn builder() -> super::builders::MgoConfigBuilder {
        super::builders::MgoConfigBuilder::new()
    }

    /// 从环境变量读取地址，未设置时使用 `default_uri`，其余配置取默认值
    pub fn from_env(var: &str, default_uri: &str) -> Self {
        let uri = std::env::var(var)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| default_uri.to_string());
        Self {
            uri,
            ..Self::default()
        }
    }

    /// 从文件加载配置
    ///
    /// `.toml` 按TOML解析，其余按JSON解析
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> MgoDbResult<Self> {
        let content = std::fs::read_to_string(config_path.as_ref())?;

        let config: MgoConfig = if is_toml(config_path.as_ref()) {
            toml::from_str(&content)
                .map_err(|e| crate::mgo_error!(config, format!("解析TOML配置文件失败: {}", e)))?
        } else {
            serde_json::from_str(&content)
                .map_err(|e| crate::mgo_error!(config, format!("解析JSON配置文件失败: {}", e)))?
        };
        config.validate()?;

        info!("从文件加载配置: {:?}", config_path.as_ref());
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, config_path: P) -> MgoDbResult<()> {
        let content = if is_toml(config_path.as_ref()) {
            toml::to_string_pretty(self)
                .map_err(|e| crate::mgo_error!(config, format!("序列化TOML配置失败: {}", e)))?
        } else {
            serde_json::to_string_pretty(self)
                .map_err(|e| crate::mgo_error!(config, format!("序列化JSON配置失败: {}", e)))?
        };

        std::fs::write(config_path.as_ref(), content)?;

        info!("保存配置到文件: {:?}", config_path.as_ref());
        Ok(())
    }

    /// 校验配置
    pub fn validate(&self) -> MgoDbResult<()> {
        let invalid = |message: &str| MgoDbError::ConfigError {
            message: crate::i18n::tf("error.config", &[("message", message)]),
        };

        if self.uri.trim().is_empty() {
            return Err(invalid("uri 不能为空"));
        }
        if let Some(database) = &self.database {
            if database.is_empty()
                || database
                    .chars()
                    .any(|c| matches!(c, '/' | '\\' | '.' | ' ' | '"' | '$' | '\0'))
            {
                return Err(invalid("database 名称不合法"));
            }
        }
        validate_pool(&self.pool)
    }
}

/// 校验连接池配置
pub(crate) fn validate_pool(pool: &PoolConfig) -> MgoDbResult<()> {
    let invalid = |message: &str| MgoDbError::ConfigError {
        message: crate::i18n::tf("error.config", &[("message", message)]),
    };

    if pool.max_pool_size == 0 {
        return Err(invalid("max_pool_size 必须大于0"));
    }
    if pool.min_pool_size > pool.max_pool_size {
        return Err(invalid("min_pool_size 不能大于 max_pool_size"));
    }
    if pool.socket_timeout_ms == 0 {
        return Err(invalid("socket_timeout 不能为零"));
    }
    Ok(())
}

fn is_toml(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some("toml")
}
