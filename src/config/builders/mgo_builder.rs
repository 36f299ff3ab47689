//! # 数据访问层配置构建器模块

use rat_logger::info;

use crate::config::MgoConfig;
use crate::error::MgoDbError;
use crate::model::NamingRule;
use crate::pool::PoolConfig;
use crate::types::MongoDbConnectionBuilder;

/// 数据访问层配置构建器
///
/// 地址和连接池配置必须显式设置
#[derive(Debug, Default)]
pub struct MgoConfigBuilder {
    uri: Option<String>,
    database: Option<String>,
    pool: Option<PoolConfig>,
    naming_rule: Option<NamingRule>,
    ensure_upsert_index: Option<bool>,
}

impl MgoConfigBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置连接地址
    pub fn uri<S: Into<String>>(mut self, uri: S) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// 由连接参数生成地址，数据库名同时作为显式库名
    pub fn connection(mut self, connection: &MongoDbConnectionBuilder) -> Self {
        self.uri = Some(connection.build_uri());
        if self.database.is_none() {
            self.database = Some(connection.database().to_string());
        }
        self
    }

    /// 设置数据库名，优先于地址中的默认库
    pub fn database<S: Into<String>>(mut self, database: S) -> Self {
        self.database = Some(database.into());
        self
    }

    /// 设置连接池配置
    pub fn pool(mut self, pool: PoolConfig) -> Self {
        self.pool = Some(pool);
        self
    }

    /// 设置集合命名规则
    pub fn naming_rule(mut self, rule: NamingRule) -> Self {
        self.naming_rule = Some(rule);
        self
    }

    /// 设置upsert前是否自动确保唯一索引
    pub fn ensure_upsert_index(mut self, enabled: bool) -> Self {
        self.ensure_upsert_index = Some(enabled);
        self
    }

    /// 构建配置
    ///
    /// # 错误
    ///
    /// 必需项未设置或取值不合理时返回 `ConfigError`
    pub fn build(self) -> Result<MgoConfig, MgoDbError> {
        let uri = self
            .uri
            .ok_or_else(|| crate::mgo_error!(config, "连接地址必须设置"))?;

        let pool = self
            .pool
            .ok_or_else(|| crate::mgo_error!(config, "连接池配置必须设置"))?;

        let config = MgoConfig {
            uri,
            database: self.database,
            naming_rule: self.naming_rule.unwrap_or_default(),
            ensure_upsert_index: self.ensure_upsert_index.unwrap_or(true),
            pool,
        };
        config.validate()?;

        info!(
            "创建数据访问层配置: database={:?}, naming_rule={:?}",
            config.database, config.naming_rule
        );
        Ok(config)
    }
}
