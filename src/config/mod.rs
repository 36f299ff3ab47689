//! # 配置管理模块
//!
//! 所有配置都可以用构建器显式创建，也可以从文件或环境变量加载

pub mod builders;
pub mod core;

pub use builders::{MgoConfigBuilder, PoolConfigBuilder};
pub use self::core::{DEFAULT_URI, DEFAULT_URI_ENV, MgoConfig};
pub use crate::pool::{AcquirePolicy, PoolConfig};
