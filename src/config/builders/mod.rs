//! # 配置构建器模块

pub mod mgo_builder;
pub mod pool_builder;

pub use mgo_builder::MgoConfigBuilder;
pub use pool_builder::PoolConfigBuilder;
