//! MongoDB适配器模块
//!
//! - utils.rs: 实体与BSON文档转换、过滤条件检查
//! - schema.rs: 索引管理

pub mod schema;
pub mod utils;
