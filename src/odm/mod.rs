//! # 实体引擎模块
//!
//! 按职责分离的细粒度模块组织：
//! - manager_core: 引擎本体、会话借出和自定义操作
//! - handlers: 各类CRUD与聚合操作
//! - batch: 异构批量插入
//! - global: 进程级引擎槽位和便捷函数

pub mod batch;
pub mod global;
pub mod handlers;
pub mod manager_core;

pub use batch::InsertBatch;
pub use global::*;
pub use handlers::UpsertOutcome;
pub use manager_core::MgoEngine;
