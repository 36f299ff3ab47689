//! # 请求处理器模块
//!
//! 每个处理器文件为 `MgoEngine` 实现一类操作

pub mod aggregate_handler;
pub mod create_handler;
pub mod delete_handler;
pub mod read_handler;
pub mod update_handler;

pub use update_handler::UpsertOutcome;
