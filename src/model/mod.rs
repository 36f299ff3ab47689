//! 实体模型模块
//!
//! 实体只需要能序列化为文档；集合名由显式命名能力或类型名决定

pub mod macros;
pub mod resolver;
pub mod traits;

pub use resolver::{derive_collection_name, validate_collection_name, CollectionResolver, NamingRule};
pub use traits::{Entity, Resolvable};
