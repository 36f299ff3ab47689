//! 公共类型定义
//!
//! 排序、分页和连接串构建等通用类型

pub mod query;
pub mod mongo_builder;

// 重新导出所有公共类型
pub use query::{SortConfig, SortDirection, PaginationConfig, QueryOptions, parse_sort_fields, build_sort_document};
pub use mongo_builder::MongoDbConnectionBuilder;
