//! 数据库适配器模块

pub mod mongodb;
