//! 连接池模块
//!
//! 一个已拨号的客户端 + 有上限的会话借出/归还：
//! 每个并发调用者拿到自己的会话，避免命令在同一会话上交错

pub mod config;
pub mod limiter;
pub mod session;
pub mod pool;

pub use config::{AcquirePolicy, PoolConfig};
pub use limiter::{SessionLease, SessionLimiter};
pub use session::PooledSession;
pub use pool::{ConnectionPool, PoolStatus, DEFAULT_DATABASE};
