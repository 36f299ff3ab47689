//! 池化会话
//!
//! 每次操作借出一个独立的驱动会话，作用域结束时自动归还

use mongodb::bson::Document;
use mongodb::{ClientSession, Collection, Database};
use rat_logger::debug;
use std::time::{Duration, Instant};

use super::limiter::SessionLease;

/// 池化会话
///
/// 持有一个会话名额和一个独立的驱动逻辑会话，两个并发操作永远不会共享同一个会话。
/// 丢弃即释放，可以在任意线程上释放
pub struct PooledSession {
    id: u64,
    database: Database,
    session: ClientSession,
    acquired_at: Instant,
    _lease: SessionLease,
}

impl PooledSession {
    pub(crate) fn new(id: u64, database: Database, session: ClientSession, lease: SessionLease) -> Self {
        debug!("借出会话: id={}, database={}", id, database.name());
        Self {
            id,
            database,
            session,
            acquired_at: Instant::now(),
            _lease: lease,
        }
    }

    /// 会话编号
    pub fn id(&self) -> u64 {
        self.id
    }

    /// 当前数据库
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// 获取集合句柄
    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.database.collection(name)
    }

    /// 获取原始文档集合句柄
    pub fn documents(&self, name: &str) -> Collection<Document> {
        self.database.collection(name)
    }

    /// 驱动会话，用于 `*_with_session` 系列操作
    pub fn client_session(&mut self) -> &mut ClientSession {
        &mut self.session
    }

    /// 同时借出集合句柄和驱动会话
    pub fn split(&mut self, name: &str) -> (Collection<Document>, &mut ClientSession) {
        (self.database.collection(name), &mut self.session)
    }

    /// 已借出时长
    pub fn held_for(&self) -> Duration {
        self.acquired_at.elapsed()
    }

    /// 显式归还会话
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for PooledSession {
    fn drop(&mut self) {
        debug!("归还会话: id={}, 持有时长={:?}", self.id, self.acquired_at.elapsed());
    }
}

impl std::fmt::Debug for PooledSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledSession")
            .field("id", &self.id)
            .field("database", &self.database.name())
            .field("acquired_at", &self.acquired_at)
            .finish()
    }
}
