//! 会话数量限制器
//!
//! 用信号量记录存活会话数，保证并发获取/释放不会突破 `max_pool_size`

use rat_logger::debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

use super::AcquirePolicy;
use crate::error::{MgoDbError, MgoDbResult};

/// 会话限制器
#[derive(Debug)]
pub struct SessionLimiter {
    semaphore: Arc<Semaphore>,
    live: Arc<AtomicUsize>,
    max: usize,
    policy: AcquirePolicy,
    acquire_timeout: Duration,
}

/// 一个会话名额，丢弃时归还
#[derive(Debug)]
pub struct SessionLease {
    _permit: OwnedSemaphorePermit,
    live: Arc<AtomicUsize>,
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        let remaining = self.live.fetch_sub(1, Ordering::SeqCst) - 1;
        crate::debug_log!("归还会话名额，当前存活会话数: {}", remaining);
    }
}

impl SessionLimiter {
    pub fn new(max: usize, policy: AcquirePolicy, acquire_timeout: Duration) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max)),
            live: Arc::new(AtomicUsize::new(0)),
            max,
            policy,
            acquire_timeout,
        }
    }

    /// 获取一个会话名额
    pub async fn acquire(&self) -> MgoDbResult<SessionLease> {
        let permit = match self.policy {
            AcquirePolicy::FailFast => match self.semaphore.clone().try_acquire_owned() {
                Ok(permit) => permit,
                Err(TryAcquireError::NoPermits) => {
                    return Err(MgoDbError::PoolExhausted {
                        max_pool_size: self.max,
                    });
                }
                Err(TryAcquireError::Closed) => return Err(Self::closed_error()),
            },
            AcquirePolicy::Block => {
                let waiting = self.semaphore.clone().acquire_owned();
                match tokio::time::timeout(self.acquire_timeout, waiting).await {
                    Ok(Ok(permit)) => permit,
                    Ok(Err(_)) => return Err(Self::closed_error()),
                    Err(_) => {
                        return Err(MgoDbError::ConnectionError {
                            message: crate::i18n::tf(
                                "error.timeout",
                                &[
                                    ("operation", "acquire"),
                                    ("millis", &self.acquire_timeout.as_millis().to_string()),
                                ],
                            ),
                        });
                    }
                }
            }
        };

        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(SessionLease {
            _permit: permit,
            live: self.live.clone(),
        })
    }

    /// 关闭限制器，之后的获取全部失败
    pub fn close(&self) {
        debug!("关闭会话限制器: 存活会话数={}", self.live());
        self.semaphore.close();
    }

    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }

    /// 当前存活会话数
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn max(&self) -> usize {
        self.max
    }

    fn closed_error() -> MgoDbError {
        MgoDbError::ConnectionError {
            message: crate::i18n::t("error.pool_closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn fail_fast_reports_exhaustion() {
        let limiter = SessionLimiter::new(2, AcquirePolicy::FailFast, Duration::from_millis(50));
        let a = assert_ok!(limiter.acquire().await);
        let _b = assert_ok!(limiter.acquire().await);
        assert_eq!(limiter.live(), 2);

        let err = assert_err!(limiter.acquire().await);
        assert!(matches!(err, MgoDbError::PoolExhausted { max_pool_size: 2 }));

        drop(a);
        assert_eq!(limiter.live(), 1);
        assert_ok!(limiter.acquire().await);
    }

    #[tokio::test]
    async fn blocking_acquire_times_out_as_connection_error() {
        let limiter = SessionLimiter::new(1, AcquirePolicy::Block, Duration::from_millis(30));
        let _held = assert_ok!(limiter.acquire().await);
        let err = assert_err!(limiter.acquire().await);
        assert!(matches!(err, MgoDbError::ConnectionError { .. }));
    }

    #[tokio::test]
    async fn blocking_acquire_waits_for_release() {
        let limiter = Arc::new(SessionLimiter::new(1, AcquirePolicy::Block, Duration::from_secs(5)));
        let held = assert_ok!(limiter.acquire().await);

        let waiter = {
            let limiter = limiter.clone();
            tokio::spawn(async move { limiter.acquire().await.map(|_| ()) })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(held);

        assert_ok!(waiter.await.unwrap());
        assert_eq!(limiter.live(), 0);
    }

    #[tokio::test]
    async fn release_from_another_task() {
        let limiter = SessionLimiter::new(1, AcquirePolicy::FailFast, Duration::from_millis(10));
        let lease = assert_ok!(limiter.acquire().await);
        tokio::spawn(async move { drop(lease) }).await.unwrap();
        assert_eq!(limiter.live(), 0);
        assert_eq!(limiter.available(), 1);
    }

    #[tokio::test]
    async fn closed_limiter_rejects() {
        let limiter = SessionLimiter::new(3, AcquirePolicy::Block, Duration::from_millis(10));
        limiter.close();
        assert!(limiter.is_closed());
        let err = assert_err!(limiter.acquire().await);
        assert!(matches!(err, MgoDbError::ConnectionError { .. }));
    }

    #[tokio::test]
    async fn concurrent_leases_never_exceed_max() {
        let limiter = Arc::new(SessionLimiter::new(4, AcquirePolicy::Block, Duration::from_secs(5)));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..32 {
            let limiter = limiter.clone();
            let peak = peak.clone();
            handles.push(tokio::spawn(async move {
                let _lease = limiter.acquire().await.unwrap();
                peak.fetch_max(limiter.live(), Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 4);
        assert_eq!(limiter.live(), 0);
        assert_eq!(limiter.available(), 4);
    }
}
