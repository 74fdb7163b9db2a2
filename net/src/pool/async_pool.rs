use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::sync::Notify;

use vexdb_core::error::{Error, PoolError};

use crate::config::ConnectOptions;
use crate::session::AsyncSession;

struct Inner {
    idle: Vec<AsyncSession>,
    total: usize,
}

/// The task-safe counterpart of [`super::SyncPool`]. Bookkeeping
/// (`idle`/`total`) sits behind a plain `std::sync::Mutex` — every
/// critical section here is a quick `Vec` push/pop with no `.await`
/// inside it — while [`tokio::sync::Notify`] provides the async wait a
/// blocked `acquire` suspends on.
pub struct AsyncPool {
    opts: ConnectOptions,
    inner: Mutex<Inner>,
    released: Notify,
}

impl AsyncPool {
    pub async fn new(opts: ConnectOptions) -> Result<Self, Error> {
        let min_size = opts.pool_min_size;
        let mut idle = Vec::with_capacity(min_size);
        for _ in 0..min_size {
            idle.push(AsyncSession::connect(opts.clone()).await?);
        }
        Ok(AsyncPool {
            inner: Mutex::new(Inner { total: min_size, idle }),
            released: Notify::new(),
            opts,
        })
    }

    pub async fn acquire(&self) -> Result<PooledSession<'_>, Error> {
        let deadline = Instant::now() + self.opts.pool_acquire_timeout;
        loop {
            {
                let mut guard = self.inner.lock().expect("pool mutex poisoned");
                if let Some(session) = guard.idle.pop() {
                    drop(guard);
                    let mut session = session;
                    if self.opts.check_on_acquire && session.ping().await.is_err() {
                        session = AsyncSession::connect(self.opts.clone()).await?;
                    }
                    return Ok(PooledSession { session: Some(session), pool: self });
                }
                if guard.total < self.opts.pool_max_size {
                    guard.total += 1;
                    drop(guard);
                    return match AsyncSession::connect(self.opts.clone()).await {
                        Ok(session) => Ok(PooledSession { session: Some(session), pool: self }),
                        Err(e) => {
                            self.inner.lock().expect("pool mutex poisoned").total -= 1;
                            Err(e)
                        }
                    };
                }
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(PoolError::Exhausted(self.opts.pool_acquire_timeout).into());
            }
            if tokio::time::timeout(remaining, self.released.notified()).await.is_err() {
                return Err(PoolError::Exhausted(self.opts.pool_acquire_timeout).into());
            }
        }
    }

    fn release(&self, session: AsyncSession) {
        self.inner.lock().expect("pool mutex poisoned").idle.push(session);
        self.released.notify_one();
    }

    fn discard(&self) {
        self.inner.lock().expect("pool mutex poisoned").total -= 1;
        self.released.notify_one();
    }
}

pub struct PooledSession<'p> {
    session: Option<AsyncSession>,
    pool: &'p AsyncPool,
}

impl std::ops::Deref for PooledSession<'_> {
    type Target = AsyncSession;
    fn deref(&self) -> &AsyncSession {
        self.session.as_ref().expect("session taken")
    }
}

impl std::ops::DerefMut for PooledSession<'_> {
    fn deref_mut(&mut self) -> &mut AsyncSession {
        self.session.as_mut().expect("session taken")
    }
}

impl PooledSession<'_> {
    /// Discard this session instead of returning it to the idle set.
    pub fn close(mut self) {
        self.session.take();
        self.pool.discard();
    }
}

impl Drop for PooledSession<'_> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            self.pool.release(session);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn exhausted_pool_reports_pool_error_within_timeout() {
        let mut opts = ConnectOptions::new("127.0.0.1", 1).pool_size(0, 0);
        opts.pool_acquire_timeout = Duration::from_millis(50);
        let pool = AsyncPool { opts: opts.clone(), inner: Mutex::new(Inner { idle: Vec::new(), total: 0 }), released: Notify::new() };
        let start = std::time::Instant::now();
        let result = pool.acquire().await;
        assert!(result.is_err());
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
