//! Bounded connection pool
//!
//! Pools connections from any [`Connect`] backend; the MySQL deployment uses
//! sqlx's own pool instead (see `mysql.rs`). At most `capacity` connections
//! are checked out at once. Waiters queue on a fair semaphore with no bound
//! on queue length; a waiter that is dropped (request abandoned) leaves the
//! queue without taking a slot. A checked-out connection is a
//! [`PooledConnection`] guard that goes back to the idle set when it is
//! dropped, on every exit path.
//!
//! An idle connection is pinged before it is handed out again, and dropped
//! if it has sat idle longer than the idle timeout. The acquire timeout
//! bounds the whole checkout: slot wait, pings and connect.

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

use super::{error_kind, Bound, Connect, Connection, Datastore, Row, WriteResult};
use crate::error::DataAccessError;

/// Default capacity, matching the legacy deployment.
pub const DEFAULT_POOL_SIZE: usize = 10;

/// Default wait for a usable connection.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default idle time after which a connection is closed rather than reused.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// Point-in-time pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub capacity: usize,
    pub in_use: usize,
    pub idle: usize,
}

struct Idle<T> {
    conn: T,
    since: Instant,
}

struct PoolInner<C: Connect> {
    connector: C,
    idle: Mutex<Vec<Idle<C::Conn>>>,
    slots: Arc<Semaphore>,
    capacity: usize,
    acquire_timeout: Duration,
    idle_timeout: Duration,
}

impl<C: Connect> PoolInner<C> {
    fn idle(&self) -> std::sync::MutexGuard<'_, Vec<Idle<C::Conn>>> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Most recently used idle connection that is not past the idle timeout.
    /// Stale ones found on the way are dropped.
    fn pop_fresh(&self) -> Option<C::Conn> {
        let mut idle = self.idle();
        while let Some(entry) = idle.pop() {
            if entry.since.elapsed() < self.idle_timeout {
                return Some(entry.conn);
            }
            tracing::debug!("[db] [idle_expired]");
        }
        None
    }

    async fn checkout(&self) -> Result<C::Conn, DataAccessError> {
        while let Some(mut conn) = self.pop_fresh() {
            match conn.ping().await {
                Ok(()) => return Ok(conn),
                Err(e) => tracing::debug!("[db] [dead_idle] kind={}", error_kind(&e)),
            }
        }

        self.connector.connect().await.map_err(|e| {
            tracing::error!("[db] [connect_failed] kind={}", error_kind(&e));
            DataAccessError::Connect
        })
    }
}

pub struct ConnectionPool<C: Connect> {
    inner: Arc<PoolInner<C>>,
}

impl<C: Connect> Clone for ConnectionPool<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Connect> ConnectionPool<C> {
    /// Connections are opened lazily on first checkout. `capacity` is
    /// clamped to at least one.
    pub fn new(connector: C, capacity: usize, acquire_timeout: Duration) -> Self {
        Self::with_idle_timeout(connector, capacity, acquire_timeout, DEFAULT_IDLE_TIMEOUT)
    }

    pub fn with_idle_timeout(
        connector: C,
        capacity: usize,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Self {
        let capacity = capacity.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            inner: Arc::new(PoolInner {
                connector,
                idle: Mutex::new(Vec::new()),
                slots: Arc::new(Semaphore::new(capacity)),
                capacity,
                acquire_timeout,
                idle_timeout,
            }),
        }
    }

    pub fn with_defaults(connector: C) -> Self {
        Self::new(connector, DEFAULT_POOL_SIZE, DEFAULT_ACQUIRE_TIMEOUT)
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            capacity: self.inner.capacity,
            in_use: self.inner.capacity - self.inner.slots.available_permits(),
            idle: self.inner.idle().len(),
        }
    }

    /// Wait for a slot, then hand out a live idle connection or open a new one.
    pub async fn acquire(&self) -> Result<PooledConnection<C>, DataAccessError> {
        let deadline = Instant::now() + self.inner.acquire_timeout;

        let wait = Arc::clone(&self.inner.slots).acquire_owned();
        let slot = match tokio::time::timeout_at(deadline, wait).await {
            Ok(Ok(slot)) => slot,
            Ok(Err(_)) => return Err(DataAccessError::PoolClosed),
            Err(_) => return Err(self.timed_out("slot")),
        };

        // The slot is released if the checkout fails or times out.
        let conn = match tokio::time::timeout_at(deadline, self.inner.checkout()).await {
            Ok(conn) => conn?,
            Err(_) => return Err(self.timed_out("connect")),
        };

        Ok(PooledConnection {
            conn: Some(conn),
            inner: Arc::clone(&self.inner),
            _slot: slot,
        })
    }

    fn timed_out(&self, stage: &str) -> DataAccessError {
        tracing::warn!(
            "[db] [acquire_timeout] stage={} capacity={} waited_ms={}",
            stage,
            self.inner.capacity,
            self.inner.acquire_timeout.as_millis()
        );
        DataAccessError::AcquireTimeout
    }

    /// Stop handing out connections. Waiters fail with `PoolClosed`;
    /// idle connections are dropped, checked-out ones when they come back.
    pub fn close(&self) {
        self.inner.slots.close();
        self.inner.idle().clear();
        tracing::info!("[db] [pool_closed]");
    }
}

impl<C: Connect> Datastore for ConnectionPool<C> {
    type Conn = PooledConnection<C>;

    async fn acquire(&self) -> Result<PooledConnection<C>, DataAccessError> {
        ConnectionPool::acquire(self).await
    }

    fn discard(conn: PooledConnection<C>) {
        conn.discard();
    }

    fn status(&self) -> PoolStatus {
        ConnectionPool::status(self)
    }

    async fn close(&self) {
        ConnectionPool::close(self);
    }
}

/// A checked-out connection. Dropping it releases the slot.
pub struct PooledConnection<C: Connect> {
    conn: Option<C::Conn>,
    inner: Arc<PoolInner<C>>,
    // Declared last so the slot is freed after the connection is back in `idle`.
    _slot: OwnedSemaphorePermit,
}

impl<C: Connect> PooledConnection<C> {
    /// Return the connection to the pool. Same as dropping the guard.
    pub fn release(self) {}

    /// Close the connection instead of returning it; the slot is still freed.
    pub fn discard(mut self) {
        self.conn = None;
    }
}

impl<C: Connect> Deref for PooledConnection<C> {
    type Target = C::Conn;

    fn deref(&self) -> &C::Conn {
        // Only `discard` and `drop` take the connection, and both consume the guard.
        self.conn.as_ref().expect("pooled connection already taken")
    }
}

impl<C: Connect> DerefMut for PooledConnection<C> {
    fn deref_mut(&mut self) -> &mut C::Conn {
        self.conn.as_mut().expect("pooled connection already taken")
    }
}

impl<C: Connect> Connection for PooledConnection<C> {
    async fn fetch_all(&mut self, sql: &str, params: &[Bound]) -> Result<Vec<Row>, sqlx::Error> {
        self.deref_mut().fetch_all(sql, params).await
    }

    async fn execute(&mut self, sql: &str, params: &[Bound]) -> Result<WriteResult, sqlx::Error> {
        self.deref_mut().execute(sql, params).await
    }

    async fn ping(&mut self) -> Result<(), sqlx::Error> {
        self.deref_mut().ping().await
    }
}

impl<C: Connect> Drop for PooledConnection<C> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if !self.inner.slots.is_closed() {
                self.inner.idle().push(Idle {
                    conn,
                    since: Instant::now(),
                });
            }
        }
    }
}
