//! Bounded pool of reusable HTTP clients.

use crate::errors::FlowlineError;
use parking_lot::Mutex;
use std::ops::Deref;
use std::time::Duration;
use tokio::sync::{Semaphore, SemaphorePermit};

/// Default number of pooled clients.
pub const DEFAULT_POOL_SIZE: usize = 10;

/// Default per-request timeout for pooled clients.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A bounded pool of `reqwest` clients, safe for concurrent borrow and return
/// across all stage workers.
///
/// `acquire` waits for a permit, so at most `size` borrowers exist at once;
/// the returned guard puts the client back on every exit path.
pub struct ClientPool {
    /// Idle clients ready to borrow.
    clients: Mutex<Vec<reqwest::Client>>,
    /// Bounds the number of simultaneous borrowers.
    permits: Semaphore,
    /// Handed out if the idle list is unexpectedly empty under a permit.
    fallback: reqwest::Client,
}

impl ClientPool {
    /// Builds a pool of `size` clients with the given request timeout.
    ///
    /// Connections are not kept alive between requests, matching the signing
    /// service's expectation of short-lived connections.
    pub fn new(size: usize, request_timeout: Duration) -> Result<Self, FlowlineError> {
        let build = || {
            reqwest::Client::builder()
                .timeout(request_timeout)
                .pool_max_idle_per_host(0)
                .build()
                .map_err(FlowlineError::from)
        };

        let mut clients = Vec::with_capacity(size);
        for _ in 0..size {
            clients.push(build()?);
        }

        Ok(Self {
            clients: Mutex::new(clients),
            permits: Semaphore::new(size),
            fallback: build()?,
        })
    }

    /// Builds a pool with the default size and timeout.
    pub fn with_defaults() -> Result<Self, FlowlineError> {
        Self::new(DEFAULT_POOL_SIZE, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Borrows a client, waiting until one is free.
    pub async fn acquire(&self) -> Result<PooledClient<'_>, FlowlineError> {
        let permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| FlowlineError::Internal("client pool semaphore closed".to_string()))?;
        let client = self.clients.lock().pop();
        Ok(PooledClient {
            client,
            pool: self,
            _permit: permit,
        })
    }

    /// Number of clients currently available to borrow.
    #[must_use]
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

impl std::fmt::Debug for ClientPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientPool")
            .field("available", &self.available())
            .finish()
    }
}

/// A borrowed client; returns itself to the pool on drop.
pub struct PooledClient<'a> {
    client: Option<reqwest::Client>,
    pool: &'a ClientPool,
    _permit: SemaphorePermit<'a>,
}

impl Deref for PooledClient<'_> {
    type Target = reqwest::Client;

    fn deref(&self) -> &Self::Target {
        self.client.as_ref().unwrap_or(&self.pool.fallback)
    }
}

impl Drop for PooledClient<'_> {
    fn drop(&mut self) {
        if let Some(client) = self.client.take() {
            self.pool.clients.lock().push(client);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pool_bounds_concurrent_borrowers() {
        let pool = ClientPool::new(2, DEFAULT_REQUEST_TIMEOUT).expect("build pool");

        let first = pool.acquire().await.expect("first borrow");
        let second = pool.acquire().await.expect("second borrow");
        assert_eq!(pool.available(), 0);

        // A third borrower must wait for a permit.
        let blocked = tokio::time::timeout(Duration::from_millis(50), pool.acquire()).await;
        assert!(blocked.is_err());

        drop(first);
        let third = pool
            .acquire()
            .await
            .expect("borrow after a guard was dropped");
        drop(second);
        drop(third);
        assert_eq!(pool.available(), 2);
    }

    #[tokio::test]
    async fn test_guard_returns_client_to_pool() {
        let pool = ClientPool::new(1, DEFAULT_REQUEST_TIMEOUT).expect("build pool");

        {
            let borrowed = pool.acquire().await.expect("borrow");
            // Deref must yield a usable client while borrowed.
            let _: &reqwest::Client = &borrowed;
            assert_eq!(pool.available(), 0);
        }

        assert_eq!(pool.available(), 1);
        assert_eq!(pool.clients.lock().len(), 1);
    }
}
