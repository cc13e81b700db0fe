//! Transport trait and the pooled HTTP implementation.

use super::pool::ClientPool;
use crate::errors::FlowlineError;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

/// The remote-call surface the signing stages depend on.
///
/// Bodies are returned as raw bytes; decoding belongs to the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a JSON body via POST and returns the response body.
    async fn post_json(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        body: &serde_json::Value,
    ) -> Result<Vec<u8>, FlowlineError>;

    /// Sends a GET with query parameters and returns the response body.
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<Vec<u8>, FlowlineError>;
}

/// Production [`Transport`] over a bounded [`ClientPool`].
#[derive(Debug)]
pub struct HttpTransport {
    pool: ClientPool,
}

impl HttpTransport {
    /// Creates a transport over an existing pool.
    #[must_use]
    pub fn new(pool: ClientPool) -> Self {
        Self { pool }
    }

    /// Creates a transport over a default-sized pool.
    pub fn with_defaults() -> Result<Self, FlowlineError> {
        Ok(Self::new(ClientPool::with_defaults()?))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        body: &serde_json::Value,
    ) -> Result<Vec<u8>, FlowlineError> {
        let client = self.pool.acquire().await?;

        let mut request = client.post(url).json(body);
        for (name, value) in headers {
            request = request.header(name, value);
        }

        debug!(url, "sending submit request");
        let response = request.send().await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<Vec<u8>, FlowlineError> {
        let client = self.pool.acquire().await?;

        let mut request = client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }

        debug!(url, "sending status request");
        let response = request.send().await?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_defaults_builds() {
        let transport = HttpTransport::with_defaults().expect("build transport");
        assert_eq!(transport.pool.available(), super::super::DEFAULT_POOL_SIZE);
    }
}
