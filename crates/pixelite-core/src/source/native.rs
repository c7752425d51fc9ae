//! Native I/O for the resolver: HTTP through `reqwest`, files through `tokio::fs`.

use std::io;

use super::{ByteLoader, FetchError};

/// [`ByteLoader`] backed by a `reqwest` client and the local filesystem.
///
/// Cloning is cheap; clones share the client's connection pool.
#[derive(Debug, Clone, Default)]
pub struct NativeLoader {
    client: reqwest::Client,
}

impl NativeLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client (proxies, timeouts, user agent, ...).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl ByteLoader for NativeLoader {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let body = response.bytes().await.map_err(FetchError::transport)?;
        Ok(body.to_vec())
    }

    async fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }
}
