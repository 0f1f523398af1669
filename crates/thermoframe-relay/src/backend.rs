//! Backend collaborator seam.
//!
//! When a forward URL is configured, every exchange makes one synchronous
//! round trip to the real cloud endpoint: the re-sealed frame goes out as a
//! POST body, the raw ciphertext of the reply comes back. The trait keeps
//! the pipeline independent of the HTTP client so tests can script the
//! backend.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::RelayError;

/// What the backend answered: its HTTP status and raw body bytes.
///
/// A success body is bare ciphertext with no frame header, sealed under the
/// same keys and IV as the request that produced it.
#[derive(Debug, Clone)]
pub struct BackendReply {
    /// HTTP status code of the backend response
    pub status: u16,
    /// Raw response body
    pub body: Bytes,
}

/// One request/response round trip to the cloud endpoint.
#[async_trait]
pub trait Backend: Send + Sync {
    /// POST a complete wire frame and collect the reply.
    ///
    /// # Errors
    ///
    /// - `BackendUnreachable` if the round trip fails at the transport level
    async fn forward(&self, frame: Vec<u8>) -> Result<BackendReply, RelayError>;
}

/// Production backend speaking plain HTTP via reqwest.
///
/// No request timeout is set: the device-side exchange blocks on the cloud
/// endpoint for as long as it takes, and the device applies its own retry
/// cadence above this layer.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    url: String,
}

impl HttpBackend {
    /// Create a backend client for the given forward URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), url: url.into() }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn forward(&self, frame: Vec<u8>) -> Result<BackendReply, RelayError> {
        let response = self
            .client
            .post(&self.url)
            .body(frame)
            .send()
            .await
            .map_err(|err| RelayError::BackendUnreachable { reason: err.to_string() })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|err| RelayError::BackendUnreachable { reason: err.to_string() })?;

        Ok(BackendReply { status, body })
    }
}
