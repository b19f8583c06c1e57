//! HTTP transport seam used by adapters.
//!
//! Adapters never talk to `reqwest` directly: they issue GET requests through an
//! [`HttpTransport`] and read the response body chunk by chunk. The response owns the
//! underlying connection, so dropping it on any path (success, error, or a caller that
//! stops awaiting) releases the transport resource.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Url};
use thiserror::Error;

/// Errors raised by a transport while sending a request or reading its body.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// A response body read incrementally.
#[async_trait]
pub trait ResponseBody: Send {
    /// Returns the next chunk, or `None` once the body is exhausted.
    async fn chunk(&mut self) -> Result<Option<Bytes>, TransportError>;
}

/// Status line and body of an HTTP response.
pub struct HttpResponse {
    pub status: u16,
    pub reason: String,
    pub body: Box<dyn ResponseBody>,
}

impl HttpResponse {
    /// Builds a response whose body is already fully in memory.
    pub fn buffered(status: u16, reason: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            reason: reason.into(),
            body: Box::new(BufferedBody(Some(body.into()))),
        }
    }

    /// Any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// Reads the remaining body into memory.
    pub async fn into_bytes(mut self) -> Result<Vec<u8>, TransportError> {
        let mut out = Vec::new();
        while let Some(chunk) = self.body.chunk().await? {
            out.extend_from_slice(&chunk);
        }
        Ok(out)
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("reason", &self.reason)
            .finish_non_exhaustive()
    }
}

/// A body held in memory, yielded as a single chunk.
#[derive(Debug, Default)]
pub struct BufferedBody(pub Option<Bytes>);

#[async_trait]
impl ResponseBody for BufferedBody {
    async fn chunk(&mut self) -> Result<Option<Bytes>, TransportError> {
        Ok(self.0.take().filter(|b| !b.is_empty()))
    }
}

/// Issues GET requests on behalf of adapters.
///
/// Implementations must not share mutable buffers between calls: one transport may
/// serve several concurrent fetches.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError>;
}

/// [`HttpTransport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder().build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResponseBody for reqwest::Response {
    async fn chunk(&mut self) -> Result<Option<Bytes>, TransportError> {
        Ok(reqwest::Response::chunk(self).await?)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            body: Box::new(response),
        })
    }
}
