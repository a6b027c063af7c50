//! Transport collaborator used for probes and worker sessions.

use crate::error::TransportError;

use async_trait::async_trait;
use std::time::Duration;

/// Response returned by a transport handle.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Opens transport handles, optionally routed through a proxy URL.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    type Handle: TransportHandle;

    /// Open a handle routed through `proxy_url`, or a direct one when `None`.
    async fn open(&self, proxy_url: Option<&str>) -> Result<Self::Handle, TransportError>;
}

/// An open transport handle, exclusively owned by one probe or worker.
#[async_trait]
pub trait TransportHandle: Send + Sync + 'static {
    /// Issue a GET request.
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;

    /// Release the handle.
    async fn close(self) -> Result<(), TransportError>;
}

/// `reqwest`-backed transport. Proxy URLs are applied to all schemes.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

/// Handle wrapping a `reqwest::Client` bound to one route.
#[derive(Debug)]
pub struct ReqwestHandle {
    client: reqwest::Client,
}

#[async_trait]
impl Transport for ReqwestTransport {
    type Handle = ReqwestHandle;

    async fn open(&self, proxy_url: Option<&str>) -> Result<ReqwestHandle, TransportError> {
        let mut builder = reqwest::Client::builder().timeout(self.timeout);
        if let Some(url) = proxy_url {
            builder = builder.proxy(reqwest::Proxy::all(url)?);
        }
        Ok(ReqwestHandle {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl TransportHandle for ReqwestHandle {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }

    async fn close(self) -> Result<(), TransportError> {
        // Dropping the client tears down its pooled connections.
        drop(self.client);
        Ok(())
    }
}
