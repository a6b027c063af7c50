//! Configuration for pool provisioning and worker orchestration.

use crate::error::ConfigError;
use crate::proxy::ProxyDescriptor;
use crate::source::{DEFAULT_TOR_HOST, DEFAULT_TOR_PORT};

use std::time::Duration;
use url::Url;

/// Configuration for the proxy pool and its workers.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of candidates to request from the source.
    pub target_count: usize,
    /// Maximum number of probes in flight at once.
    pub concurrency_limit: usize,
    /// Host of the proxy backend (the local Tor SOCKS listener).
    pub backend_host: String,
    /// Port of the proxy backend.
    pub backend_port: u32,
    /// Transport handles each worker keeps open.
    pub sessions_per_worker: usize,
    /// Deadline for a single probe, also applied when opening handles.
    pub probe_timeout: Duration,
    /// Deadline for closing a single handle.
    pub close_timeout: Duration,
    /// Endpoint answering with a JSON body `{"ip": "..."}`.
    pub ip_check_url: String,
    /// Direct-connection workers to run when no proxy validated; 0 reports zero capacity.
    pub fallback_workers: usize,
}

impl PoolConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PoolConfigBuilder {
        PoolConfigBuilder::new()
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfigBuilder::new().defaults()
    }
}

/// Builder for `PoolConfig`.
pub struct PoolConfigBuilder {
    target_count: Option<usize>,
    concurrency_limit: Option<usize>,
    backend_host: Option<String>,
    backend_port: Option<u32>,
    sessions_per_worker: Option<usize>,
    probe_timeout: Option<Duration>,
    close_timeout: Option<Duration>,
    ip_check_url: Option<String>,
    fallback_workers: Option<usize>,
}

impl PoolConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self {
            target_count: None,
            concurrency_limit: None,
            backend_host: None,
            backend_port: None,
            sessions_per_worker: None,
            probe_timeout: None,
            close_timeout: None,
            ip_check_url: None,
            fallback_workers: None,
        }
    }

    /// Set the number of candidates to request.
    pub fn target_count(mut self, count: usize) -> Self {
        self.target_count = Some(count);
        self
    }

    /// Set the maximum number of concurrent probes.
    pub fn concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = Some(limit);
        self
    }

    /// Set the host of the proxy backend.
    pub fn backend_host(mut self, host: impl Into<String>) -> Self {
        self.backend_host = Some(host.into());
        self
    }

    /// Set the port of the proxy backend.
    pub fn backend_port(mut self, port: u32) -> Self {
        self.backend_port = Some(port);
        self
    }

    /// Set the number of transport handles per worker.
    pub fn sessions_per_worker(mut self, count: usize) -> Self {
        self.sessions_per_worker = Some(count);
        self
    }

    /// Set the timeout for a single probe.
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = Some(timeout);
        self
    }

    /// Set the timeout for closing a single handle.
    pub fn close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = Some(timeout);
        self
    }

    /// Set the identity check endpoint.
    pub fn ip_check_url(mut self, url: impl Into<String>) -> Self {
        self.ip_check_url = Some(url.into());
        self
    }

    /// Set the number of direct workers used when the pool comes back empty.
    pub fn fallback_workers(mut self, count: usize) -> Self {
        self.fallback_workers = Some(count);
        self
    }

    fn defaults(self) -> PoolConfig {
        PoolConfig {
            target_count: self.target_count.unwrap_or(200),
            concurrency_limit: self.concurrency_limit.unwrap_or(10),
            backend_host: self.backend_host.unwrap_or_else(|| DEFAULT_TOR_HOST.to_string()),
            backend_port: self.backend_port.unwrap_or(DEFAULT_TOR_PORT),
            sessions_per_worker: self.sessions_per_worker.unwrap_or(1),
            probe_timeout: self.probe_timeout.unwrap_or(Duration::from_secs(10)),
            close_timeout: self.close_timeout.unwrap_or(Duration::from_secs(5)),
            ip_check_url: self
                .ip_check_url
                .unwrap_or_else(|| "https://api.ipify.org?format=json".to_string()),
            fallback_workers: self.fallback_workers.unwrap_or(1),
        }
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<PoolConfig, ConfigError> {
        let config = self.defaults();

        if config.concurrency_limit == 0 {
            return Err(ConfigError::Zero("concurrency_limit"));
        }
        if config.sessions_per_worker == 0 {
            return Err(ConfigError::Zero("sessions_per_worker"));
        }
        Url::parse(&config.ip_check_url)?;
        // The backend must render into a URL the descriptor parser accepts.
        ProxyDescriptor::parse(&format!(
            "socks5://{}:{}",
            config.backend_host, config.backend_port
        ))?;

        Ok(config)
    }
}

impl Default for PoolConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
