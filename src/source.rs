//! Sources of untested proxy candidates.

use crate::config::PoolConfig;
use crate::error::{MalformedProxyUrl, SourceError};
use crate::proxy::ProxyDescriptor;
use crate::utils;

use log::{debug, info};

/// Default Tor SOCKS listener host.
pub const DEFAULT_TOR_HOST: &str = "localhost";
/// Default Tor SOCKS listener port.
pub const DEFAULT_TOR_PORT: u32 = 9050;

const CREDENTIAL_LEN: usize = 10;
const TOR_SCHEME: &str = "socks5";

/// Produces an initial, untested list of proxy candidates.
pub trait ProxySource: Send + Sync {
    /// Generate up to `count` candidates.
    fn generate(&self, count: usize) -> Vec<ProxyDescriptor>;
}

/// Candidates against a local Tor SOCKS listener.
///
/// Tor isolates streams by SOCKS credentials, so every candidate gets a fresh
/// random username/password pair and is likely to exit through its own circuit.
#[derive(Debug, Clone)]
pub struct TorProxySource {
    host: String,
    port: u32,
}

impl TorProxySource {
    /// Create a source for the listener at `host:port`.
    ///
    /// Fails when the endpoint would not render a parseable proxy URL.
    pub fn new(host: impl Into<String>, port: u32) -> Result<Self, MalformedProxyUrl> {
        let host = host.into();
        ProxyDescriptor::parse(&format!("{}://{}:{}", TOR_SCHEME, host, port))?;
        Ok(Self { host, port })
    }

    /// Use the backend host and port from the pool configuration.
    pub fn from_config(config: &PoolConfig) -> Result<Self, MalformedProxyUrl> {
        Self::new(config.backend_host.clone(), config.backend_port)
    }
}

impl Default for TorProxySource {
    fn default() -> Self {
        Self {
            host: DEFAULT_TOR_HOST.to_string(),
            port: DEFAULT_TOR_PORT,
        }
    }
}

impl ProxySource for TorProxySource {
    fn generate(&self, count: usize) -> Vec<ProxyDescriptor> {
        debug!("Generating {} Tor candidates against {}:{}", count, self.host, self.port);
        (0..count)
            .map(|_| {
                // Host and port were checked in `new`, tokens are alphanumeric.
                ProxyDescriptor::from_checked_parts(
                    TOR_SCHEME,
                    utils::random_token(CREDENTIAL_LEN),
                    utils::random_token(CREDENTIAL_LEN),
                    &self.host,
                    self.port,
                )
            })
            .collect()
    }
}

/// Candidates taken from a static proxy list.
#[derive(Debug, Clone, Default)]
pub struct ListSource {
    proxies: Vec<ProxyDescriptor>,
}

impl ListSource {
    pub fn new(proxies: Vec<ProxyDescriptor>) -> Self {
        Self { proxies }
    }

    /// Parse a list with one proxy URL (or bare `host:port`) per line.
    pub fn from_text(content: &str) -> Self {
        Self::new(utils::parse_proxy_list(content))
    }

    pub fn from_file(path: &str) -> Result<Self, SourceError> {
        let proxies = utils::read_proxy_file(path)?;
        info!("Loaded {} proxies from {}", proxies.len(), path);
        Ok(Self::new(proxies))
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }
}

impl ProxySource for ListSource {
    /// Returns the first `count` entries; fewer when the list is shorter.
    fn generate(&self, count: usize) -> Vec<ProxyDescriptor> {
        self.proxies.iter().take(count).cloned().collect()
    }
}
