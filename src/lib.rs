//! # tor-proxy-pool
//!
//! Provisions a pool of Tor SOCKS5 circuits, validates which of them are live
//! and exit from distinct IPs, and drives a set of session workers through the
//! surviving proxies.
//!
//! The pipeline is `ProxySource` -> `ProxyValidator` -> `ProxyPool` -> `PoolManager`,
//! with all network access going through the `Transport` trait.

pub mod config;
pub mod error;
pub mod manager;
pub mod pool;
pub mod proxy;
pub mod session;
pub mod source;
pub mod transport;
pub mod validator;
mod utils;

pub use config::{PoolConfig, PoolConfigBuilder};
pub use error::{ConfigError, MalformedProxyUrl, ProbeError, SessionError, SourceError, TransportError};
pub use manager::{PoolManager, RunReport};
pub use pool::ProxyPool;
pub use proxy::{Credentials, ProxyDescriptor, ValidatedProxy};
pub use session::{SessionWorker, WorkerState};
pub use source::{ListSource, ProxySource, TorProxySource};
pub use transport::{HttpResponse, ReqwestHandle, ReqwestTransport, Transport, TransportHandle};
pub use validator::ProxyValidator;
