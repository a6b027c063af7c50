//! Error types for the tor-proxy-pool crate.

use std::time::Duration;
use thiserror::Error;

/// Error returned when a string is not a valid `scheme://[user:pass@]host:port` proxy URL.
#[derive(Debug, Error)]
#[error("Malformed proxy URL: {0:?}")]
pub struct MalformedProxyUrl(pub String);

/// Failure reported by the transport collaborator.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The underlying HTTP client failed.
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    /// The operation did not finish within its deadline.
    #[error("Transport operation timed out after {0:?}")]
    Timeout(Duration),
    /// Any other transport failure.
    #[error("Transport failure: {0}")]
    Other(String),
}

/// Reason a single proxy probe failed. Always recovered inside the validator.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("Probe timed out after {0:?}")]
    Timeout(Duration),
    #[error("Identity endpoint answered with status {0}")]
    Status(u16),
    #[error("Malformed identity response: {0}")]
    Body(#[from] serde_json::Error),
    #[error("Identity response carried an invalid IP: {0:?}")]
    InvalidIp(String),
}

/// Per-worker lifecycle failure. Collected by the manager, never fatal to a run.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Some transport handles could not be opened.
    #[error("Worker {worker} opened {opened}/{requested} sessions: {source}")]
    Start {
        worker: usize,
        opened: usize,
        requested: usize,
        #[source]
        source: TransportError,
    },
    /// Some transport handles failed to close cleanly.
    #[error("Worker {worker} failed to close {failed}/{total} sessions")]
    Close {
        worker: usize,
        failed: usize,
        total: usize,
    },
    /// The operation is not valid in the worker's current state.
    #[error("Worker {worker} cannot {operation} while {state}")]
    InvalidState {
        worker: usize,
        operation: &'static str,
        state: &'static str,
    },
}

/// Invalid pool configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("Invalid identity check URL: {0}")]
    IpCheckUrl(#[from] url::ParseError),
    #[error("Invalid proxy backend: {0}")]
    Backend(#[from] MalformedProxyUrl),
}

/// Failure loading a static proxy list.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read proxy list {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
