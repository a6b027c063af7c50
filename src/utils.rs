//! Utility functions for proxy list handling.

use crate::error::SourceError;
use crate::proxy::ProxyDescriptor;

use log::warn;
use rand::distr::Alphanumeric;
use rand::Rng;

/// Read a proxy list file and parse its entries.
pub(crate) fn read_proxy_file(path: &str) -> Result<Vec<ProxyDescriptor>, SourceError> {
    let content = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_string(),
        source,
    })?;
    Ok(parse_proxy_list(&content))
}

/// Parse text content into proxy descriptors, one per line.
pub(crate) fn parse_proxy_list(content: &str) -> Vec<ProxyDescriptor> {
    content
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            // Bare HOST:PORT defaults to socks5
            let url = if line.contains("://") {
                line.to_string()
            } else {
                format!("socks5://{}", line)
            };
            match ProxyDescriptor::parse(&url) {
                Ok(proxy) => Some(proxy),
                Err(e) => {
                    warn!("Skipping proxy list entry: {}", e);
                    None
                }
            }
        })
        .collect()
}

/// Random alphanumeric string from the thread-local CSPRNG.
pub(crate) fn random_token(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
