//! Concurrent proxy validation.

use crate::config::PoolConfig;
use crate::error::ProbeError;
use crate::proxy::{ProxyDescriptor, ValidatedProxy};
use crate::transport::{Transport, TransportHandle};

use futures::future;
use log::{debug, info, warn};
use serde::Deserialize;
use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time;

/// Body returned by the identity check endpoint.
#[derive(Debug, Deserialize)]
struct IpResponse {
    ip: String,
}

/// Probes candidates through a transport and keeps the ones with a distinct exit IP.
pub struct ProxyValidator<T: Transport> {
    transport: Arc<T>,
    ip_check_url: String,
    probe_timeout: Duration,
}

impl<T: Transport> ProxyValidator<T> {
    pub fn new(transport: Arc<T>, ip_check_url: impl Into<String>, probe_timeout: Duration) -> Self {
        Self {
            transport,
            ip_check_url: ip_check_url.into(),
            probe_timeout,
        }
    }

    pub fn from_config(transport: Arc<T>, config: &PoolConfig) -> Self {
        Self::new(transport, config.ip_check_url.clone(), config.probe_timeout)
    }

    /// Probe every candidate with at most `concurrency_limit` probes in flight,
    /// then return the survivors deduplicated by discovered IP.
    ///
    /// Failed probes are logged and dropped; this never fails as a whole.
    pub async fn validate(
        &self,
        candidates: Vec<ProxyDescriptor>,
        concurrency_limit: usize,
    ) -> Vec<ValidatedProxy> {
        let total = candidates.len();
        info!(
            "Validating {} proxy candidates ({} concurrent)",
            total, concurrency_limit
        );

        let semaphore = Arc::new(Semaphore::new(concurrency_limit.max(1)));

        let probes = candidates.into_iter().map(|candidate| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                // The semaphore is never closed, acquire only fails after close().
                let _permit = semaphore.acquire().await.ok()?;
                match self.probe(&candidate).await {
                    Ok(ip) => {
                        debug!("Proxy {} exits from {}", candidate, ip);
                        Some(ValidatedProxy::new(candidate, ip))
                    }
                    Err(e) => {
                        warn!("Dropping proxy {}: {}", candidate, e);
                        None
                    }
                }
            }
        });

        // Barrier: every probe settles before deduplication.
        let results = future::join_all(probes).await;
        let succeeded: Vec<ValidatedProxy> = results.into_iter().flatten().collect();
        let succeeded_count = succeeded.len();
        let validated = dedup_by_ip(succeeded);

        info!(
            "Validation completed: {}/{} responded, {} distinct exit IPs",
            succeeded_count,
            total,
            validated.len()
        );
        validated
    }

    /// Run a single probe under the configured deadline.
    pub async fn probe(&self, candidate: &ProxyDescriptor) -> Result<IpAddr, ProbeError> {
        let url = candidate.render();
        match time::timeout(self.probe_timeout, self.probe_inner(&url)).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout(self.probe_timeout)),
        }
    }

    async fn probe_inner(&self, proxy_url: &str) -> Result<IpAddr, ProbeError> {
        let handle = self.transport.open(Some(proxy_url)).await?;
        let response = handle.get(&self.ip_check_url).await;
        if let Err(e) = handle.close().await {
            debug!("Failed to close probe handle for {}: {}", proxy_url, e);
        }
        let response = response?;

        if !response.is_success() {
            return Err(ProbeError::Status(response.status));
        }
        parse_ip(&response.body)
    }
}

/// Extract the `ip` field from an identity check body.
fn parse_ip(body: &str) -> Result<IpAddr, ProbeError> {
    let parsed: IpResponse = serde_json::from_str(body)?;
    parsed
        .ip
        .trim()
        .parse()
        .map_err(|_| ProbeError::InvalidIp(parsed.ip))
}

/// Keep the first proxy seen for each exit IP, preserving order.
pub(crate) fn dedup_by_ip(proxies: Vec<ValidatedProxy>) -> Vec<ValidatedProxy> {
    let mut seen = HashSet::new();
    proxies
        .into_iter()
        .filter(|proxy| seen.insert(proxy.ip()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validated(url: &str, ip: &str) -> ValidatedProxy {
        ValidatedProxy::new(ProxyDescriptor::parse(url).unwrap(), ip.parse().unwrap())
    }

    #[test]
    fn test_parse_ip() {
        assert_eq!(
            parse_ip(r#"{"ip": "198.51.100.4"}"#).unwrap(),
            "198.51.100.4".parse::<IpAddr>().unwrap()
        );
        assert_eq!(
            parse_ip(r#"{"ip":"2001:db8::1","country":"NL"}"#).unwrap(),
            "2001:db8::1".parse::<IpAddr>().unwrap()
        );
        assert!(matches!(parse_ip("<html>"), Err(ProbeError::Body(_))));
        assert!(matches!(parse_ip(r#"{"origin": "1.2.3.4"}"#), Err(ProbeError::Body(_))));
        assert!(matches!(parse_ip(r#"{"ip": "nope"}"#), Err(ProbeError::InvalidIp(_))));
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let proxies = vec![
            validated("socks5://a:a@localhost:9050", "10.0.0.1"),
            validated("socks5://b:b@localhost:9050", "10.0.0.2"),
            validated("socks5://c:c@localhost:9050", "10.0.0.1"),
            validated("socks5://d:d@localhost:9050", "10.0.0.3"),
            validated("socks5://e:e@localhost:9050", "10.0.0.2"),
        ];
        let deduped = dedup_by_ip(proxies);
        let users: Vec<&str> = deduped
            .iter()
            .map(|p| p.descriptor().username().unwrap())
            .collect();
        assert_eq!(users, vec!["a", "b", "d"]);
    }
}
