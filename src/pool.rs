//! The validated proxy pool.

use crate::proxy::ValidatedProxy;
use crate::source::ProxySource;
use crate::transport::Transport;
use crate::validator::{self, ProxyValidator};

use log::{info, warn};

/// A validated, deduplicated and ordered set of proxies.
///
/// Written once when validation completes and only read afterwards.
#[derive(Debug, Clone, Default)]
pub struct ProxyPool {
    /// Validated proxies, in order of first successful probe result.
    proxies: Vec<ValidatedProxy>,
    /// Number of candidates that were requested from the source.
    requested: usize,
}

impl ProxyPool {
    /// Generate `target_count` candidates from `source` and validate them.
    pub async fn build<S, T>(
        source: &S,
        validator: &ProxyValidator<T>,
        target_count: usize,
        concurrency_limit: usize,
    ) -> Self
    where
        S: ProxySource + ?Sized,
        T: Transport,
    {
        info!("Building proxy pool with {} candidates", target_count);

        let candidates = source.generate(target_count);
        let proxies = validator.validate(candidates, concurrency_limit).await;
        let pool = Self::from_validated(proxies, target_count);

        let (requested, validated) = pool.stats();
        if validated == 0 {
            warn!("No proxies validated out of {} requested", requested);
        } else {
            info!("Proxy pool ready: {}/{} proxies validated", validated, requested);
        }
        pool
    }

    /// Wrap an already validated list, keeping the first proxy for each exit IP.
    pub fn from_validated(proxies: Vec<ValidatedProxy>, requested: usize) -> Self {
        Self {
            proxies: validator::dedup_by_ip(proxies),
            requested,
        }
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidatedProxy> {
        self.proxies.iter()
    }

    pub fn proxies(&self) -> &[ValidatedProxy] {
        &self.proxies
    }

    /// Rendered proxy URLs in pool order.
    pub fn urls(&self) -> Vec<String> {
        self.proxies.iter().map(ValidatedProxy::url).collect()
    }

    /// Number of requested candidates.
    pub fn requested(&self) -> usize {
        self.requested
    }

    /// Get statistics about the pool as `(requested, validated)`.
    pub fn stats(&self) -> (usize, usize) {
        (self.requested, self.proxies.len())
    }
}

impl<'a> IntoIterator for &'a ProxyPool {
    type Item = &'a ValidatedProxy;
    type IntoIter = std::slice::Iter<'a, ValidatedProxy>;

    fn into_iter(self) -> Self::IntoIter {
        self.proxies.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::ProxyDescriptor;

    #[test]
    fn test_pool_accessors() {
        let proxies = vec![
            ValidatedProxy::new(
                ProxyDescriptor::parse("socks5://a:a@localhost:9050").unwrap(),
                "10.0.0.1".parse().unwrap(),
            ),
            ValidatedProxy::new(
                ProxyDescriptor::parse("socks5://b:b@localhost:9050").unwrap(),
                "10.0.0.2".parse().unwrap(),
            ),
        ];
        let pool = ProxyPool::from_validated(proxies, 5);
        assert_eq!(pool.len(), 2);
        assert!(!pool.is_empty());
        assert_eq!(pool.stats(), (5, 2));
        assert_eq!(pool.requested(), 5);
        assert_eq!(
            pool.urls(),
            vec!["socks5://a:a@localhost:9050", "socks5://b:b@localhost:9050"]
        );
        assert_eq!((&pool).into_iter().count(), 2);
    }

    #[test]
    fn test_from_validated_collapses_repeated_ips() {
        let a = ValidatedProxy::new(
            ProxyDescriptor::parse("socks5://a:a@localhost:9050").unwrap(),
            "10.0.0.1".parse().unwrap(),
        );
        let b = ValidatedProxy::new(
            ProxyDescriptor::parse("socks5://b:b@localhost:9050").unwrap(),
            "10.0.0.2".parse().unwrap(),
        );
        let c = ValidatedProxy::new(
            ProxyDescriptor::parse("socks5://c:c@localhost:9050").unwrap(),
            "10.0.0.1".parse().unwrap(),
        );
        let pool = ProxyPool::from_validated(vec![a.clone(), b.clone(), c, a, b], 5);

        assert_eq!(pool.stats(), (5, 2));
        assert_eq!(
            pool.urls(),
            vec!["socks5://a:a@localhost:9050", "socks5://b:b@localhost:9050"]
        );
    }

    #[test]
    fn test_empty_pool() {
        let pool = ProxyPool::default();
        assert!(pool.is_empty());
        assert_eq!(pool.stats(), (0, 0));
    }
}
