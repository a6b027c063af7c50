//! Scripted in-memory transport shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tor_proxy_pool::{
    HttpResponse, ListSource, PoolConfig, ProxyPool, ProxyValidator, Transport, TransportError,
    TransportHandle,
};

/// How the identity endpoint answers through a given route.
#[derive(Debug, Clone)]
pub enum Behavior {
    Ip(String),
    Status(u16),
    Body(String),
    Refuse,
    Hang,
}

impl Behavior {
    pub fn ip(ip: &str) -> Self {
        Behavior::Ip(ip.to_string())
    }
}

#[derive(Debug, Default)]
pub struct Counters {
    pub open_attempts: AtomicUsize,
    pub opened: AtomicUsize,
    pub close_attempts: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl Counters {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn close_attempts(&self) -> usize {
        self.close_attempts.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

pub struct MockTransport {
    behaviors: HashMap<String, Behavior>,
    default: Behavior,
    fail_open: HashSet<String>,
    fail_close: HashSet<String>,
    hang_close: HashSet<String>,
    fail_every: Option<usize>,
    delay: Duration,
    pub counters: Arc<Counters>,
    pub opened_routes: Mutex<Vec<Option<String>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            behaviors: HashMap::new(),
            default: Behavior::Refuse,
            fail_open: HashSet::new(),
            fail_close: HashSet::new(),
            hang_close: HashSet::new(),
            fail_every: None,
            delay: Duration::ZERO,
            counters: Arc::new(Counters::default()),
            opened_routes: Mutex::new(Vec::new()),
        }
    }

    pub fn route(mut self, url: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(url.to_string(), behavior);
        self
    }

    pub fn default_behavior(mut self, behavior: Behavior) -> Self {
        self.default = behavior;
        self
    }

    pub fn fail_open(mut self, url: &str) -> Self {
        self.fail_open.insert(url.to_string());
        self
    }

    pub fn fail_close(mut self, url: &str) -> Self {
        self.fail_close.insert(url.to_string());
        self
    }

    pub fn hang_close(mut self, url: &str) -> Self {
        self.hang_close.insert(url.to_string());
        self
    }

    /// Fail every `n`-th open attempt, counting across all routes.
    pub fn fail_every_nth_open(mut self, n: usize) -> Self {
        self.fail_every = Some(n);
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn routes(&self) -> Vec<Option<String>> {
        self.opened_routes.lock().unwrap().clone()
    }
}

pub struct MockHandle {
    behavior: Behavior,
    fail_close: bool,
    hang_close: bool,
    delay: Duration,
    counters: Arc<Counters>,
}

struct InFlight(Arc<Counters>);

impl InFlight {
    fn enter(counters: &Arc<Counters>) -> Self {
        let now = counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        counters.max_in_flight.fetch_max(now, Ordering::SeqCst);
        InFlight(Arc::clone(counters))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for MockTransport {
    type Handle = MockHandle;

    async fn open(&self, proxy_url: Option<&str>) -> Result<MockHandle, TransportError> {
        self.opened_routes
            .lock()
            .unwrap()
            .push(proxy_url.map(str::to_string));

        let key = proxy_url.unwrap_or("direct");
        let attempt = self.counters.open_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let nth_fails = self.fail_every.is_some_and(|n| attempt % n == 0);
        if self.fail_open.contains(key) || nth_fails {
            return Err(TransportError::Other(format!("connection refused: {}", key)));
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);

        Ok(MockHandle {
            behavior: self.behaviors.get(key).cloned().unwrap_or_else(|| self.default.clone()),
            fail_close: self.fail_close.contains(key),
            hang_close: self.hang_close.contains(key),
            delay: self.delay,
            counters: Arc::clone(&self.counters),
        })
    }
}

#[async_trait]
impl TransportHandle for MockHandle {
    async fn get(&self, _url: &str) -> Result<HttpResponse, TransportError> {
        let _guard = InFlight::enter(&self.counters);
        tokio::time::sleep(self.delay).await;

        match &self.behavior {
            Behavior::Ip(ip) => Ok(HttpResponse {
                status: 200,
                body: format!(r#"{{"ip": "{}"}}"#, ip),
            }),
            Behavior::Status(status) => Ok(HttpResponse {
                status: *status,
                body: String::new(),
            }),
            Behavior::Body(body) => Ok(HttpResponse {
                status: 200,
                body: body.clone(),
            }),
            Behavior::Refuse => Err(TransportError::Other("connection refused".to_string())),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(TransportError::Other("hung".to_string()))
            }
        }
    }

    async fn close(self) -> Result<(), TransportError> {
        self.counters.close_attempts.fetch_add(1, Ordering::SeqCst);
        if self.hang_close {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.fail_close {
            return Err(TransportError::Other("close failed".to_string()));
        }
        Ok(())
    }
}

pub fn test_config() -> PoolConfig {
    PoolConfig::builder()
        .probe_timeout(Duration::from_millis(200))
        .close_timeout(Duration::from_millis(200))
        .ip_check_url("http://identity.test/ip")
        .build()
        .unwrap()
}

/// Validate `urls` against a transport where the i-th URL exits from 10.0.0.(i+1).
pub async fn pool_of(urls: &[&str]) -> ProxyPool {
    let mut transport = MockTransport::new();
    for (i, url) in urls.iter().enumerate() {
        transport = transport.route(url, Behavior::Ip(format!("10.0.0.{}", i + 1)));
    }
    let validator = ProxyValidator::from_config(Arc::new(transport), &test_config());
    let source = ListSource::from_text(&urls.join("\n"));
    ProxyPool::build(&source, &validator, urls.len(), 10).await
}
