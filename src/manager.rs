//! Orchestration of session workers over a proxy pool.

use crate::config::PoolConfig;
use crate::error::SessionError;
use crate::pool::ProxyPool;
use crate::session::SessionWorker;
use crate::source::ProxySource;
use crate::transport::Transport;
use crate::validator::ProxyValidator;

use futures::future;
use log::{info, warn};
use std::fmt;
use std::sync::Arc;

/// Outcome of one `PoolManager::run`.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Candidates requested from the source.
    pub requested: usize,
    /// Proxies that survived validation.
    pub validated: usize,
    /// Workers constructed.
    pub workers: usize,
    /// Whether workers fell back to direct connections.
    pub direct: bool,
    /// Transport handles opened across all workers.
    pub sessions_opened: usize,
    /// Workers that started every requested session.
    pub workers_started: usize,
    pub start_failures: Vec<SessionError>,
    pub close_failures: Vec<SessionError>,
}

impl RunReport {
    /// No worker could be constructed.
    pub fn zero_capacity(&self) -> bool {
        self.workers == 0
    }

    pub fn is_clean(&self) -> bool {
        self.start_failures.is_empty() && self.close_failures.is_empty()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "requested {}, validated {}, workers {}{}, started {}, sessions {}, start failures {}, close failures {}",
            self.requested,
            self.validated,
            self.workers,
            if self.direct { " (direct)" } else { "" },
            self.workers_started,
            self.sessions_opened,
            self.start_failures.len(),
            self.close_failures.len()
        )
    }
}

/// Fans a proxy pool out to session workers and drives their lifecycle.
pub struct PoolManager<T: Transport> {
    transport: Arc<T>,
    config: PoolConfig,
}

impl<T: Transport> PoolManager<T> {
    pub fn new(transport: Arc<T>, config: PoolConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Build a pool from `source` and run workers over it.
    pub async fn provision_and_run<S>(&self, source: &S, validator: &ProxyValidator<T>) -> RunReport
    where
        S: ProxySource + ?Sized,
    {
        let pool = ProxyPool::build(
            source,
            validator,
            self.config.target_count,
            self.config.concurrency_limit,
        )
        .await;
        self.run(&pool).await
    }

    /// One worker per pooled proxy, or `fallback_workers` direct workers when
    /// the pool is empty.
    pub fn workers(&self, pool: &ProxyPool) -> Vec<SessionWorker<T>> {
        let sessions = self.config.sessions_per_worker;
        let build = |id: usize, proxy| {
            SessionWorker::new(id, proxy, sessions, Arc::clone(&self.transport))
                .with_timeouts(self.config.probe_timeout, self.config.close_timeout)
        };

        if pool.is_empty() {
            (0..self.config.fallback_workers)
                .map(|id| build(id, None))
                .collect()
        } else {
            pool.iter()
                .enumerate()
                .map(|(id, proxy)| build(id, Some(proxy.clone())))
                .collect()
        }
    }

    /// Start every worker, wait for all to settle, then close every worker and
    /// wait again. Per-worker failures are collected into the report.
    pub async fn run(&self, pool: &ProxyPool) -> RunReport {
        let (requested, validated) = pool.stats();
        let mut workers = self.workers(pool);

        let mut report = RunReport {
            requested,
            validated,
            workers: workers.len(),
            direct: pool.is_empty(),
            ..RunReport::default()
        };

        if workers.is_empty() {
            warn!("Pool is empty and direct fallback is disabled: zero capacity");
            return report;
        }
        if report.direct {
            warn!("Pool is empty, falling back to {} direct workers", workers.len());
        }

        info!("Starting {} workers", workers.len());
        let started = future::join_all(workers.iter_mut().map(|w| w.start())).await;
        for result in started {
            match result {
                Ok(()) => report.workers_started += 1,
                Err(e) => {
                    warn!("{}", e);
                    report.start_failures.push(e);
                }
            }
        }
        report.sessions_opened = workers.iter().map(SessionWorker::open_sessions).sum();
        info!(
            "{}/{} workers started, {} sessions open",
            report.workers_started,
            report.workers,
            report.sessions_opened
        );

        info!("Closing {} workers", workers.len());
        let closed = future::join_all(workers.iter_mut().map(|w| w.close())).await;
        report
            .close_failures
            .extend(closed.into_iter().filter_map(Result::err).inspect(|e| warn!("{}", e)));

        info!("Run finished: {}", report);
        report
    }
}
