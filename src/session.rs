//! Session workers bound to zero or one proxy.

use crate::error::{SessionError, TransportError};
use crate::proxy::ValidatedProxy;
use crate::transport::{Transport, TransportHandle};

use futures::future;
use log::{debug, info, warn};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;

/// Lifecycle of a worker. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Constructed, no handles open.
    Created,
    /// `start` ran; successfully opened handles are held.
    Started,
    /// Handles released.
    Closed,
}

impl WorkerState {
    fn as_str(self) -> &'static str {
        match self {
            WorkerState::Created => "created",
            WorkerState::Started => "started",
            WorkerState::Closed => "closed",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One bot instance owning its transport handles.
pub struct SessionWorker<T: Transport> {
    id: usize,
    proxy: Option<ValidatedProxy>,
    sessions: usize,
    transport: Arc<T>,
    handles: Vec<T::Handle>,
    state: WorkerState,
    open_timeout: Duration,
    close_timeout: Duration,
}

impl<T: Transport> SessionWorker<T> {
    /// Create a worker; `proxy` of `None` connects directly.
    pub fn new(id: usize, proxy: Option<ValidatedProxy>, sessions: usize, transport: Arc<T>) -> Self {
        Self {
            id,
            proxy,
            sessions,
            transport,
            handles: Vec::new(),
            state: WorkerState::Created,
            open_timeout: Duration::from_secs(10),
            close_timeout: Duration::from_secs(5),
        }
    }

    /// Set the deadlines for opening and closing each handle.
    pub fn with_timeouts(mut self, open_timeout: Duration, close_timeout: Duration) -> Self {
        self.open_timeout = open_timeout;
        self.close_timeout = close_timeout;
        self
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn proxy(&self) -> Option<&ValidatedProxy> {
        self.proxy.as_ref()
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Number of currently open handles.
    pub fn open_sessions(&self) -> usize {
        self.handles.len()
    }

    pub fn handles(&self) -> &[T::Handle] {
        &self.handles
    }

    /// Open the configured number of handles concurrently.
    ///
    /// Handles that opened are kept even if others failed, so `close` still
    /// releases them. The worker is `Started` after this returns either way.
    pub async fn start(&mut self) -> Result<(), SessionError> {
        if self.state != WorkerState::Created {
            return Err(self.invalid_state("start"));
        }

        let proxy_url = self.proxy.as_ref().map(ValidatedProxy::url);
        let open_timeout = self.open_timeout;
        let transport = &self.transport;

        let opens = (0..self.sessions).map(|_| {
            let proxy_url = proxy_url.as_deref();
            async move {
                match time::timeout(open_timeout, transport.open(proxy_url)).await {
                    Ok(result) => result,
                    Err(_) => Err(TransportError::Timeout(open_timeout)),
                }
            }
        });
        let results = future::join_all(opens).await;

        self.state = WorkerState::Started;

        let mut first_error = None;
        for result in results {
            match result {
                Ok(handle) => self.handles.push(handle),
                Err(e) => {
                    warn!("Worker {} failed to open session: {}", self.id, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            None => {
                debug!(
                    "Worker {} started {} sessions via {}",
                    self.id,
                    self.handles.len(),
                    proxy_url.as_deref().unwrap_or("direct connection")
                );
                Ok(())
            }
            Some(source) => Err(SessionError::Start {
                worker: self.id,
                opened: self.handles.len(),
                requested: self.sessions,
                source,
            }),
        }
    }

    /// Close every open handle concurrently. Each close is attempted even when
    /// others fail or time out; failures are summarised in the returned error.
    pub async fn close(&mut self) -> Result<(), SessionError> {
        if self.state != WorkerState::Started {
            return Err(self.invalid_state("close"));
        }

        let handles = std::mem::take(&mut self.handles);
        let total = handles.len();
        let close_timeout = self.close_timeout;

        let closes = handles.into_iter().map(|handle| async move {
            match time::timeout(close_timeout, handle.close()).await {
                Ok(result) => result,
                Err(_) => Err(TransportError::Timeout(close_timeout)),
            }
        });
        let results = future::join_all(closes).await;

        self.state = WorkerState::Closed;

        let mut failed = 0;
        for e in results.into_iter().filter_map(Result::err) {
            warn!("Worker {} failed to close session: {}", self.id, e);
            failed += 1;
        }

        if failed == 0 {
            debug!("Worker {} closed {} sessions", self.id, total);
            Ok(())
        } else {
            info!("Worker {} closed {}/{} sessions cleanly", self.id, total - failed, total);
            Err(SessionError::Close {
                worker: self.id,
                failed,
                total,
            })
        }
    }

    fn invalid_state(&self, operation: &'static str) -> SessionError {
        SessionError::InvalidState {
            worker: self.id,
            operation,
            state: self.state.as_str(),
        }
    }
}
