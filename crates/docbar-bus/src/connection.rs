//! Cached daemon connection with a liveness probe.
//!
//! The manager moves between two states:
//!
//! ```text
//! Disconnected --connect--> Connected --probe fails / invalidate--> Disconnected
//! ```
//!
//! A cached backend is probed with `GetStatistics` before it is handed out
//! again; a failed or unanswered probe drops it and a fresh connection is
//! made. The manager is shared behind an `Arc` so lookups can connect from
//! their own tasks.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::backend::{BusNames, IndexBackend};
use crate::client::DaemonClient;
use crate::error::{BusError, Result};

/// How long a cached backend gets to answer the liveness probe
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Creates backends on demand
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn IndexBackend>>;
}

/// Connects to the daemon over the user's session bus
#[derive(Debug, Clone, Default)]
pub struct SessionConnector {
    names: BusNames,
}

impl SessionConnector {
    #[must_use]
    pub fn new(names: BusNames) -> Self {
        Self { names }
    }

    #[must_use]
    pub fn names(&self) -> &BusNames {
        &self.names
    }
}

#[async_trait]
impl Connector for SessionConnector {
    async fn connect(&self) -> Result<Arc<dyn IndexBackend>> {
        let client = DaemonClient::connect(&self.names).await?;
        Ok(Arc::new(client))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

type Slot = Option<Arc<dyn IndexBackend>>;

/// Owns the cached backend for one consumer
pub struct ConnectionManager<C> {
    connector: C,
    backend: Mutex<Slot>,
    probe_timeout: Duration,
}

impl<C: Connector> ConnectionManager<C> {
    #[must_use]
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            backend: Mutex::new(None),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_probe_timeout(mut self, probe_timeout: Duration) -> Self {
        self.probe_timeout = probe_timeout;
        self
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        if self.slot().is_some() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    /// Return a live backend, reconnecting if the cached one stopped answering.
    ///
    /// # Errors
    ///
    /// Returns the connector's error if no connection can be made. The
    /// manager is left `Disconnected` and the next call tries again.
    pub async fn ensure_connected(&self) -> Result<Arc<dyn IndexBackend>> {
        let cached = self.slot().clone();
        if let Some(backend) = cached {
            match self.probe(backend.as_ref()).await {
                Ok(()) => return Ok(backend),
                Err(e) => {
                    warn!("Cached daemon connection failed probe: {e}");
                    self.forget(&backend);
                }
            }
        }

        debug!("Connecting to indexing daemon");
        let backend = self.connector.connect().await?;
        info!("Connected to indexing daemon");
        *self.slot() = Some(Arc::clone(&backend));
        Ok(backend)
    }

    /// Drop the cached backend after a transport failure.
    pub fn invalidate(&self) {
        if self.slot().take().is_some() {
            debug!("Daemon connection invalidated");
        }
    }

    async fn probe(&self, backend: &dyn IndexBackend) -> Result<()> {
        match timeout(self.probe_timeout, backend.statistics()).await {
            Ok(result) => result.map(|_| ()),
            Err(_) => Err(BusError::Timeout),
        }
    }

    /// Drop `backend` unless another caller already replaced it.
    fn forget(&self, backend: &Arc<dyn IndexBackend>) {
        let mut slot = self.slot();
        if slot
            .as_ref()
            .is_some_and(|cached| Arc::ptr_eq(cached, backend))
        {
            *slot = None;
        }
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.backend.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
