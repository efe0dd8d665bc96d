//! The search service: one task that owns the aggregator and the daemon
//! connection.
//!
//! Host commands arrive through a [`SearchHandle`], lookup results through an
//! internal event channel, and finalized sets leave as [`Completion`]s on the
//! receiver returned by [`SearchService::spawn`]. Two timers drive the loop:
//! the typing debounce and the reply deadline of the query in flight.
//!
//! Nothing in the loop waits on the bus: connecting, the liveness probe and
//! every daemon call run in lookup tasks.

mod lookup;

use std::sync::Arc;

use docbar_bus::{BusError, ConnectionManager, Connector, DocumentHit, QueryRequest};
use docbar_types::Completion;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, trace};

use crate::aggregator::{Aggregator, QueryToken, ResultSet};
use crate::config::{Config, DaemonConfig, SearchConfig, WireShape};
use crate::locator;
use crate::matches::MatchRenderer;
use crate::{Error, Result};
use lookup::LookupEvent;

#[derive(Debug)]
enum Command {
    Query {
        text: String,
        max: u32,
        debounce: bool,
    },
    Shutdown,
}

/// Host-side handle to a running [`SearchService`]
#[derive(Debug, Clone)]
pub struct SearchHandle {
    tx: UnboundedSender<Command>,
}

impl SearchHandle {
    /// Submit `text` once typing pauses for the debounce period.
    ///
    /// A later call within the period replaces this one. `max` of zero asks
    /// for the configured maximum.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceStopped`] if the service has exited.
    pub fn query(&self, text: impl Into<String>, max: u32) -> Result<()> {
        self.send(Command::Query {
            text: text.into(),
            max,
            debounce: true,
        })
    }

    /// Submit `text` immediately.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceStopped`] if the service has exited.
    pub fn query_now(&self, text: impl Into<String>, max: u32) -> Result<()> {
        self.send(Command::Query {
            text: text.into(),
            max,
            debounce: false,
        })
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(Command::Shutdown);
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }

    fn send(&self, command: Command) -> Result<()> {
        self.tx.send(command).map_err(|_| Error::ServiceStopped)
    }
}

struct Debounced {
    text: String,
    max: u32,
    due: Instant,
}

pub struct SearchService<C> {
    search: SearchConfig,
    daemon: DaemonConfig,
    renderer: MatchRenderer,
    aggregator: Aggregator,
    connections: Arc<ConnectionManager<C>>,
    commands: UnboundedReceiver<Command>,
    events_tx: UnboundedSender<LookupEvent>,
    events: UnboundedReceiver<LookupEvent>,
    completions: UnboundedSender<Completion>,
    debounced: Option<Debounced>,
    deadline: Option<(QueryToken, Instant)>,
}

impl<C: Connector + 'static> SearchService<C> {
    #[must_use]
    pub fn new(
        config: &Config,
        connector: C,
    ) -> (Self, SearchHandle, UnboundedReceiver<Completion>) {
        let (tx, commands) = mpsc::unbounded_channel();
        let (events_tx, events) = mpsc::unbounded_channel();
        let (completions, completions_rx) = mpsc::unbounded_channel();
        // Half the reply budget is left for the lookup after a reconnect
        let connections =
            ConnectionManager::new(connector).with_probe_timeout(config.search.reply_timeout() / 2);

        let service = Self {
            search: config.search.clone(),
            daemon: config.daemon.clone(),
            renderer: MatchRenderer::new(&config.display),
            aggregator: Aggregator::new(),
            connections: Arc::new(connections),
            commands,
            events_tx,
            events,
            completions,
            debounced: None,
            deadline: None,
        };

        (service, SearchHandle { tx }, completions_rx)
    }

    /// Create the service and run it on the current tokio runtime.
    #[must_use]
    pub fn spawn(
        config: &Config,
        connector: C,
    ) -> (SearchHandle, UnboundedReceiver<Completion>, JoinHandle<()>) {
        let (service, handle, completions) = Self::new(config, connector);
        let task = tokio::spawn(service.run());
        (handle, completions, task)
    }

    /// Process commands until shutdown or until every handle is dropped.
    pub async fn run(mut self) {
        info!(
            "Search service started ({:?} lookups, {}ms debounce, {}ms reply timeout)",
            self.daemon.wire_shape, self.search.debounce_ms, self.search.reply_timeout_ms
        );

        loop {
            let debounce_due = self.debounced.as_ref().map(|d| d.due);
            let deadline = self.deadline.map(|(_, at)| at);

            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Query { text, max, debounce }) => {
                        if debounce && !self.search.debounce().is_zero() {
                            self.schedule(text, max);
                        } else {
                            self.debounced = None;
                            self.submit(text, max);
                        }
                    }
                    Some(Command::Shutdown) | None => break,
                },
                Some(event) = self.events.recv() => self.on_event(event),
                () = sleep_until(debounce_due.unwrap_or_else(Instant::now)), if debounce_due.is_some() => {
                    if let Some(Debounced { text, max, .. }) = self.debounced.take() {
                        self.submit(text, max);
                    }
                }
                () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Some((token, _)) = self.deadline.take()
                        && let Some(set) = self.aggregator.expire(token)
                    {
                        self.emit(set);
                    }
                }
            }
        }

        info!("Search service stopped");
    }

    /// Typing supersedes the query in flight right away, not when the
    /// debounce fires.
    fn schedule(&mut self, text: String, max: u32) {
        self.aggregator.abandon();
        self.deadline = None;
        trace!("Debouncing query {text:?}");
        self.debounced = Some(Debounced {
            text,
            max,
            due: Instant::now() + self.search.debounce(),
        });
    }

    fn submit(&mut self, text: String, max: u32) {
        let max = self.search.clamp_max(max);
        let token = self.aggregator.begin(text.clone());
        self.deadline = None;

        let needle = text.trim();
        if needle.is_empty() || max == 0 {
            if let Some(set) = self.aggregator.submit(token, 0) {
                self.emit(set);
            }
            return;
        }

        self.deadline = Some((token, Instant::now() + self.search.reply_timeout()));

        match self.daemon.wire_shape {
            WireShape::Simple => lookup::spawn_identifier_lookup(
                token,
                Arc::clone(&self.connections),
                needle.to_string(),
                max,
                self.events_tx.clone(),
            ),
            WireShape::Embedded => lookup::spawn_embedded_lookup(
                token,
                Arc::clone(&self.connections),
                QueryRequest {
                    engine: self.daemon.engine.clone(),
                    scope: self.daemon.scope.clone(),
                    text: needle.to_string(),
                    offset: 0,
                    max,
                },
                self.events_tx.clone(),
            ),
        }
    }

    fn on_event(&mut self, event: LookupEvent) {
        match event {
            LookupEvent::Identifiers {
                token,
                result: Ok(count),
            } => {
                if let Some(set) = self.aggregator.submit(token, count) {
                    self.emit(set);
                }
            }
            LookupEvent::Records {
                token,
                result: Ok(hits),
            } => {
                if let Some(set) = self.aggregator.submit(token, hits.len()) {
                    self.emit(set);
                    return;
                }
                for hit in hits {
                    self.deliver(token, hit);
                }
            }
            LookupEvent::Identifiers {
                token,
                result: Err(e),
            }
            | LookupEvent::Records {
                token,
                result: Err(e),
            } => self.lookup_failed(token, &e),
            LookupEvent::Hit { token, result } => self.deliver(token, result),
        }
    }

    fn lookup_failed(&mut self, token: QueryToken, error: &BusError) {
        if error.is_transport() {
            self.connections.invalidate();
        }
        if self.aggregator.is_current(token) {
            self.deadline = None;
        }
        self.aggregator.fail(token, error);
    }

    fn deliver(&mut self, token: QueryToken, result: docbar_bus::Result<DocumentHit>) {
        let hit = result.map_err(Error::from).and_then(|mut hit| {
            hit.locator = locator::normalize(&hit.locator)?;
            Ok(hit)
        });

        let finished = match hit {
            Ok(hit) => self.aggregator.on_hit_received(token, hit),
            Err(e) => {
                if e.is_transport() {
                    self.connections.invalidate();
                }
                self.aggregator.on_hit_error(token, &e)
            }
        };

        if let Some(set) = finished {
            self.emit(set);
        }
    }

    fn emit(&mut self, set: ResultSet) {
        self.deadline = None;

        let completion = Completion {
            matches: set.hits.iter().map(|hit| self.renderer.render(hit)).collect(),
            query: set.query,
            expected: set.expected,
            failed: set.failed,
            timed_out: set.timed_out,
        };
        debug!(
            "Query {} emitted {} matches",
            set.token,
            completion.matches.len()
        );

        if self.completions.send(completion).is_err() {
            debug!("Completion receiver dropped");
        }
    }
}
