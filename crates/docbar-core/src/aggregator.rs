//! Result aggregation for one query at a time.
//!
//! ```text
//!          begin            submit(n > 0)            last slot resolved
//! Idle ----------> Pending ---------------> Collecting ------------------> Idle (emit)
//!                    |  submit(0) -> emit empty, Idle    |  expire -> emit partial, Idle
//!                    |  fail / expire -> Idle, no emit   |
//! ```
//!
//! `begin` always supersedes whatever was in flight. Every other operation
//! carries the [`QueryToken`] it belongs to and is ignored unless that token
//! is current, so late replies for an older query can never reach the
//! current set. A set is handed out at most once; after that the aggregator
//! is idle and further replies for its token are dropped.

use std::fmt;
use std::mem;

use docbar_types::DocumentHit;
use tracing::{debug, trace, warn};

/// Identifies one submitted query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryToken(u64);

impl QueryToken {
    #[must_use]
    pub fn generation(self) -> u64 {
        self.0
    }
}

impl fmt::Display for QueryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A finalized set of hits, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSet {
    pub token: QueryToken,
    pub query: String,
    pub hits: Vec<DocumentHit>,
    pub expected: usize,
    pub failed: usize,
    pub timed_out: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing in flight
    Idle,
    /// Lookup issued, reply count not known yet
    Pending,
    /// Waiting for per-document replies
    Collecting,
}

#[derive(Debug)]
struct InFlight {
    token: QueryToken,
    query: String,
    expected: usize,
    hits: Vec<DocumentHit>,
    failed: usize,
}

impl InFlight {
    fn resolved(&self) -> usize {
        self.hits.len() + self.failed
    }

    fn finish(self, timed_out: bool) -> ResultSet {
        ResultSet {
            token: self.token,
            query: self.query,
            hits: self.hits,
            expected: self.expected,
            failed: self.failed,
            timed_out,
        }
    }
}

#[derive(Debug, Default)]
enum State {
    #[default]
    Idle,
    Pending {
        token: QueryToken,
        query: String,
    },
    Collecting(InFlight),
}

#[derive(Debug, Default)]
pub struct Aggregator {
    generation: u64,
    state: State,
}

impl Aggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        match self.state {
            State::Idle => Phase::Idle,
            State::Pending { .. } => Phase::Pending,
            State::Collecting(_) => Phase::Collecting,
        }
    }

    /// Token of the query in flight, if any.
    #[must_use]
    pub fn current(&self) -> Option<QueryToken> {
        match &self.state {
            State::Idle => None,
            State::Pending { token, .. } => Some(*token),
            State::Collecting(in_flight) => Some(in_flight.token),
        }
    }

    #[must_use]
    pub fn is_current(&self, token: QueryToken) -> bool {
        self.current() == Some(token)
    }

    /// Start a new query, discarding any set still in flight.
    pub fn begin(&mut self, query: impl Into<String>) -> QueryToken {
        self.generation += 1;
        let token = QueryToken(self.generation);
        let query = query.into();

        if let Some(previous) = self.current() {
            debug!("Query {previous} superseded by {token}");
        }
        debug!("Query {token} started: {query:?}");

        self.state = State::Pending { token, query };
        token
    }

    /// Drop whatever is in flight without emitting it.
    pub fn abandon(&mut self) {
        if let Some(token) = self.current() {
            debug!("Query {token} abandoned");
        }
        self.state = State::Idle;
    }

    /// Record how many replies the lookup for `token` produced.
    ///
    /// Zero replies finalize immediately with an empty set.
    pub fn submit(&mut self, token: QueryToken, expected: usize) -> Option<ResultSet> {
        let State::Pending { token: pending, .. } = &self.state else {
            trace!("Ignoring reply count for {token}: no lookup pending");
            return None;
        };
        if *pending != token {
            trace!("Ignoring reply count for stale query {token}");
            return None;
        }

        let State::Pending { query, .. } = mem::take(&mut self.state) else {
            return None;
        };
        debug!("Query {token} expects {expected} replies");

        let in_flight = InFlight {
            token,
            query,
            expected,
            hits: Vec::with_capacity(expected),
            failed: 0,
        };

        if expected == 0 {
            return Some(in_flight.finish(false));
        }
        self.state = State::Collecting(in_flight);
        None
    }

    /// The lookup for `token` failed; nothing will be emitted for it.
    pub fn fail(&mut self, token: QueryToken, error: &dyn fmt::Display) {
        if matches!(&self.state, State::Pending { token: pending, .. } if *pending == token) {
            warn!("Lookup for query {token} failed: {error}");
            self.state = State::Idle;
        } else {
            trace!("Ignoring lookup failure for stale query {token}: {error}");
        }
    }

    /// Append a hit; returns the finalized set once every slot is resolved.
    pub fn on_hit_received(&mut self, token: QueryToken, hit: DocumentHit) -> Option<ResultSet> {
        let in_flight = self.collecting(token)?;
        in_flight.hits.push(hit);
        self.finish_if_resolved()
    }

    /// Resolve one slot as empty after a per-document failure.
    pub fn on_hit_error(
        &mut self,
        token: QueryToken,
        error: &dyn fmt::Display,
    ) -> Option<ResultSet> {
        let Some(in_flight) = self.collecting(token) else {
            trace!("Ignoring reply error for {token}: {error}");
            return None;
        };
        warn!("Reply for query {token} failed: {error}");
        in_flight.failed += 1;
        self.finish_if_resolved()
    }

    /// The reply deadline for `token` passed.
    ///
    /// A collecting set is finalized with what arrived so far. A lookup
    /// that never answered is abandoned silently.
    pub fn expire(&mut self, token: QueryToken) -> Option<ResultSet> {
        if !self.is_current(token) {
            trace!("Ignoring deadline for stale query {token}");
            return None;
        }

        match mem::take(&mut self.state) {
            State::Collecting(in_flight) => {
                warn!(
                    "Query {token} timed out with {}/{} replies",
                    in_flight.resolved(),
                    in_flight.expected
                );
                Some(in_flight.finish(true))
            }
            State::Pending { .. } => {
                warn!("Lookup for query {token} timed out");
                None
            }
            State::Idle => None,
        }
    }

    fn collecting(&mut self, token: QueryToken) -> Option<&mut InFlight> {
        match &mut self.state {
            State::Collecting(in_flight) if in_flight.token == token => Some(in_flight),
            _ => {
                trace!("Dropping late reply for query {token}");
                None
            }
        }
    }

    fn finish_if_resolved(&mut self) -> Option<ResultSet> {
        let State::Collecting(in_flight) = &self.state else {
            return None;
        };
        if in_flight.resolved() < in_flight.expected {
            return None;
        }

        let State::Collecting(in_flight) = mem::take(&mut self.state) else {
            return None;
        };
        debug!(
            "Query {} complete: {} hits, {} failed",
            in_flight.token,
            in_flight.hits.len(),
            in_flight.failed
        );
        Some(in_flight.finish(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(n: usize) -> DocumentHit {
        DocumentHit::new(format!("doc {n}"), format!("file:///tmp/{n}.txt"))
    }

    #[test]
    fn test_starts_idle() {
        let aggregator = Aggregator::new();
        assert_eq!(aggregator.phase(), Phase::Idle);
        assert!(aggregator.current().is_none());
    }

    #[test]
    fn test_tokens_increase() {
        let mut aggregator = Aggregator::new();
        let first = aggregator.begin("a");
        let second = aggregator.begin("b");
        assert!(second.generation() > first.generation());
        assert!(aggregator.is_current(second));
        assert!(!aggregator.is_current(first));
        assert_eq!(second.to_string(), format!("#{}", second.generation()));
    }

    #[test]
    fn test_zero_expected_finalizes_empty() {
        let mut aggregator = Aggregator::new();
        let token = aggregator.begin("nothing");
        let set = aggregator.submit(token, 0).unwrap();

        assert!(set.hits.is_empty());
        assert_eq!(set.query, "nothing");
        assert!(!set.timed_out);
        assert_eq!(aggregator.phase(), Phase::Idle);
    }

    #[test]
    fn test_single_hit_finalizes() {
        let mut aggregator = Aggregator::new();
        let token = aggregator.begin("one");
        assert!(aggregator.submit(token, 1).is_none());
        assert_eq!(aggregator.phase(), Phase::Collecting);

        let set = aggregator.on_hit_received(token, hit(0)).unwrap();
        assert_eq!(set.hits, vec![hit(0)]);
        assert_eq!(set.token, token);
    }

    #[test]
    fn test_hit_while_pending_is_ignored() {
        let mut aggregator = Aggregator::new();
        let token = aggregator.begin("q");
        assert!(aggregator.on_hit_received(token, hit(0)).is_none());
        assert_eq!(aggregator.phase(), Phase::Pending);
    }

    #[test]
    fn test_fail_leaves_idle() {
        let mut aggregator = Aggregator::new();
        let token = aggregator.begin("q");
        aggregator.fail(token, &"no daemon");

        assert_eq!(aggregator.phase(), Phase::Idle);
        assert!(aggregator.submit(token, 2).is_none());
    }

    #[test]
    fn test_stale_fail_does_not_touch_current() {
        let mut aggregator = Aggregator::new();
        let old = aggregator.begin("old");
        let new = aggregator.begin("new");
        aggregator.fail(old, &"late failure");
        assert!(aggregator.is_current(new));
        assert_eq!(aggregator.phase(), Phase::Pending);
    }

    #[test]
    fn test_expire_pending_emits_nothing() {
        let mut aggregator = Aggregator::new();
        let token = aggregator.begin("q");
        assert!(aggregator.expire(token).is_none());
        assert_eq!(aggregator.phase(), Phase::Idle);
    }

    #[test]
    fn test_abandon() {
        let mut aggregator = Aggregator::new();
        let token = aggregator.begin("q");
        aggregator.submit(token, 3);
        aggregator.abandon();
        assert_eq!(aggregator.phase(), Phase::Idle);
        assert!(aggregator.on_hit_received(token, hit(0)).is_none());
    }
}
