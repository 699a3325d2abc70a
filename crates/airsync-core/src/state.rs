//! Shared sync state.
//!
//! [`SyncState`] holds the latest value of each resource plus the `loading`
//! and `error` flags. It lives inside a [`tokio::sync::watch`] channel:
//!
//! - **Readers** borrow the current value, clone a snapshot, or subscribe to
//!   change notifications. Any number of readers is fine.
//! - **Writers** are the fetchers and the orchestrator only. Every write
//!   replaces whole fields inside a single `send_modify`/`send_if_modified`
//!   call, so a reader sees a field either fully formed or unchanged.
//!
//! Two counters guard against stale writes:
//!
//! - Each request takes a [`Ticket`] when it is issued. A response is only
//!   stored if its ticket is newer than the last one applied to that field,
//!   so an older request that finishes late cannot overwrite newer data.
//! - Deactivating a session bumps the generation. Responses issued under an
//!   older generation are dropped.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::watch;

use airsync_types::{AnalysisSnapshot, SensorReading, StatsSnapshot};

use crate::resource::Resource;

/// Latest known values of every resource.
///
/// Created empty. Values survive deactivation; they are only ever replaced
/// by a newer successful fetch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncState {
    /// Most recent reading from `/status`.
    pub latest: Option<SensorReading>,
    /// Readings from `/history`, oldest first.
    pub history: Vec<SensorReading>,
    /// Latest `/stats` snapshot.
    pub stats: Option<StatsSnapshot>,
    /// Latest `/analysis` snapshot.
    pub analysis: Option<AnalysisSnapshot>,
    /// `true` while a full refresh is in flight.
    pub loading: bool,
    /// Set when the last full refresh failed outright.
    pub error: Option<String>,
    /// Outcome of the most recent attempt per resource.
    pub health: HealthMap,
    #[serde(skip)]
    applied: [u64; 4],
    #[serde(skip)]
    settled: [u64; 4],
    #[serde(skip)]
    generation: u64,
}

impl SyncState {
    /// Whether no resource has been fetched successfully yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.latest.is_none()
            && self.history.is_empty()
            && self.stats.is_none()
            && self.analysis.is_none()
    }

    /// Health of a single resource.
    #[must_use]
    pub fn health(&self, resource: Resource) -> &ResourceHealth {
        self.health.get(resource)
    }
}

/// Result of the most recent fetch attempts for one resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResourceHealth {
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_success_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_failure_at: Option<OffsetDateTime>,
    /// Reason for the most recent failure. Cleared on success.
    pub last_error: Option<String>,
    /// Failures since the last success.
    pub consecutive_failures: u32,
}

impl ResourceHealth {
    /// Whether the stored value is older than the last attempt, i.e. the
    /// most recent attempt failed.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.consecutive_failures > 0
    }

    fn record_success(&mut self, at: OffsetDateTime) {
        self.last_success_at = Some(at);
        self.last_error = None;
        self.consecutive_failures = 0;
    }

    fn record_failure(&mut self, at: OffsetDateTime, reason: String) {
        self.last_failure_at = Some(at);
        self.last_error = Some(reason);
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
    }
}

/// Per-resource health entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HealthMap {
    pub status: ResourceHealth,
    pub history: ResourceHealth,
    pub stats: ResourceHealth,
    pub analysis: ResourceHealth,
}

impl HealthMap {
    /// Health entry for a resource.
    #[must_use]
    pub fn get(&self, resource: Resource) -> &ResourceHealth {
        match resource {
            Resource::Status => &self.status,
            Resource::History => &self.history,
            Resource::Stats => &self.stats,
            Resource::Analysis => &self.analysis,
        }
    }

    fn get_mut(&mut self, resource: Resource) -> &mut ResourceHealth {
        match resource {
            Resource::Status => &mut self.status,
            Resource::History => &mut self.history,
            Resource::Stats => &mut self.stats,
            Resource::Analysis => &mut self.analysis,
        }
    }

    /// Iterate `(resource, health)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Resource, &ResourceHealth)> + '_ {
        Resource::ALL.into_iter().map(move |r| (r, self.get(r)))
    }
}

/// Issue stamp of a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    /// Monotonic issue order across all requests of one client.
    pub seq: u64,
    /// Session generation the request was issued under.
    pub generation: u64,
}

/// What happened to a response when it reached the state container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteResult {
    Applied,
    /// A newer request already wrote this field.
    Superseded,
    /// The session was deactivated after this request was issued.
    Suppressed,
}

/// Owner of the watch channel and the issue counter.
#[derive(Debug)]
pub(crate) struct StateStore {
    tx: watch::Sender<SyncState>,
    tickets: AtomicU64,
}

impl StateStore {
    pub(crate) fn new() -> Self {
        let (tx, _) = watch::channel(SyncState::default());
        Self {
            tx,
            tickets: AtomicU64::new(0),
        }
    }

    pub(crate) fn borrow(&self) -> watch::Ref<'_, SyncState> {
        self.tx.borrow()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.tx.subscribe()
    }

    /// Stamp a request at issue time.
    pub(crate) fn issue(&self) -> Ticket {
        let seq = self.tickets.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = self.tx.borrow().generation;
        Ticket { seq, generation }
    }

    /// Invalidate every request issued so far. Stored values are kept.
    pub(crate) fn invalidate(&self) -> u64 {
        let mut current = 0;
        self.tx.send_if_modified(|state| {
            state.generation += 1;
            current = state.generation;
            false
        });
        current
    }

    /// Store a successful response if it is still the freshest one.
    pub(crate) fn apply<F>(&self, resource: Resource, ticket: Ticket, write: F) -> WriteResult
    where
        F: FnOnce(&mut SyncState),
    {
        let idx = resource.index();
        let now = OffsetDateTime::now_utc();
        let mut result = WriteResult::Applied;

        self.tx.send_if_modified(|state| {
            if state.generation != ticket.generation {
                result = WriteResult::Suppressed;
                return false;
            }
            if ticket.seq <= state.applied[idx] {
                result = WriteResult::Superseded;
                return false;
            }

            write(state);
            state.applied[idx] = ticket.seq;
            if ticket.seq > state.settled[idx] {
                state.settled[idx] = ticket.seq;
                state.health.get_mut(resource).record_success(now);
            }
            true
        });

        result
    }

    /// Record a failed attempt. The field itself is left untouched.
    ///
    /// Returns `false` when the failure was not recorded because a newer
    /// attempt already settled or the session was deactivated.
    pub(crate) fn fail(&self, resource: Resource, ticket: Ticket, reason: &str) -> bool {
        let idx = resource.index();
        let now = OffsetDateTime::now_utc();

        self.tx.send_if_modified(|state| {
            if state.generation != ticket.generation || ticket.seq <= state.settled[idx] {
                return false;
            }
            state.settled[idx] = ticket.seq;
            state
                .health
                .get_mut(resource)
                .record_failure(now, reason.to_string());
            true
        })
    }

    /// Start a full refresh: raise `loading` and clear `error`.
    pub(crate) fn begin_loading(&self) {
        self.tx.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });
    }

    /// Finish a full refresh, recording a batch-level failure if any.
    pub(crate) fn end_loading(&self, error: Option<String>) {
        self.tx.send_modify(|state| {
            state.loading = false;
            if error.is_some() {
                state.error = error;
            }
        });
    }
}
