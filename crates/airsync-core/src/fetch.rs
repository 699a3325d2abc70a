//! Per-resource fetchers.
//!
//! A fetch issues one request, settles it against the shared state and
//! reports what happened as a [`FetchOutcome`]. Errors never escape: a
//! failed fetch leaves the stored value untouched and only updates the
//! resource's health entry.

use core::fmt;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::events::{EventDispatcher, SyncEvent};
use crate::resource::Resource;
use crate::state::{StateStore, SyncState, Ticket, WriteResult};
use crate::traits::SensorApi;

/// What happened to a single fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response replaced the stored value.
    Applied,
    /// The request failed; the stored value is unchanged.
    Failed { reason: String },
    /// A newer request had already written this resource.
    Superseded,
    /// The session was deactivated while the request was in flight.
    Suppressed,
}

impl FetchOutcome {
    /// Whether the state now holds this fetch's data.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, FetchOutcome::Applied)
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, FetchOutcome::Failed { .. })
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchOutcome::Applied => write!(f, "applied"),
            FetchOutcome::Failed { reason } => write!(f, "failed: {}", reason),
            FetchOutcome::Superseded => write!(f, "superseded"),
            FetchOutcome::Suppressed => write!(f, "suppressed"),
        }
    }
}

/// The API, the state it writes into, and the event channel it reports to.
pub(crate) struct Fetcher<A> {
    pub(crate) api: A,
    pub(crate) store: StateStore,
    pub(crate) events: EventDispatcher,
}

impl<A: SensorApi> Fetcher<A> {
    pub(crate) fn new(api: A, events: EventDispatcher) -> Self {
        Self {
            api,
            store: StateStore::new(),
            events,
        }
    }

    /// Issue and run a fetch in one go.
    pub(crate) async fn fetch(&self, resource: Resource, hours: u32) -> FetchOutcome {
        let ticket = self.store.issue();
        self.run(resource, hours, ticket).await
    }

    /// Run a fetch whose ticket was taken earlier, e.g. before spawning.
    pub(crate) async fn run(&self, resource: Resource, hours: u32, ticket: Ticket) -> FetchOutcome {
        debug!("Fetching {} (hours={}, ticket={})", resource, hours, ticket.seq);

        match resource {
            Resource::Status => {
                let result = self.api.status().await.map(|status| status.last_data);
                self.settle(resource, ticket, result, |state, reading| {
                    state.latest = Some(reading);
                })
            }
            Resource::History => {
                let result = self.api.history(hours).await.map(|batch| {
                    if !batch.is_consistent() {
                        debug!(
                            "History count {} does not match {} readings",
                            batch.count,
                            batch.data.len()
                        );
                    }
                    batch.into_chronological()
                });
                self.settle(resource, ticket, result, |state, readings| {
                    state.history = readings;
                })
            }
            Resource::Stats => {
                let result = self.api.stats(hours).await.and_then(|stats| {
                    stats
                        .validate()
                        .map(|()| stats)
                        .map_err(|source| Error::Contract { resource, source })
                });
                self.settle(resource, ticket, result, |state, stats| {
                    state.stats = Some(stats);
                })
            }
            Resource::Analysis => {
                let result = self.api.analysis(hours).await.and_then(|analysis| {
                    analysis
                        .validate()
                        .map(|()| analysis)
                        .map_err(|source| Error::Contract { resource, source })
                });
                self.settle(resource, ticket, result, |state, analysis| {
                    state.analysis = Some(analysis);
                })
            }
        }
    }

    fn settle<T, F>(
        &self,
        resource: Resource,
        ticket: Ticket,
        result: Result<T>,
        write: F,
    ) -> FetchOutcome
    where
        F: FnOnce(&mut SyncState, T),
    {
        match result {
            Ok(value) => match self.store.apply(resource, ticket, |state| write(state, value)) {
                WriteResult::Applied => {
                    self.events.send(SyncEvent::Updated { resource });
                    FetchOutcome::Applied
                }
                WriteResult::Superseded => {
                    debug!("Dropping superseded {} response (ticket={})", resource, ticket.seq);
                    self.events.send(SyncEvent::Superseded { resource });
                    FetchOutcome::Superseded
                }
                WriteResult::Suppressed => {
                    debug!("Dropping {} response after deactivation", resource);
                    self.events.send(SyncEvent::Suppressed { resource });
                    FetchOutcome::Suppressed
                }
            },
            Err(e) => {
                let reason = e.to_string();
                if e.is_no_data() {
                    debug!("No {} data from {}: {}", resource, self.api.source(), reason);
                } else {
                    warn!("Failed to fetch {} from {}: {}", resource, self.api.source(), reason);
                }

                if self.store.fail(resource, ticket, &reason) {
                    self.events.send(SyncEvent::FetchFailed {
                        resource,
                        reason: reason.clone(),
                    });
                }
                FetchOutcome::Failed { reason }
            }
        }
    }
}
