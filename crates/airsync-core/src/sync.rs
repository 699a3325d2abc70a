//! The sync client: shared state, refresh orchestration and polling.
//!
//! [`SyncClient`] is the consumer-facing surface. It owns the state
//! container and hands out snapshots, change subscriptions and events.
//! Fetches can be triggered one resource at a time, all at once with
//! [`refresh_all`](SyncClient::refresh_all), or periodically with
//! [`start_polling`](SyncClient::start_polling).
//!
//! Cloning a `SyncClient` is cheap; clones share state and the poller.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::watch;
use tracing::{debug, error, info};

use airsync_types::DEFAULT_WINDOW_HOURS;

use crate::error::{Error, Result};
use crate::events::{EventDispatcher, EventReceiver, SyncEvent};
use crate::fetch::{FetchOutcome, Fetcher};
use crate::poller::Poller;
use crate::resource::Resource;
use crate::session::ActiveSession;
use crate::state::SyncState;
use crate::traits::SensorApi;

/// Message stored in [`SyncState::error`] when a full refresh fails as a
/// whole.
pub const BATCH_FAILED_MESSAGE: &str = "data load failed";

/// Options for a [`SyncClient`].
///
/// ```
/// use std::time::Duration;
/// use airsync_core::SyncOptions;
///
/// let options = SyncOptions::builder()
///     .poll_interval(Duration::from_secs(10))
///     .window_hours(6)
///     .build();
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// Interval between poll ticks.
    /// Default: 5 seconds.
    pub poll_interval: Duration,
    /// Window used by full refreshes and poll ticks.
    /// Default: 24 hours.
    pub window_hours: u32,
    /// Capacity of the event channel.
    /// Default: 64 events.
    pub event_buffer: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(5000),
            window_hours: DEFAULT_WINDOW_HOURS,
            event_buffer: 64,
        }
    }
}

impl SyncOptions {
    /// Create a new builder for SyncOptions.
    pub fn builder() -> SyncOptionsBuilder {
        SyncOptionsBuilder::default()
    }

    /// Validate the options and return an error if invalid.
    ///
    /// Checks that:
    /// - `poll_interval` is > 0
    /// - `event_buffer` is > 0
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(Error::InvalidConfig("poll_interval must be > 0".to_string()));
        }
        if self.event_buffer == 0 {
            return Err(Error::InvalidConfig("event_buffer must be > 0".to_string()));
        }
        Ok(())
    }
}

/// Builder for SyncOptions.
#[derive(Debug, Clone, Default)]
pub struct SyncOptionsBuilder {
    options: SyncOptions,
}

impl SyncOptionsBuilder {
    /// Set the polling interval.
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.options.poll_interval = interval;
        self
    }

    /// Set the window in hours. Zero is passed to the service as is.
    #[must_use]
    pub fn window_hours(mut self, hours: u32) -> Self {
        self.options.window_hours = hours;
        self
    }

    /// Set the event channel capacity.
    #[must_use]
    pub fn event_buffer(mut self, size: usize) -> Self {
        self.options.event_buffer = size;
        self
    }

    /// Build the SyncOptions.
    #[must_use]
    pub fn build(self) -> SyncOptions {
        self.options
    }
}

/// Per-resource outcomes of one [`refresh_all`](SyncClient::refresh_all).
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    /// One entry per resource, in [`Resource::ALL`] order.
    pub outcomes: Vec<(Resource, FetchOutcome)>,
    /// Batch-level failure, mirrored into [`SyncState::error`].
    pub error: Option<String>,
}

impl BatchReport {
    /// Outcome for a single resource.
    #[must_use]
    pub fn outcome(&self, resource: Resource) -> Option<&FetchOutcome> {
        self.outcomes
            .iter()
            .find(|(r, _)| *r == resource)
            .map(|(_, outcome)| outcome)
    }

    /// Number of resources whose data was stored.
    #[must_use]
    pub fn applied(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_applied()).count()
    }

    /// Resources that failed, with their reasons.
    pub fn failures(&self) -> impl Iterator<Item = (Resource, &str)> + '_ {
        self.outcomes.iter().filter_map(|(resource, outcome)| match outcome {
            FetchOutcome::Failed { reason } => Some((*resource, reason.as_str())),
            _ => None,
        })
    }

    /// Whether every resource was stored and the batch did not fail.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.error.is_none() && self.applied() == self.outcomes.len()
    }
}

/// Raises `loading` for one full refresh and lowers it exactly once, on
/// [`finish`](Self::finish) or when dropped unfinished.
struct LoadingGuard<'a, A: SensorApi> {
    fetcher: &'a Fetcher<A>,
    done: bool,
}

impl<'a, A: SensorApi> LoadingGuard<'a, A> {
    fn begin(fetcher: &'a Fetcher<A>) -> Self {
        fetcher.store.begin_loading();
        fetcher.events.send(SyncEvent::LoadingChanged { loading: true });
        Self {
            fetcher,
            done: false,
        }
    }

    fn finish(mut self, error: Option<String>) {
        self.end(error);
    }

    fn end(&mut self, error: Option<String>) {
        if self.done {
            return;
        }
        self.done = true;
        self.fetcher.store.end_loading(error);
        self.fetcher
            .events
            .send(SyncEvent::LoadingChanged { loading: false });
    }
}

impl<A: SensorApi> Drop for LoadingGuard<'_, A> {
    fn drop(&mut self) {
        if !self.done {
            debug!("Full refresh dropped before completion");
            self.end(None);
        }
    }
}

/// Keeps a local copy of the service's data in sync.
///
/// # Example
///
/// ```no_run
/// use airsync_core::{ServiceClient, SyncClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let sync = SyncClient::new(ServiceClient::new("http://localhost:8080")?);
///
/// let report = sync.refresh_all().await;
/// println!("{} of 4 resources loaded", report.applied());
///
/// if let Some(latest) = &sync.state().latest {
///     println!("CO2: {} ppm", latest.co2);
/// }
/// # Ok(())
/// # }
/// ```
pub struct SyncClient<A: SensorApi + 'static> {
    fetcher: Arc<Fetcher<A>>,
    options: SyncOptions,
    poller: Arc<Mutex<Option<Poller>>>,
}

impl<A: SensorApi + 'static> Clone for SyncClient<A> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            options: self.options.clone(),
            poller: Arc::clone(&self.poller),
        }
    }
}

impl<A: SensorApi + 'static> std::fmt::Debug for SyncClient<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncClient")
            .field("source", &self.fetcher.api.source())
            .field("options", &self.options)
            .field("polling", &self.is_polling())
            .finish()
    }
}

impl<A: SensorApi + 'static> SyncClient<A> {
    /// Create a client with default options.
    pub fn new(api: A) -> Self {
        let options = SyncOptions::default();
        let events = EventDispatcher::new(options.event_buffer);
        Self {
            fetcher: Arc::new(Fetcher::new(api, events)),
            options,
            poller: Arc::new(Mutex::new(None)),
        }
    }

    /// Create a client with custom options.
    pub fn with_options(api: A, options: SyncOptions) -> Result<Self> {
        options.validate()?;
        let events = EventDispatcher::new(options.event_buffer);
        Ok(Self {
            fetcher: Arc::new(Fetcher::new(api, events)),
            options,
            poller: Arc::new(Mutex::new(None)),
        })
    }

    /// The options this client was built with.
    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// The underlying API.
    pub fn api(&self) -> &A {
        &self.fetcher.api
    }

    // --- State access ---

    /// Borrow the current state.
    ///
    /// Holds a read lock on the state; do not keep it across `.await`.
    pub fn state(&self) -> watch::Ref<'_, SyncState> {
        self.fetcher.store.borrow()
    }

    /// Clone the current state.
    pub fn snapshot(&self) -> SyncState {
        self.fetcher.store.borrow().clone()
    }

    /// Receive a notification on every state change.
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.fetcher.store.subscribe()
    }

    /// Receive [`SyncEvent`]s.
    pub fn events(&self) -> EventReceiver {
        self.fetcher.events.subscribe()
    }

    // --- Single-resource refreshes ---

    /// Fetch the latest reading.
    pub async fn refresh_status(&self) -> FetchOutcome {
        self.fetcher.fetch(Resource::Status, 0).await
    }

    /// Fetch readings from the last `hours`.
    pub async fn refresh_history(&self, hours: u32) -> FetchOutcome {
        self.fetcher.fetch(Resource::History, hours).await
    }

    /// Fetch statistics over the last `hours`.
    pub async fn refresh_stats(&self, hours: u32) -> FetchOutcome {
        self.fetcher.fetch(Resource::Stats, hours).await
    }

    /// Fetch the analysis over the last `hours`.
    pub async fn refresh_analysis(&self, hours: u32) -> FetchOutcome {
        self.fetcher.fetch(Resource::Analysis, hours).await
    }

    /// Fetch all four resources concurrently and wait for every one to
    /// settle.
    ///
    /// `loading` is raised for the duration and `error` is cleared at the
    /// start. Individual fetch failures are reported in the returned
    /// [`BatchReport`] and do not fail the batch; only a fetch task that
    /// dies sets `error`. Overlapping calls are allowed.
    ///
    /// Dropping the returned future early still lowers `loading`; the
    /// spawned fetches run to completion and are applied as usual.
    pub async fn refresh_all(&self) -> BatchReport {
        let store = &self.fetcher.store;
        let events = &self.fetcher.events;
        let hours = self.options.window_hours;

        debug!("Refreshing all resources from {}", self.fetcher.api.source());
        let loading = LoadingGuard::begin(&*self.fetcher);

        let mut tickets = Vec::with_capacity(Resource::ALL.len());
        let mut handles = Vec::with_capacity(Resource::ALL.len());
        for resource in Resource::ALL {
            let ticket = store.issue();
            let fetcher = Arc::clone(&self.fetcher);
            tickets.push(ticket);
            handles.push(tokio::spawn(async move {
                fetcher.run(resource, hours, ticket).await
            }));
        }

        let mut outcomes = Vec::with_capacity(Resource::ALL.len());
        let mut escaped = false;
        let joined = join_all(handles).await;
        for ((resource, ticket), result) in Resource::ALL.into_iter().zip(tickets).zip(joined) {
            match result {
                Ok(outcome) => outcomes.push((resource, outcome)),
                Err(e) => {
                    error!("{} fetch task failed: {}", resource, e);
                    escaped = true;
                    let reason = format!("fetch task failed: {}", e);
                    store.fail(resource, ticket, &reason);
                    outcomes.push((resource, FetchOutcome::Failed { reason }));
                }
            }
        }

        let error = escaped.then(|| BATCH_FAILED_MESSAGE.to_string());
        if let Some(message) = &error {
            events.send(SyncEvent::BatchFailed {
                message: message.clone(),
            });
        }
        loading.finish(error.clone());

        BatchReport { outcomes, error }
    }

    // --- Polling ---

    /// Start refreshing `status` and `stats` every `interval`.
    ///
    /// Any running poller is stopped first, so at most one is ever active.
    /// The first tick fires one `interval` after this call. Must be called
    /// from within a tokio runtime.
    pub fn start_polling(&self, interval: Duration) -> Result<()> {
        if interval.is_zero() {
            return Err(Error::InvalidConfig("poll interval must be > 0".to_string()));
        }

        let mut slot = self.lock_poller();
        if let Some(previous) = slot.take() {
            debug!("Replacing poller running every {:?}", previous.interval());
            previous.stop();
            self.fetcher.events.send(SyncEvent::PollingStopped);
        }

        *slot = Some(Poller::spawn(
            Arc::clone(&self.fetcher),
            interval,
            self.options.window_hours,
        ));
        info!("Polling {} every {:?}", self.fetcher.api.source(), interval);
        self.fetcher.events.send(SyncEvent::PollingStarted { interval });
        Ok(())
    }

    /// Stop polling. Does nothing when not polling.
    ///
    /// Requests already in flight still complete and are applied.
    pub fn stop_polling(&self) {
        if let Some(poller) = self.lock_poller().take() {
            poller.stop();
            info!("Polling stopped");
            self.fetcher.events.send(SyncEvent::PollingStopped);
        }
    }

    /// Whether a poller is running.
    pub fn is_polling(&self) -> bool {
        self.lock_poller().as_ref().is_some_and(Poller::is_active)
    }

    /// Interval of the running poller, if any.
    pub fn polling_interval(&self) -> Option<Duration> {
        self.lock_poller().as_ref().map(Poller::interval)
    }

    // --- Lifecycle ---

    /// Start a session: one full refresh, then polling at the configured
    /// interval.
    ///
    /// The returned guard stops polling and discards late responses when it
    /// is dropped or [`deactivate`](ActiveSession::deactivate)d. If this
    /// future is dropped before completing, the session is deactivated too.
    pub async fn activate(&self) -> Result<ActiveSession<A>> {
        let session = ActiveSession::new(self.clone());
        self.refresh_all().await;
        self.start_polling(self.options.poll_interval)?;
        Ok(session)
    }

    pub(crate) fn on_activate(&self) {
        info!("Session activated for {}", self.fetcher.api.source());
        self.fetcher.events.send(SyncEvent::Activated);
    }

    pub(crate) fn on_deactivate(&self) {
        self.stop_polling();
        let generation = self.fetcher.store.invalidate();
        info!("Session deactivated (generation {})", generation);
        self.fetcher.events.send(SyncEvent::Deactivated);
    }

    fn lock_poller(&self) -> MutexGuard<'_, Option<Poller>> {
        self.poller.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
