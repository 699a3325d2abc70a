//! Periodic refresh of the fast-moving resources.
//!
//! A [`Poller`] owns one background task that ticks at a fixed interval and
//! spawns the `status` and `stats` fetches on every tick. Tick spawns are
//! fire-and-forget, so a hung request never delays the next tick. The task
//! stops through a cancellation token, either via [`Poller::stop`] or when
//! the poller is dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::events::SyncEvent;
use crate::fetch::Fetcher;
use crate::resource::Resource;
use crate::traits::SensorApi;

/// Resources refreshed on every poll tick.
pub const POLLED_RESOURCES: [Resource; 2] = [Resource::Status, Resource::Stats];

/// Handle to a running polling task.
#[derive(Debug)]
pub(crate) struct Poller {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
    interval: Duration,
}

impl Poller {
    /// Spawn the polling task. The first tick fires one `period` from now.
    ///
    /// `period` must be non-zero; callers validate it.
    pub(crate) fn spawn<A>(fetcher: Arc<Fetcher<A>>, period: Duration, window_hours: u32) -> Self
    where
        A: SensorApi + 'static,
    {
        let cancel_token = CancellationToken::new();
        let task_token = cancel_token.clone();
        let first_tick = Instant::now() + period;

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(first_tick, period);
            let mut tick: u64 = 0;

            loop {
                tokio::select! {
                    biased;
                    _ = task_token.cancelled() => {
                        debug!("Poller cancelled after {} ticks", tick);
                        break;
                    }
                    _ = ticker.tick() => {
                        tick += 1;
                        debug!("Poll tick {}", tick);
                        fetcher.events.send(SyncEvent::PollTick { tick });

                        for resource in POLLED_RESOURCES {
                            let ticket = fetcher.store.issue();
                            let fetcher = Arc::clone(&fetcher);
                            tokio::spawn(async move {
                                fetcher.run(resource, window_hours, ticket).await;
                            });
                        }
                    }
                }
            }
        });

        Self {
            handle,
            cancel_token,
            interval: period,
        }
    }

    /// Signal the task to stop. Requests already spawned run to completion.
    pub(crate) fn stop(self) {
        self.cancel_token.cancel();
    }

    pub(crate) fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the task is still alive.
    pub(crate) fn is_active(&self) -> bool {
        !self.handle.is_finished() && !self.cancel_token.is_cancelled()
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
