//! Session guard that stops syncing when the consumer goes away.
//!
//! An [`ActiveSession`] is returned by
//! [`SyncClient::activate`](crate::SyncClient::activate). Dropping it, or
//! calling [`deactivate`](ActiveSession::deactivate), stops polling and
//! makes every request still in flight a no-op. Stored values are kept, so
//! a later activation starts from the last known data.

use std::ops::Deref;

use crate::sync::SyncClient;
use crate::traits::SensorApi;

/// A guard that deactivates the sync client when dropped.
///
/// # Example
///
/// ```no_run
/// use airsync_core::{ServiceClient, SyncClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let sync = SyncClient::new(ServiceClient::new("http://localhost:8080")?);
/// let session = sync.activate().await?;
///
/// // Use the client through the guard
/// let mut changes = session.subscribe();
/// changes.changed().await?;
///
/// // Polling stops when the guard goes out of scope
/// drop(session);
/// # Ok(())
/// # }
/// ```
pub struct ActiveSession<A: SensorApi + 'static> {
    client: SyncClient<A>,
    active: bool,
}

impl<A: SensorApi + 'static> ActiveSession<A> {
    pub(crate) fn new(client: SyncClient<A>) -> Self {
        client.on_activate();
        Self {
            client,
            active: true,
        }
    }

    /// The client this session belongs to.
    pub fn client(&self) -> &SyncClient<A> {
        &self.client
    }

    /// Stop polling and discard late responses.
    pub fn deactivate(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if std::mem::take(&mut self.active) {
            self.client.on_deactivate();
        }
    }
}

impl<A: SensorApi + 'static> Deref for ActiveSession<A> {
    type Target = SyncClient<A>;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}

impl<A: SensorApi + 'static> std::fmt::Debug for ActiveSession<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveSession")
            .field("client", &self.client)
            .field("active", &self.active)
            .finish()
    }
}

impl<A: SensorApi + 'static> Drop for ActiveSession<A> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::SyncEvent;
    use crate::mock::MockApi;

    #[tokio::test]
    async fn test_deactivate_runs_once() {
        let sync = SyncClient::new(MockApi::new());
        let mut events = sync.events();

        let session = sync.activate().await.unwrap();
        assert!(session.is_polling());
        session.deactivate();
        assert!(!sync.is_polling());

        let mut deactivations = 0;
        while let Ok(event) = events.try_recv() {
            if event == SyncEvent::Deactivated {
                deactivations += 1;
            }
        }
        assert_eq!(deactivations, 1);
    }

    #[tokio::test]
    async fn test_drop_stops_polling_and_keeps_values() {
        let sync = SyncClient::new(MockApi::new());
        {
            let _session = sync.activate().await.unwrap();
            assert!(sync.is_polling());
        }
        assert!(!sync.is_polling());
        assert!(sync.state().latest.is_some());
    }
}
