//! Behavior of the sync client against the in-memory mock service.
//!
//! Timing-sensitive tests run on a paused clock and move time forward
//! explicitly with `tokio::time::advance`.

use std::time::Duration;

use airsync_core::mock::fixtures;
use airsync_core::{
    BATCH_FAILED_MESSAGE, FetchOutcome, MockApi, Resource, SyncClient, SyncEvent, SyncOptions,
};

/// Let spawned tasks run until they block on time or I/O.
async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

async fn advance(ms: u64) {
    tokio::time::advance(Duration::from_millis(ms)).await;
    settle().await;
}

fn drain(events: &mut airsync_core::EventReceiver) -> Vec<SyncEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}

// ==========================================================================
// Fetchers
// ==========================================================================

#[tokio::test]
async fn test_status_failure_leaves_latest_and_error_unchanged() {
    let sync = SyncClient::new(MockApi::new());
    sync.refresh_all().await;
    let before = sync.snapshot();
    assert!(before.latest.is_some());
    assert!(before.error.is_none());

    sync.api().set_failure(Resource::Status, Some(500));
    let outcome = sync.refresh_status().await;

    assert!(outcome.is_failed());
    let after = sync.snapshot();
    assert_eq!(after.latest, before.latest);
    assert_eq!(after.error, None);
    assert!(after.health.status.is_stale());
    assert!(!after.health.stats.is_stale());
}

#[tokio::test]
async fn test_history_from_newest_first_fixture_is_ascending() {
    let sync = SyncClient::new(MockApi::new());
    let wire = fixtures::sample_history(30);
    assert!(wire[0].created_at > wire[29].created_at);
    sync.api().set_history(wire).await;

    assert_eq!(sync.refresh_history(24).await, FetchOutcome::Applied);

    let state = sync.state();
    assert_eq!(state.history.len(), 30);
    assert!(
        state
            .history
            .windows(2)
            .all(|w| w[0].created_at <= w[1].created_at)
    );
}

#[tokio::test]
async fn test_analysis_passes_through_unchanged() {
    let mut analysis = fixtures::sample_analysis(24);
    analysis.peak_hours.pm25.hour = 14;
    let sync = SyncClient::new(MockApi::builder().analysis(analysis.clone()).build());

    sync.refresh_analysis(24).await;

    let state = sync.state();
    assert_eq!(state.analysis.as_ref(), Some(&analysis));
    assert_eq!(
        state.analysis.as_ref().map(|a| a.peak_hours.pm25.hour),
        Some(14)
    );
}

#[tokio::test]
async fn test_stats_rounded_outside_min_max_are_stored() {
    let mut stats = fixtures::sample_stats(24);
    stats.stats.hcho.min = 0.05;
    stats.stats.hcho.max = 0.05;
    stats.stats.hcho.median = 0.05;
    stats.stats.hcho.avg = 0.04;
    stats.stats.hcho.count = 6;
    let sync = SyncClient::new(MockApi::builder().stats(stats.clone()).build());

    assert_eq!(sync.refresh_stats(24).await, FetchOutcome::Applied);
    assert_eq!(sync.state().stats.as_ref(), Some(&stats));
    assert!(!sync.state().health.stats.is_stale());
}

#[tokio::test]
async fn test_window_defaults_and_overrides() {
    let sync = SyncClient::with_options(
        MockApi::new(),
        SyncOptions::builder().window_hours(6).build(),
    )
    .unwrap();

    sync.refresh_all().await;
    assert_eq!(sync.api().last_hours(), Some(6));

    sync.refresh_stats(168).await;
    assert_eq!(sync.api().last_hours(), Some(168));
}

#[tokio::test(start_paused = true)]
async fn test_older_response_cannot_overwrite_newer() {
    let sync = SyncClient::new(MockApi::new());
    sync.api()
        .set_latency(Resource::Stats, Duration::from_millis(500));

    let slow = tokio::spawn({
        let sync = sync.clone();
        async move { sync.refresh_stats(24).await }
    });
    settle().await;

    sync.api().set_latency(Resource::Stats, Duration::ZERO);
    sync.api().set_stats(Some(fixtures::sample_stats(6))).await;
    assert_eq!(sync.refresh_stats(6).await, FetchOutcome::Applied);

    assert_eq!(slow.await.unwrap(), FetchOutcome::Superseded);
    assert_eq!(sync.state().stats.as_ref().map(|s| s.hours), Some(6));
}

// ==========================================================================
// Orchestrator
// ==========================================================================

#[tokio::test]
async fn test_refresh_all_flips_loading_once_when_everything_fails() {
    let sync = SyncClient::new(MockApi::new());
    sync.api().fail_all(Some(500));
    let mut events = sync.events();
    assert!(!sync.state().loading);

    let report = sync.refresh_all().await;

    let loading: Vec<bool> = drain(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            SyncEvent::LoadingChanged { loading } => Some(loading),
            _ => None,
        })
        .collect();
    assert_eq!(loading, vec![true, false]);

    let state = sync.snapshot();
    assert!(!state.loading);
    assert!(state.error.is_none());
    assert!(state.is_empty());
    assert_eq!(report.failures().count(), 4);
    assert!(report.error.is_none());
}

#[tokio::test]
async fn test_loading_is_visible_while_refreshing() {
    let sync = SyncClient::new(MockApi::new());
    let mut changes = sync.subscribe();

    let refresh = tokio::spawn({
        let sync = sync.clone();
        async move { sync.refresh_all().await }
    });

    changes.changed().await.unwrap();
    assert!(changes.borrow_and_update().loading);

    refresh.await.unwrap();
    assert!(!sync.state().loading);
}

#[tokio::test]
async fn test_refresh_all_reports_every_resource() {
    let sync = SyncClient::new(MockApi::new());
    sync.api().set_failure(Resource::Analysis, Some(503));

    let report = sync.refresh_all().await;

    let order: Vec<Resource> = report.outcomes.iter().map(|(r, _)| *r).collect();
    assert_eq!(order, Resource::ALL.to_vec());
    assert_eq!(report.applied(), 3);
    assert!(report.outcome(Resource::Analysis).unwrap().is_failed());
    assert!(sync.state().error.is_none());
}

#[tokio::test]
async fn test_panicking_fetch_fails_the_batch() {
    let sync = SyncClient::new(MockApi::new());
    sync.api().set_panic(Resource::History, true);

    let report = sync.refresh_all().await;

    assert_eq!(report.error.as_deref(), Some(BATCH_FAILED_MESSAGE));
    assert_eq!(report.applied(), 3);
    let state = sync.snapshot();
    assert_eq!(state.error.as_deref(), Some("data load failed"));
    assert!(!state.loading);
    assert!(state.latest.is_some());
    assert!(state.history.is_empty());
    assert!(state.health.history.is_stale());

    // The next batch starts with a clean error
    sync.api().set_panic(Resource::History, false);
    let report = sync.refresh_all().await;
    assert!(report.is_complete());
    assert!(sync.state().error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_batches_keep_newest_data() {
    let sync = SyncClient::new(MockApi::new());
    sync.api()
        .set_latency(Resource::Status, Duration::from_millis(800));

    let first = tokio::spawn({
        let sync = sync.clone();
        async move { sync.refresh_all().await }
    });
    settle().await;

    sync.api().set_latency(Resource::Status, Duration::ZERO);
    sync.api()
        .set_status(Some(fixtures::sample_reading(500, fixtures::anchor())))
        .await;
    let second = sync.refresh_all().await;
    assert_eq!(second.outcome(Resource::Status), Some(&FetchOutcome::Applied));

    let first = first.await.unwrap();
    assert_eq!(first.outcome(Resource::Status), Some(&FetchOutcome::Superseded));
    assert_eq!(sync.state().latest.as_ref().map(|r| r.id), Some(500));
    assert!(!sync.state().loading);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_refresh_all_lowers_loading() {
    let sync = SyncClient::new(MockApi::new());
    sync.api()
        .set_latency(Resource::History, Duration::from_millis(500));
    let mut events = sync.events();

    let result = tokio::time::timeout(Duration::from_millis(100), sync.refresh_all()).await;
    assert!(result.is_err());
    assert!(!sync.state().loading);

    // The fetches still land after the caller gave up
    advance(5000).await;
    let state = sync.snapshot();
    assert!(!state.loading);
    assert_eq!(state.history.len(), 12);

    let loading: Vec<bool> = drain(&mut events)
        .into_iter()
        .filter_map(|event| match event {
            SyncEvent::LoadingChanged { loading } => Some(loading),
            _ => None,
        })
        .collect();
    assert_eq!(loading, vec![true, false]);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_activate_lowers_loading_and_deactivates() {
    let sync = SyncClient::new(MockApi::new());
    sync.api()
        .set_latency(Resource::History, Duration::from_millis(500));

    let result = tokio::time::timeout(Duration::from_millis(100), sync.activate()).await;
    assert!(result.is_err());

    advance(5000).await;
    let state = sync.snapshot();
    assert!(!state.loading);
    assert!(!sync.is_polling());
    assert!(state.history.is_empty());
}

// ==========================================================================
// Polling
// ==========================================================================

#[tokio::test]
async fn test_stop_before_start_is_a_noop() {
    let sync = SyncClient::new(MockApi::new());
    let mut events = sync.events();

    sync.stop_polling();
    sync.stop_polling();

    assert!(!sync.is_polling());
    assert!(drain(&mut events).is_empty());
}

#[tokio::test]
async fn test_zero_interval_is_rejected() {
    let sync = SyncClient::new(MockApi::new());
    assert!(sync.start_polling(Duration::ZERO).is_err());
    assert!(!sync.is_polling());
}

#[tokio::test(start_paused = true)]
async fn test_restart_keeps_a_single_timer() {
    let sync = SyncClient::new(MockApi::new());
    let mut events = sync.events();

    sync.start_polling(Duration::from_millis(1000)).unwrap();
    sync.start_polling(Duration::from_millis(1000)).unwrap();
    settle().await;

    for _ in 0..5 {
        advance(500).await;
    }

    let ticks = drain(&mut events)
        .into_iter()
        .filter(|e| matches!(e, SyncEvent::PollTick { .. }))
        .count();
    assert_eq!(ticks, 2);
    assert_eq!(sync.api().call_count(Resource::Status), 2);
    assert_eq!(sync.api().call_count(Resource::Stats), 2);
    assert_eq!(sync.api().call_count(Resource::History), 0);
    assert_eq!(sync.api().call_count(Resource::Analysis), 0);

    sync.stop_polling();
}

#[tokio::test(start_paused = true)]
async fn test_stop_polling_lets_in_flight_requests_land() {
    let sync = SyncClient::new(MockApi::new());
    sync.api().set_latency_all(Duration::from_millis(300));

    sync.start_polling(Duration::from_millis(100)).unwrap();
    settle().await;
    advance(100).await;
    sync.stop_polling();
    assert!(!sync.is_polling());

    advance(300).await;
    assert!(sync.state().latest.is_some());
    assert!(sync.state().stats.is_some());
    assert_eq!(sync.api().call_count(Resource::Status), 1);
}

#[tokio::test(start_paused = true)]
async fn test_polling_uses_new_interval_after_restart() {
    let sync = SyncClient::new(MockApi::new());
    sync.start_polling(Duration::from_millis(1000)).unwrap();
    sync.start_polling(Duration::from_millis(250)).unwrap();
    assert_eq!(sync.polling_interval(), Some(Duration::from_millis(250)));
    settle().await;

    for _ in 0..4 {
        advance(250).await;
    }
    assert_eq!(sync.api().call_count(Resource::Status), 4);
    sync.stop_polling();
}

// ==========================================================================
// Sessions
// ==========================================================================

#[tokio::test(start_paused = true)]
async fn test_activate_refreshes_then_polls() {
    let sync = SyncClient::with_options(
        MockApi::new(),
        SyncOptions::builder()
            .poll_interval(Duration::from_millis(2000))
            .build(),
    )
    .unwrap();

    let session = sync.activate().await.unwrap();
    assert_eq!(sync.api().call_count(Resource::History), 1);
    assert_eq!(sync.api().call_count(Resource::Status), 1);
    assert!(session.is_polling());

    advance(2000).await;
    assert_eq!(sync.api().call_count(Resource::Status), 2);
    assert_eq!(sync.api().call_count(Resource::History), 1);

    drop(session);
    advance(10_000).await;
    assert_eq!(sync.api().call_count(Resource::Status), 2);
}

#[tokio::test(start_paused = true)]
async fn test_late_response_after_deactivate_is_suppressed() {
    let sync = SyncClient::new(MockApi::new());
    let session = sync.activate().await.unwrap();
    let before = sync.snapshot();

    sync.api()
        .set_latency(Resource::Analysis, Duration::from_secs(1));
    sync.api()
        .set_analysis(Some(fixtures::sample_analysis(48)))
        .await;
    let late = tokio::spawn({
        let sync = sync.clone();
        async move { sync.refresh_analysis(48).await }
    });
    settle().await;

    session.deactivate();

    assert_eq!(late.await.unwrap(), FetchOutcome::Suppressed);
    let after = sync.snapshot();
    assert_eq!(after.analysis, before.analysis);
    assert_eq!(after.latest, before.latest);
}

#[tokio::test]
async fn test_reactivation_starts_from_last_known_data() {
    let sync = SyncClient::new(MockApi::new());
    sync.activate().await.unwrap().deactivate();
    let kept = sync.snapshot();
    assert!(!kept.is_empty());

    sync.api().fail_all(Some(502));
    let session = sync.activate().await.unwrap();

    let state = sync.snapshot();
    assert_eq!(state.latest, kept.latest);
    assert_eq!(state.stats, kept.stats);
    assert!(state.health.status.is_stale());
    drop(session);
}

#[tokio::test]
async fn test_session_lifecycle_events() {
    let sync = SyncClient::new(MockApi::new());
    let mut events = sync.events();

    let session = sync.activate().await.unwrap();
    session.deactivate();

    let seen = drain(&mut events);
    assert_eq!(seen.first(), Some(&SyncEvent::Activated));
    assert_eq!(seen.last(), Some(&SyncEvent::Deactivated));
    assert!(seen.contains(&SyncEvent::PollingStarted {
        interval: Duration::from_millis(5000)
    }));
    assert!(seen.contains(&SyncEvent::PollingStopped));
}
