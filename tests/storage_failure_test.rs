// ABOUTME: Integration tests for storage failures: mid-session flush errors, stop retry and force reset
// ABOUTME: Verifies records are never lost or duplicated while storage is unavailable
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use common::{create_test_rig, drain_events, test_config};
use pierre_tracker::synthetic::{InMemoryStorage, ScriptedLocation, ScriptedSensor};
use pierre_tracker::{
    ActivityTracker, ActivityType, LapOptions, SessionOptions, TrackerConfig, TrackerError,
    TrackerEvent, TrackerState,
};
use pierre_tracker_core::errors::ErrorCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

#[tokio::test(start_paused = true)]
async fn test_failed_batch_stays_queued_until_next_flush() {
    let rig = create_test_rig(test_config().with_flush_threshold(2));
    rig.keep_moving();
    let mut events = rig.tracker.subscribe_to_state_changes();
    rig.storage.fail_next(1);

    rig.tracker.start(SessionOptions::default()).await.unwrap();
    sleep(Duration::from_millis(1_500)).await;

    let failures: Vec<_> = drain_events(&mut events)
        .into_iter()
        .filter_map(|event| match event {
            TrackerEvent::FlushFailed {
                pending_records, ..
            } => Some(pending_records),
            _ => None,
        })
        .collect();
    assert_eq!(failures, vec![2]);
    assert!(rig.storage.records().is_empty());

    sleep(Duration::from_secs(1)).await;
    assert_eq!(rig.storage.records().len(), 4);

    let completed = rig.tracker.stop().await.unwrap();
    assert_eq!(completed.recorder.failed_flushes, 1);
    assert_eq!(completed.recorder.persisted, completed.recorder.captured);
    assert_eq!(
        rig.storage.records().len() as u64,
        completed.recorder.captured
    );
}

#[tokio::test(start_paused = true)]
async fn test_pending_buffer_is_capped_while_storage_is_down() {
    let config = test_config()
        .with_flush_threshold(2)
        .with_max_pending_records(6);
    let rig = create_test_rig(config);
    rig.keep_moving();
    let mut events = rig.tracker.subscribe_to_state_changes();
    rig.storage.fail_next(u32::MAX);

    rig.tracker.start(SessionOptions::default()).await.unwrap();
    sleep(Duration::from_millis(4_500)).await;

    // Three sets fill the buffer; the fourth is refused and reported
    let rejections: Vec<_> = drain_events(&mut events)
        .into_iter()
        .filter_map(|event| match event {
            TrackerEvent::RecordsRejected {
                rejected_records,
                pending_records,
                ..
            } => Some((rejected_records, pending_records)),
            _ => None,
        })
        .collect();
    assert_eq!(rejections, vec![(2, 6)]);
    assert!(rig.storage.records().is_empty());

    rig.storage.fail_next(0);
    sleep(Duration::from_secs(2)).await;
    let completed = rig.tracker.stop().await.unwrap();

    assert_eq!(completed.recorder.rejected, 4);
    assert_eq!(completed.recorder.captured, 8);
    assert_eq!(completed.recorder.persisted, 8);
    let sequences: Vec<_> = rig.storage.records().iter().map(|r| r.sequence).collect();
    assert_eq!(sequences, (0..8).collect::<Vec<_>>());
}

#[tokio::test(start_paused = true)]
async fn test_stop_keeps_session_when_storage_is_down() {
    let rig = create_test_rig(test_config());
    rig.keep_moving();
    rig.storage.fail_next(3);

    let session = rig.tracker.start(SessionOptions::default()).await.unwrap();
    sleep(Duration::from_millis(3_500)).await;

    let err = rig.tracker.stop().await.unwrap_err();
    match &err {
        TrackerError::Storage {
            pending_records,
            attempts,
            ..
        } => {
            assert_eq!(*pending_records, 6);
            assert_eq!(*attempts, 3);
        }
        other => panic!("expected storage error, got {other:?}"),
    }
    assert_eq!(err.code(), ErrorCode::StorageRetriesExhausted);

    // Session is held for retry; nothing else may touch it
    let status = rig.tracker.get_state().await;
    assert_eq!(status.session.as_ref().map(|s| s.id), Some(session.id));
    assert!(matches!(
        rig.tracker.start(SessionOptions::default()).await,
        Err(TrackerError::Validation { .. })
    ));
    assert!(matches!(
        rig.tracker.add_lap(LapOptions::default()).await,
        Err(TrackerError::Validation { .. })
    ));
    assert!(!rig.tracker.pause().await);

    // Elapsed time is frozen at the first stop attempt
    sleep(Duration::from_secs(30)).await;
    let completed = rig.tracker.stop().await.unwrap();
    assert!((completed.session.duration.as_secs_f64() - 3.5).abs() < 0.01);
    assert_eq!(completed.recorder.pending, 0);
    assert_eq!(rig.storage.records().len(), 6);
    assert_eq!(rig.tracker.get_state().await.state, TrackerState::Idle);
    assert_eq!(rig.sensor.subscriber_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_force_reset_abandons_unflushable_session() {
    let rig = create_test_rig(test_config());
    rig.keep_moving();
    rig.storage.fail_next(u32::MAX);
    let mut events = rig.tracker.subscribe_to_state_changes();

    let session = rig
        .tracker
        .start(SessionOptions::for_activity(ActivityType::Ride))
        .await
        .unwrap();
    sleep(Duration::from_millis(2_500)).await;
    assert!(rig.tracker.stop().await.is_err());

    let outcome = rig.tracker.force_reset().await;
    assert_eq!(outcome.session.map(|s| s.id), Some(session.id));
    assert_eq!(outcome.discarded_records, 4);
    assert_eq!(rig.tracker.get_state().await.state, TrackerState::Idle);
    assert_eq!(rig.sensor.subscriber_count(), 0);
    assert!(!rig.location.is_running());

    let events = drain_events(&mut events);
    assert!(events
        .iter()
        .any(|event| matches!(event, TrackerEvent::FlushFailed { .. })));
    assert!(matches!(
        events.last(),
        Some(TrackerEvent::StateChanged {
            to: TrackerState::Idle,
            ..
        })
    ));

    // The tracker is usable again
    rig.storage.fail_next(0);
    let next = rig.tracker.start(SessionOptions::default()).await.unwrap();
    assert_ne!(next.id, session.id);
    rig.tracker.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_force_reset_when_idle_is_harmless() {
    let rig = create_test_rig(test_config());
    let outcome = rig.tracker.force_reset().await;
    assert!(outcome.session.is_none());
    assert_eq!(outcome.discarded_records, 0);
    assert_eq!(rig.tracker.get_state().await.state, TrackerState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_pause_flush_failure_does_not_block_pause() {
    let rig = create_test_rig(test_config());
    rig.keep_moving();
    rig.tracker.start(SessionOptions::default()).await.unwrap();
    sleep(Duration::from_millis(1_500)).await;

    rig.storage.fail_next(1);
    assert!(rig.tracker.pause().await);
    assert_eq!(rig.tracker.get_state().await.state, TrackerState::Paused);
    assert!(rig.storage.records().is_empty());

    let completed = rig.tracker.stop().await.unwrap();
    assert_eq!(completed.recorder.persisted, 2);
    assert_eq!(rig.storage.records().len(), 2);
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = TrackerConfig::default().with_tick_interval(Duration::ZERO);
    let result = ActivityTracker::new(
        config,
        Arc::new(ScriptedSensor::new()),
        Arc::new(ScriptedLocation::new()),
        Arc::new(InMemoryStorage::new()),
    );
    assert!(matches!(result, Err(TrackerError::Config(_))));
}
