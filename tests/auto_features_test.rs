// ABOUTME: Integration tests for automatic pause on inactivity and automatic laps by distance
// ABOUTME: Drives the sensor on half-second offsets so timer reads never race the test
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use common::{create_test_rig, drain_events, test_config};
use pierre_tracker::{
    ActivityType, MetricKey, PauseCause, SessionOptions, TrackerConfig, TrackerEvent,
    TrackerState,
};
use std::time::Duration;
use tokio::time::sleep;

fn auto_pause_config() -> TrackerConfig {
    test_config().with_auto_pause(true, Duration::from_secs(10))
}

#[tokio::test(start_paused = true)]
async fn test_inactivity_triggers_auto_pause() {
    let rig = create_test_rig(auto_pause_config());
    rig.stand_still();
    let mut events = rig.tracker.subscribe_to_state_changes();

    let session = rig.tracker.start(SessionOptions::default()).await.unwrap();
    sleep(Duration::from_secs(11)).await;

    let status = rig.tracker.get_state().await;
    assert_eq!(status.state, TrackerState::Paused);
    let live = status.session.unwrap();
    assert_eq!(live.pauses, vec![PauseCause::Auto]);
    assert_eq!(live.auto_pause_count(), 1);

    let events = drain_events(&mut events);
    assert!(events.iter().any(|event| matches!(
        event,
        TrackerEvent::StateChanged {
            to: TrackerState::Paused,
            cause: Some(PauseCause::Auto),
            ..
        }
    )));
    let idle = events
        .iter()
        .find_map(|event| match event {
            TrackerEvent::AutoPaused {
                activity_id,
                idle_for_secs,
            } => {
                assert_eq!(*activity_id, session.id);
                Some(*idle_for_secs)
            }
            _ => None,
        })
        .unwrap();
    assert!(idle >= 10.0);
}

#[tokio::test(start_paused = true)]
async fn test_motion_keeps_session_active() {
    let rig = create_test_rig(auto_pause_config());
    rig.keep_moving();

    rig.tracker.start(SessionOptions::default()).await.unwrap();
    sleep(Duration::from_secs(30)).await;

    let status = rig.tracker.get_state().await;
    assert_eq!(status.state, TrackerState::Active);
    assert!(status.session.unwrap().pauses.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_pushed_speed_is_superseded_by_later_polls() {
    let rig = create_test_rig(auto_pause_config());
    rig.tracker.start(SessionOptions::default()).await.unwrap();

    sleep(Duration::from_millis(500)).await;
    rig.sensor.push([(MetricKey::Speed, 5.0)].into_iter().collect());
    rig.sensor.set(MetricKey::Speed, 0.0);
    sleep(Duration::from_secs(1)).await;

    let first = rig.tracker.latest_metrics().await.unwrap();
    assert_eq!(first.latest(&MetricKey::Speed), Some(5.0));
    assert!(first.derived.is_moving);

    sleep(Duration::from_secs(1)).await;
    let polled = rig.tracker.latest_metrics().await.unwrap();
    assert_eq!(polled.latest(&MetricKey::Speed), Some(0.0));
    assert!(!polled.derived.is_moving);

    sleep(Duration::from_secs(28)).await;
    let status = rig.tracker.get_state().await;
    assert_eq!(status.state, TrackerState::Paused);
    assert_eq!(status.session.unwrap().pauses, vec![PauseCause::Auto]);
}

#[tokio::test(start_paused = true)]
async fn test_session_option_disables_auto_pause() {
    let rig = create_test_rig(auto_pause_config());
    rig.stand_still();

    let options = SessionOptions {
        auto_pause: Some(false),
        ..SessionOptions::default()
    };
    rig.tracker.start(options).await.unwrap();
    sleep(Duration::from_secs(30)).await;

    assert_eq!(rig.tracker.get_state().await.state, TrackerState::Active);
}

#[tokio::test(start_paused = true)]
async fn test_auto_pause_rearms_after_resume() {
    let rig = create_test_rig(auto_pause_config());
    rig.stand_still();

    rig.tracker.start(SessionOptions::default()).await.unwrap();
    sleep(Duration::from_secs(11)).await;
    assert_eq!(rig.tracker.get_state().await.state, TrackerState::Paused);

    assert!(rig.tracker.resume().await);
    sleep(Duration::from_secs(5)).await;
    assert_eq!(rig.tracker.get_state().await.state, TrackerState::Active);

    sleep(Duration::from_secs(6)).await;
    let session = rig.tracker.get_state().await.session.unwrap();
    assert_eq!(session.auto_pause_count(), 2);

    let completed = rig.tracker.stop().await.unwrap();
    assert!(completed.session.duration.as_secs_f64() >= 20.0);
    assert!(completed.session.duration.as_secs_f64() <= 21.0);
}

#[tokio::test(start_paused = true)]
async fn test_auto_lap_every_kilometer() {
    let config = test_config().with_auto_lap(true, 1_000.0);
    let rig = create_test_rig(config);
    let mut events = rig.tracker.subscribe_to_state_changes();

    rig.tracker
        .start(SessionOptions::for_activity(ActivityType::VirtualRun))
        .await
        .unwrap();

    // Odometer steps land between ticks, so tick k reads 250 * k meters
    sleep(Duration::from_millis(500)).await;
    for step in 1..=12_u32 {
        rig.sensor.set(MetricKey::Distance, 250.0 * f64::from(step));
        sleep(Duration::from_secs(1)).await;
    }

    let completed = rig.tracker.stop().await.unwrap();
    let laps = completed.session.laps();
    assert_eq!(laps.len(), 3);
    assert!(laps.iter().all(|lap| lap.automatic));
    for (lap, expected) in laps.iter().zip([1_000.0, 2_000.0, 3_000.0]) {
        assert!((lap.distance_m - expected).abs() < f64::EPSILON);
    }
    assert_eq!(
        laps.iter().map(|lap| lap.number).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert!((completed.session.distance_m - 3_000.0).abs() < f64::EPSILON);

    let lap_events = drain_events(&mut events)
        .into_iter()
        .filter(|event| matches!(event, TrackerEvent::LapRecorded { .. }))
        .count();
    assert_eq!(lap_events, 3);
}

#[tokio::test(start_paused = true)]
async fn test_auto_lap_disabled_by_session_option() {
    let config = test_config().with_auto_lap(true, 1_000.0);
    let rig = create_test_rig(config);

    let options = SessionOptions {
        auto_lap: Some(false),
        ..SessionOptions::for_activity(ActivityType::VirtualRun)
    };
    rig.tracker.start(options).await.unwrap();
    sleep(Duration::from_millis(500)).await;
    rig.sensor.set(MetricKey::Distance, 5_000.0);
    sleep(Duration::from_secs(2)).await;

    let completed = rig.tracker.stop().await.unwrap();
    assert!(completed.session.laps().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_large_jump_records_a_single_lap_per_tick() {
    let config = test_config().with_auto_lap(true, 1_000.0);
    let rig = create_test_rig(config);

    rig.tracker
        .start(SessionOptions::for_activity(ActivityType::VirtualRun))
        .await
        .unwrap();
    sleep(Duration::from_millis(500)).await;
    rig.sensor.set(MetricKey::Distance, 2_500.0);
    sleep(Duration::from_secs(1)).await;

    let session = rig.tracker.get_state().await.session.unwrap();
    assert_eq!(session.laps().len(), 1);

    // The next lap is measured from where this one was taken
    assert!((session.laps()[0].distance_m - 2_500.0).abs() < f64::EPSILON);
    rig.sensor.set(MetricKey::Distance, 3_400.0);
    sleep(Duration::from_secs(1)).await;
    assert_eq!(rig.tracker.get_state().await.session.unwrap().laps().len(), 1);

    rig.sensor.set(MetricKey::Distance, 3_500.0);
    sleep(Duration::from_secs(1)).await;
    assert_eq!(rig.tracker.get_state().await.session.unwrap().laps().len(), 2);
}
