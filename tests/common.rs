// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides quiet logging plus trackers wired to synthetic sensor, location and storage
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::uninlined_format_args
)]
//! Shared test utilities for `pierre_tracker`
//!
//! Trackers built here run against in-memory collaborators so tests can
//! drive them deterministically under a paused tokio clock.

use pierre_tracker::synthetic::{InMemoryStorage, ScriptedLocation, ScriptedSensor};
use pierre_tracker::{ActivityTracker, MetricKey, TrackerConfig, TrackerEvent};
use std::sync::{Arc, Once};
use std::time::Duration;
use tokio::sync::broadcast;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        // Check for TEST_LOG environment variable to control test logging level
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            Ok("WARN" | "ERROR") | _ => tracing::Level::WARN, // Default to WARN for quiet tests
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Tracker plus handles on its synthetic collaborators
pub struct TestRig {
    pub tracker: ActivityTracker,
    pub sensor: ScriptedSensor,
    pub location: ScriptedLocation,
    pub storage: InMemoryStorage,
}

impl TestRig {
    /// Make the athlete look like they are moving
    pub fn keep_moving(&self) {
        self.sensor.set(MetricKey::Speed, 3.0);
        self.sensor.set(MetricKey::HeartRate, 140.0);
    }

    /// Report zero speed and cadence
    pub fn stand_still(&self) {
        self.sensor.set(MetricKey::Speed, 0.0);
        self.sensor.set(MetricKey::Cadence, 0.0);
    }
}

/// One-second timers, auto features off, default athlete
pub fn test_config() -> TrackerConfig {
    TrackerConfig::default()
        .with_tick_interval(Duration::from_secs(1))
        .with_recording_interval(Duration::from_secs(1))
        .with_auto_pause(false, Duration::from_secs(10))
        .with_auto_lap(false, 1_000.0)
}

/// Tracker over fresh synthetic collaborators
pub fn create_test_rig(config: TrackerConfig) -> TestRig {
    init_test_logging();
    let sensor = ScriptedSensor::new();
    let location = ScriptedLocation::new();
    let storage = InMemoryStorage::new();
    let tracker = ActivityTracker::new(
        config,
        Arc::new(sensor.clone()),
        Arc::new(location.clone()),
        Arc::new(storage.clone()),
    )
    .expect("test config validates");
    TestRig {
        tracker,
        sensor,
        location,
        storage,
    }
}

/// Drain every lifecycle event currently queued on a receiver
pub fn drain_events(rx: &mut broadcast::Receiver<TrackerEvent>) -> Vec<TrackerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
