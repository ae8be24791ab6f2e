// ABOUTME: State owned by the one live session: clocks, aggregator, recorder, route, timers, collaborator feeds
// ABOUTME: Elapsed-time accounting excludes pauses by shifting the logical start instant
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::collaborators::{SensorStream, SensorSubscription};
use crate::recorder::{Recorder, RecorderConfig};
use crate::timers::TimerHandle;
use chrono::{DateTime, TimeDelta, Utc};
use pierre_tracker_core::models::{ActivitySession, LocationFix, MetricKey, Readings};
use pierre_tracker_core::TrackerConfig;
use pierre_tracker_metrics::{MetricsAggregator, MetricsConfig, RouteTracker};
use std::mem;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Collaborator feeds opened by `start`
pub(super) struct LiveFeeds {
    pub subscription: SensorSubscription,
    pub readings_rx: mpsc::Receiver<Readings>,
    pub location_rx: mpsc::Receiver<LocationFix>,
    pub location_started: bool,
}

/// Periodic consumers of sensor readings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum SensorConsumer {
    Metrics,
    Recording,
}

pub(super) struct LiveSession {
    pub session: ActivitySession,
    pub aggregator: MetricsAggregator,
    pub recorder: Recorder,
    pub timers: Vec<TimerHandle>,
    pub last_motion: Instant,
    pub paused_at: Option<Instant>,
    pub stop_requested_at: Option<Instant>,
    pub location_started: bool,
    wall_origin: DateTime<Utc>,
    mono_origin: Instant,
    logical_start: Instant,
    route: RouteTracker,
    // Pushed sets not yet seen by each consumer
    pushed_for_metrics: Readings,
    pushed_for_recording: Readings,
    readings_rx: mpsc::Receiver<Readings>,
    location_rx: mpsc::Receiver<LocationFix>,
    // Released when the session is dropped
    _subscription: SensorSubscription,
}

impl LiveSession {
    pub fn new(session: ActivitySession, config: &TrackerConfig, feeds: LiveFeeds) -> Self {
        let now = Instant::now();
        let aggregator = MetricsAggregator::new(MetricsConfig::from(config));
        let recorder = Recorder::new(session.id, RecorderConfig::from(config));
        Self {
            wall_origin: session.start_time,
            session,
            aggregator,
            recorder,
            timers: Vec::new(),
            last_motion: now,
            paused_at: None,
            stop_requested_at: None,
            location_started: feeds.location_started,
            mono_origin: now,
            logical_start: now,
            route: RouteTracker::new(config.min_location_accuracy_m),
            pushed_for_metrics: Readings::new(),
            pushed_for_recording: Readings::new(),
            readings_rx: feeds.readings_rx,
            location_rx: feeds.location_rx,
            _subscription: feeds.subscription,
        }
    }

    /// Wall-clock time corresponding to a monotonic instant
    pub fn wall_at(&self, instant: Instant) -> DateTime<Utc> {
        let offset = instant.saturating_duration_since(self.mono_origin);
        self.wall_origin + TimeDelta::from_std(offset).unwrap_or_else(|_| TimeDelta::zero())
    }

    /// Elapsed time excluding pauses; frozen while paused or stopping
    pub fn elapsed_at(&self, now: Instant) -> Duration {
        let end = self.stop_requested_at.or(self.paused_at).unwrap_or(now);
        end.saturating_duration_since(self.logical_start)
    }

    /// Close the current pause, shifting the logical start past it
    pub fn close_pause(&mut self, now: Instant) -> Duration {
        let Some(paused_at) = self.paused_at.take() else {
            return Duration::ZERO;
        };
        let gap = now.saturating_duration_since(paused_at);
        self.logical_start += gap;
        self.session.paused_duration += gap;
        gap
    }

    /// Latest sensor values with sets pushed since this consumer's last poll merged on top
    ///
    /// A pushed value overrides the polled one exactly once per consumer; later
    /// polls see whatever the sensor reports at that time.
    pub fn poll_sensor(
        &mut self,
        sensor: &dyn SensorStream,
        consumer: SensorConsumer,
    ) -> Readings {
        while let Ok(pushed) = self.readings_rx.try_recv() {
            for (key, value) in pushed {
                self.pushed_for_recording.insert(key.clone(), value);
                self.pushed_for_metrics.insert(key, value);
            }
        }
        let overlay = match consumer {
            SensorConsumer::Metrics => mem::take(&mut self.pushed_for_metrics),
            SensorConsumer::Recording => mem::take(&mut self.pushed_for_recording),
        };
        let mut readings = sensor.latest_readings();
        readings.extend(overlay);
        readings
    }

    /// Sensor readings plus GPS odometer and altitude where the sensor lacks them
    pub fn poll_all(&mut self, sensor: &dyn SensorStream) -> Readings {
        let mut readings = self.poll_sensor(sensor, SensorConsumer::Metrics);
        while let Ok(fix) = self.location_rx.try_recv() {
            self.route.push(fix);
        }
        if let Some(distance) = self.route.distance_m() {
            readings.entry(MetricKey::Distance).or_insert(distance);
        }
        if let Some(altitude) = self.route.altitude() {
            readings.entry(MetricKey::Altitude).or_insert(altitude);
        }
        readings
    }
}
