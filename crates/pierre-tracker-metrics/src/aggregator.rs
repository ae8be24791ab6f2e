// ABOUTME: Per-session streaming metrics aggregator folding keyed sample sets into snapshots
// ABOUTME: Running aggregates, trend rings, distance/elevation, training load, zones, and finalize
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Streaming metrics aggregation.
//!
//! One `MetricsAggregator` lives for the duration of a session. Every tick the
//! orchestrator hands it the latest reading set; the aggregator folds the set
//! into its running state and returns a fresh `MetricSnapshot`. A set that
//! would poison the running state (non-finite aggregates) is discarded as a
//! whole and the previous snapshot is returned unchanged.

use crate::errors::MetricsError;
use crate::physiological_constants::elevation::NOISE_THRESHOLD_M;
use crate::physiological_constants::motion::{MOVING_CADENCE, MOVING_SPEED_MPS};
use crate::physiological_constants::zone_percentages::{HR_ZONE_COUNT, POWER_ZONE_COUNT};
use crate::stats::{RunningStat, TrendRing};
use crate::training_load::{calorie_increment, training_stress_increment};
use crate::zones::{heart_rate_zone, power_zone};
use chrono::{DateTime, Utc};
use pierre_tracker_core::constants::limits;
use pierre_tracker_core::constants::time::METERS_PER_KM;
use pierre_tracker_core::models::{
    CumulativeMetrics, DerivedMetrics, MetricKey, MetricSnapshot, Readings, SessionSummary,
    Trend, ZoneDistribution,
};
use pierre_tracker_core::TrackerConfig;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Normalizing constants and sizing for one aggregator
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsConfig {
    /// Functional threshold power in watts
    pub ftp_watts: f64,
    /// Configured max heart rate; the observed max is used when absent
    pub max_heart_rate: Option<f64>,
    /// Athlete weight in kilograms
    pub weight_kg: Option<f64>,
    /// Entries kept per key in the trend ring
    pub trend_history_size: usize,
    /// Interval assumed between sample sets when integrating speed
    pub nominal_interval: Duration,
}

impl From<&TrackerConfig> for MetricsConfig {
    fn from(config: &TrackerConfig) -> Self {
        Self {
            ftp_watts: config.athlete.ftp_watts,
            max_heart_rate: config.athlete.max_heart_rate,
            weight_kg: config.athlete.weight_kg,
            trend_history_size: config.trend_history_size,
            nominal_interval: config.tick_interval,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self::from(&TrackerConfig::default())
    }
}

/// Running state, cloned per update so a failed fold can be discarded
#[derive(Debug, Clone, Default)]
struct AggregateState {
    stats: BTreeMap<MetricKey, RunningStat>,
    history: BTreeMap<MetricKey, TrendRing>,
    realtime: Readings,
    distance_m: f64,
    elevation_reference: Option<f64>,
    ascent_m: f64,
    descent_m: f64,
    calories: f64,
    training_stress: f64,
    heart_rate_zone_secs: Vec<f64>,
    power_zone_secs: Vec<f64>,
    moving_secs: f64,
    moving_distance_m: f64,
    derived: DerivedMetrics,
    last_timestamp: Option<DateTime<Utc>>,
    updates: u64,
}

/// Incremental metrics engine for a single session
#[derive(Debug, Clone)]
pub struct MetricsAggregator {
    config: MetricsConfig,
    state: AggregateState,
    snapshot: MetricSnapshot,
    finalized: Option<SessionSummary>,
}

impl MetricsAggregator {
    /// Create an aggregator with empty state
    #[must_use]
    pub fn new(config: MetricsConfig) -> Self {
        let state = AggregateState {
            heart_rate_zone_secs: vec![0.0; HR_ZONE_COUNT],
            power_zone_secs: vec![0.0; POWER_ZONE_COUNT],
            ..AggregateState::default()
        };
        Self {
            config,
            state,
            snapshot: MetricSnapshot::default(),
            finalized: None,
        }
    }

    /// Configuration this aggregator was built with
    #[must_use]
    pub const fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Latest snapshot
    #[must_use]
    pub const fn snapshot(&self) -> &MetricSnapshot {
        &self.snapshot
    }

    /// Fold one reading set observed at `timestamp` and return the new snapshot
    ///
    /// Implausible values are skipped per key. If the fold produces a
    /// non-finite aggregate, the whole set is discarded and the previous
    /// snapshot is returned. After `finalize` the aggregator is frozen and
    /// every call returns the final snapshot.
    pub fn update(&mut self, readings: &Readings, timestamp: DateTime<Utc>) -> MetricSnapshot {
        if self.finalized.is_some() {
            return self.snapshot.clone();
        }

        let mut next = self.state.clone();
        match self.fold(&mut next, readings, timestamp) {
            Ok(()) => {
                self.state = next;
                self.snapshot = self.build_snapshot(timestamp);
            }
            Err(error) => {
                warn!(error = %error, "Discarding sample set; keeping previous snapshot");
            }
        }
        self.snapshot.clone()
    }

    /// Trend of `key` over the last `window` samples
    #[must_use]
    pub fn trend(&self, key: &MetricKey, window: usize) -> Option<Trend> {
        self.state.history.get(key).and_then(|ring| ring.trend(window))
    }

    /// Running mean for a key, if it was observed
    #[must_use]
    pub fn mean(&self, key: &MetricKey) -> Option<f64> {
        self.state.stats.get(key).and_then(RunningStat::mean)
    }

    /// Samples folded for a key
    #[must_use]
    pub fn sample_count(&self, key: &MetricKey) -> u64 {
        self.state.stats.get(key).map_or(0, RunningStat::count)
    }

    /// Compute summary-only fields on top of the last snapshot
    ///
    /// The first call freezes the aggregator; later calls return the same summary.
    pub fn finalize(&mut self) -> SessionSummary {
        if let Some(summary) = &self.finalized {
            return summary.clone();
        }

        let totals = &self.snapshot.totals;
        let max_heart_rate = self.config.max_heart_rate.or(totals.max_heart_rate);

        let intensity = totals
            .avg_heart_rate
            .zip(max_heart_rate)
            .filter(|(_, max)| *max > 0.0)
            .map(|(avg, max)| avg / max);

        let intensity_factor = totals
            .avg_power
            .filter(|_| self.config.ftp_watts > 0.0)
            .map(|avg| avg / self.config.ftp_watts);

        let avg_power_to_weight = totals
            .avg_power
            .zip(self.config.weight_kg)
            .filter(|(_, kg)| *kg > 0.0)
            .map(|(watts, kg)| watts / kg);

        let avg_pace_sec_per_km = (self.state.moving_distance_m > 0.0)
            .then(|| self.state.moving_secs / (self.state.moving_distance_m / METERS_PER_KM));

        let heart_rate_zones = self.zone_distribution(&self.state.heart_rate_zone_secs);
        let power_zones = self.zone_distribution(&self.state.power_zone_secs);

        let summary = SessionSummary {
            snapshot: self.snapshot.clone(),
            intensity,
            intensity_factor,
            avg_power_to_weight,
            avg_pace_sec_per_km,
            heart_rate_zones,
            power_zones,
        };

        debug!(
            updates = self.snapshot.updates,
            distance_m = totals.distance_m,
            training_stress = totals.training_stress,
            "Metrics finalized"
        );
        self.finalized = Some(summary.clone());
        summary
    }

    #[allow(clippy::unused_self)]
    fn zone_distribution(&self, seconds: &[f64]) -> Option<ZoneDistribution> {
        let distribution = ZoneDistribution {
            seconds: seconds.to_vec(),
        };
        (distribution.total_seconds() > 0.0).then_some(distribution)
    }

    fn fold(
        &self,
        state: &mut AggregateState,
        readings: &Readings,
        timestamp: DateTime<Utc>,
    ) -> Result<(), MetricsError> {
        let dt_secs = self.sample_interval_secs(state, timestamp);

        let mut accepted = Readings::new();
        for (key, value) in readings {
            match validate(key, *value) {
                Ok(()) => {
                    accepted.insert(key.clone(), *value);
                }
                Err(error) => debug!(error = %error, "Skipping sample value"),
            }
        }

        for (key, value) in &accepted {
            state.realtime.insert(key.clone(), *value);
            state
                .history
                .entry(key.clone())
                .or_insert_with(|| TrendRing::new(self.config.trend_history_size))
                .push(*value);
            if key.is_averaged() {
                state.stats.entry(key.clone()).or_default().push(*value);
            }
        }

        let speed = accepted.get(&MetricKey::Speed).copied();
        let cadence = accepted.get(&MetricKey::Cadence).copied();
        let power = accepted.get(&MetricKey::Power).copied();
        let heart_rate = accepted.get(&MetricKey::HeartRate).copied();

        let previous_distance = state.distance_m;
        if let Some(odometer) = accepted.get(&MetricKey::Distance) {
            state.distance_m = state.distance_m.max(*odometer);
        } else if let Some(speed) = speed {
            state.distance_m += speed * dt_secs;
        }
        let distance_delta = state.distance_m - previous_distance;

        if let Some(altitude) = accepted.get(&MetricKey::Altitude) {
            accumulate_elevation(state, *altitude);
        }

        if let Some(power) = power {
            state.training_stress +=
                training_stress_increment(power, self.config.ftp_watts, dt_secs);
            state.calories += calorie_increment(power, dt_secs);
        }

        let is_moving = speed.map_or_else(
            || cadence.map_or(!accepted.is_empty(), |c| c > MOVING_CADENCE),
            |s| s > MOVING_SPEED_MPS,
        );
        if is_moving && distance_delta > 0.0 {
            state.moving_secs += dt_secs;
            state.moving_distance_m += distance_delta;
        }

        let max_heart_rate = self.config.max_heart_rate.or_else(|| {
            state
                .stats
                .get(&MetricKey::HeartRate)
                .and_then(RunningStat::max)
        });
        let hr_zone = heart_rate.zip(max_heart_rate).and_then(|(hr, max)| heart_rate_zone(hr, max));
        let pw_zone = power.and_then(|p| power_zone(p, self.config.ftp_watts));
        add_zone_time(&mut state.heart_rate_zone_secs, hr_zone, dt_secs);
        add_zone_time(&mut state.power_zone_secs, pw_zone, dt_secs);

        state.derived = DerivedMetrics {
            heart_rate_zone: hr_zone,
            power_zone: pw_zone,
            pace_sec_per_km: speed
                .filter(|s| *s > MOVING_SPEED_MPS)
                .map(|s| METERS_PER_KM / s),
            power_to_weight: power
                .zip(self.config.weight_kg)
                .filter(|(_, kg)| *kg > 0.0)
                .map(|(watts, kg)| watts / kg),
            is_moving,
        };
        state.last_timestamp = Some(
            state
                .last_timestamp
                .map_or(timestamp, |last| last.max(timestamp)),
        );
        state.updates += 1;

        check_finite(state)
    }

    /// Seconds covered by the set being folded, never more than one nominal interval
    ///
    /// The wall gap since the previous set spans any pause, so it is capped to
    /// keep paused time out of distance, load, calories and zone time.
    fn sample_interval_secs(&self, state: &AggregateState, timestamp: DateTime<Utc>) -> f64 {
        let nominal = self.config.nominal_interval.as_secs_f64();
        state.last_timestamp.map_or(nominal, |last| {
            let elapsed = (timestamp - last).to_std().map_or(0.0, |d| d.as_secs_f64());
            if elapsed > 0.0 {
                elapsed.min(nominal)
            } else {
                nominal
            }
        })
    }

    fn build_snapshot(&self, timestamp: DateTime<Utc>) -> MetricSnapshot {
        let state = &self.state;
        let stat = |key: &MetricKey| state.stats.get(key).copied().unwrap_or_default();
        let heart_rate = stat(&MetricKey::HeartRate);
        let power = stat(&MetricKey::Power);
        let cadence = stat(&MetricKey::Cadence);
        let speed = stat(&MetricKey::Speed);

        MetricSnapshot {
            timestamp: Some(timestamp),
            updates: state.updates,
            realtime: state.realtime.clone(),
            totals: CumulativeMetrics {
                distance_m: state.distance_m,
                ascent_m: state.ascent_m,
                descent_m: state.descent_m,
                avg_heart_rate: heart_rate.mean(),
                max_heart_rate: heart_rate.max(),
                avg_power: power.mean(),
                max_power: power.max(),
                avg_cadence: cadence.mean(),
                max_cadence: cadence.max(),
                avg_speed: speed.mean(),
                max_speed: speed.max(),
                calories: state.calories,
                training_stress: state.training_stress,
            },
            derived: state.derived.clone(),
            history: state
                .history
                .iter()
                .map(|(key, ring)| (key.clone(), ring.to_vec()))
                .collect(),
        }
    }
}

fn validate(key: &MetricKey, value: f64) -> Result<(), MetricsError> {
    if !value.is_finite() {
        return Err(MetricsError::NonFinite(key.clone()));
    }
    let (min, max) = match key {
        MetricKey::HeartRate => (limits::MIN_HEART_RATE_BPM, limits::MAX_HEART_RATE_BPM),
        MetricKey::Power => (0.0, limits::MAX_POWER_WATTS),
        MetricKey::Cadence => (0.0, limits::MAX_CADENCE_RPM),
        MetricKey::Speed => (0.0, limits::MAX_SPEED_MPS),
        MetricKey::Altitude => (limits::MIN_ALTITUDE_M, limits::MAX_ALTITUDE_M),
        MetricKey::Distance => (0.0, f64::MAX),
        MetricKey::Temperature | MetricKey::Custom(_) => return Ok(()),
    };
    if value < min || value > max {
        return Err(MetricsError::OutOfRange {
            key: key.clone(),
            value,
        });
    }
    Ok(())
}

fn accumulate_elevation(state: &mut AggregateState, altitude: f64) {
    let Some(reference) = state.elevation_reference else {
        state.elevation_reference = Some(altitude);
        return;
    };
    let delta = altitude - reference;
    if delta > NOISE_THRESHOLD_M {
        state.ascent_m += delta;
        state.elevation_reference = Some(altitude);
    } else if delta < -NOISE_THRESHOLD_M {
        state.descent_m += -delta;
        state.elevation_reference = Some(altitude);
    }
}

fn add_zone_time(buckets: &mut [f64], zone: Option<u8>, dt_secs: f64) {
    if let Some(slot) = zone
        .and_then(|z| usize::from(z).checked_sub(1))
        .and_then(|index| buckets.get_mut(index))
    {
        *slot += dt_secs;
    }
}

fn check_finite(state: &AggregateState) -> Result<(), MetricsError> {
    let aggregates = [
        ("distance", state.distance_m),
        ("ascent", state.ascent_m),
        ("descent", state.descent_m),
        ("calories", state.calories),
        ("training_stress", state.training_stress),
        ("moving_time", state.moving_secs),
    ];
    for (name, value) in aggregates {
        if !value.is_finite() {
            return Err(MetricsError::Overflow(name));
        }
    }
    if state
        .stats
        .values()
        .any(|stat| stat.mean().is_some_and(|m| !m.is_finite()))
    {
        return Err(MetricsError::Overflow("running_mean"));
    }
    Ok(())
}
