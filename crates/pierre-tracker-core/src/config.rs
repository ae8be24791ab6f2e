// ABOUTME: Tracker configuration value object threaded from the orchestrator to its components
// ABOUTME: Defaults, environment overrides, builder setters, and validation of every tunable
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Tracker configuration.
//!
//! One `TrackerConfig` is built when the tracker is created and handed down to
//! the aggregator and recorder. Nothing reads process state after that point.

use crate::constants::{env_config, laps, location, metrics, recording, timing};
use crate::errors::ConfigError;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Athlete-specific normalizing constants
#[derive(Debug, Clone, PartialEq)]
pub struct AthleteProfile {
    /// Functional threshold power in watts
    pub ftp_watts: f64,
    /// Maximum heart rate in bpm; the observed session maximum is used when absent
    pub max_heart_rate: Option<f64>,
    /// Body weight in kilograms, required for power-to-weight
    pub weight_kg: Option<f64>,
}

impl Default for AthleteProfile {
    fn default() -> Self {
        Self {
            ftp_watts: metrics::DEFAULT_FTP_WATTS,
            max_heart_rate: None,
            weight_kg: None,
        }
    }
}

/// Configuration for a tracker instance
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::struct_excessive_bools)]
pub struct TrackerConfig {
    /// Tick timer resolution (elapsed time and metrics refresh)
    pub tick_interval: Duration,
    /// Recorder sampling cadence
    pub recording_interval: Duration,
    /// Buffered records that trigger a flush
    pub flush_threshold: usize,
    /// Flush attempts made during `stop` before giving up
    pub flush_retry_limit: u32,
    /// Upper bound on records buffered while storage rejects batches
    pub max_pending_records: usize,
    /// Whether the auto-pause monitor runs
    pub auto_pause_enabled: bool,
    /// Inactivity window before auto-pause
    pub auto_pause_threshold: Duration,
    /// Auto-pause monitor cadence
    pub auto_pause_check_interval: Duration,
    /// Whether distance-based laps are inserted automatically
    pub auto_lap_enabled: bool,
    /// Distance between automatic laps in meters
    pub auto_lap_distance_m: f64,
    /// Entries kept per metric key in the trend ring
    pub trend_history_size: usize,
    /// Athlete constants (FTP, max heart rate, weight)
    pub athlete: AthleteProfile,
    /// Location fixes less accurate than this (meters) are ignored
    pub min_location_accuracy_m: f64,
    /// Capacity of the event broadcast channels
    pub event_channel_capacity: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(timing::DEFAULT_TICK_INTERVAL_MS),
            recording_interval: Duration::from_millis(timing::DEFAULT_RECORDING_INTERVAL_MS),
            flush_threshold: recording::DEFAULT_FLUSH_THRESHOLD,
            flush_retry_limit: recording::DEFAULT_FLUSH_RETRY_LIMIT,
            max_pending_records: recording::DEFAULT_MAX_PENDING_RECORDS,
            auto_pause_enabled: true,
            auto_pause_threshold: Duration::from_secs(timing::DEFAULT_AUTO_PAUSE_THRESHOLD_SECS),
            auto_pause_check_interval: Duration::from_millis(
                timing::AUTO_PAUSE_CHECK_INTERVAL_MS,
            ),
            auto_lap_enabled: true,
            auto_lap_distance_m: laps::DEFAULT_AUTO_LAP_DISTANCE_M,
            trend_history_size: metrics::DEFAULT_TREND_HISTORY_SIZE,
            athlete: AthleteProfile::default(),
            min_location_accuracy_m: location::DEFAULT_MIN_ACCURACY_M,
            event_channel_capacity: metrics::DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl TrackerConfig {
    /// Load configuration from environment variables, falling back to defaults
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            tick_interval: env_parse::<u64>(env_config::TICK_INTERVAL_MS)
                .map_or(defaults.tick_interval, Duration::from_millis),
            recording_interval: env_parse::<u64>(env_config::RECORDING_INTERVAL_MS)
                .map_or(defaults.recording_interval, Duration::from_millis),
            flush_threshold: env_parse(env_config::FLUSH_THRESHOLD)
                .unwrap_or(defaults.flush_threshold),
            flush_retry_limit: env_parse(env_config::FLUSH_RETRY_LIMIT)
                .unwrap_or(defaults.flush_retry_limit),
            max_pending_records: env_parse(env_config::MAX_PENDING_RECORDS)
                .unwrap_or(defaults.max_pending_records),
            auto_pause_enabled: env_parse(env_config::AUTO_PAUSE_ENABLED)
                .unwrap_or(defaults.auto_pause_enabled),
            auto_pause_threshold: env_parse::<u64>(env_config::AUTO_PAUSE_THRESHOLD_SECS)
                .map_or(defaults.auto_pause_threshold, Duration::from_secs),
            auto_pause_check_interval: defaults.auto_pause_check_interval,
            auto_lap_enabled: env_parse(env_config::AUTO_LAP_ENABLED)
                .unwrap_or(defaults.auto_lap_enabled),
            auto_lap_distance_m: env_parse(env_config::AUTO_LAP_DISTANCE_M)
                .unwrap_or(defaults.auto_lap_distance_m),
            trend_history_size: env_parse(env_config::TREND_HISTORY_SIZE)
                .unwrap_or(defaults.trend_history_size),
            athlete: AthleteProfile {
                ftp_watts: env_parse(env_config::ATHLETE_FTP)
                    .unwrap_or(defaults.athlete.ftp_watts),
                max_heart_rate: env_parse(env_config::ATHLETE_MAX_HR),
                weight_kg: env_parse(env_config::ATHLETE_WEIGHT_KG),
            },
            min_location_accuracy_m: env_parse(env_config::MIN_LOCATION_ACCURACY_M)
                .unwrap_or(defaults.min_location_accuracy_m),
            event_channel_capacity: defaults.event_channel_capacity,
        }
    }

    /// Validate every tunable
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when an interval is zero or a numeric value is out of range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval.is_zero() {
            return Err(ConfigError::ZeroInterval("tick_interval"));
        }
        if self.recording_interval.is_zero() {
            return Err(ConfigError::ZeroInterval("recording_interval"));
        }
        if self.auto_pause_check_interval.is_zero() {
            return Err(ConfigError::ZeroInterval("auto_pause_check_interval"));
        }
        if self.flush_threshold == 0 {
            return Err(ConfigError::ValueOutOfRange("flush_threshold must be at least 1"));
        }
        if self.flush_retry_limit == 0 {
            return Err(ConfigError::ValueOutOfRange(
                "flush_retry_limit must be at least 1",
            ));
        }
        if self.max_pending_records < self.flush_threshold {
            return Err(ConfigError::ValueOutOfRange(
                "max_pending_records must be at least flush_threshold",
            ));
        }
        if self.trend_history_size == 0 {
            return Err(ConfigError::ValueOutOfRange(
                "trend_history_size must be at least 1",
            ));
        }
        if self.event_channel_capacity == 0 {
            return Err(ConfigError::ValueOutOfRange(
                "event_channel_capacity must be at least 1",
            ));
        }
        if !(self.auto_lap_distance_m.is_finite() && self.auto_lap_distance_m > 0.0) {
            return Err(ConfigError::ValueOutOfRange(
                "auto_lap_distance_m must be positive",
            ));
        }
        if !(self.athlete.ftp_watts.is_finite() && self.athlete.ftp_watts > 0.0) {
            return Err(ConfigError::ValueOutOfRange("ftp_watts must be positive"));
        }
        if self
            .athlete
            .max_heart_rate
            .is_some_and(|hr| !(hr.is_finite() && hr > 0.0))
        {
            return Err(ConfigError::ValueOutOfRange(
                "max_heart_rate must be positive",
            ));
        }
        if self
            .athlete
            .weight_kg
            .is_some_and(|kg| !(kg.is_finite() && kg > 0.0))
        {
            return Err(ConfigError::ValueOutOfRange("weight_kg must be positive"));
        }
        Ok(())
    }

    /// Set the tick resolution
    #[must_use]
    pub const fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Set the recording cadence
    #[must_use]
    pub const fn with_recording_interval(mut self, interval: Duration) -> Self {
        self.recording_interval = interval;
        self
    }

    /// Set the flush threshold
    #[must_use]
    pub const fn with_flush_threshold(mut self, threshold: usize) -> Self {
        self.flush_threshold = threshold;
        self
    }

    /// Set the number of flush attempts made during `stop`
    #[must_use]
    pub const fn with_flush_retry_limit(mut self, limit: u32) -> Self {
        self.flush_retry_limit = limit;
        self
    }

    /// Set the cap on records buffered while storage is unavailable
    #[must_use]
    pub const fn with_max_pending_records(mut self, max: usize) -> Self {
        self.max_pending_records = max;
        self
    }

    /// Enable or disable auto-pause and set its inactivity threshold
    #[must_use]
    pub const fn with_auto_pause(mut self, enabled: bool, threshold: Duration) -> Self {
        self.auto_pause_enabled = enabled;
        self.auto_pause_threshold = threshold;
        self
    }

    /// Enable or disable auto-lap and set its distance
    #[must_use]
    pub const fn with_auto_lap(mut self, enabled: bool, distance_m: f64) -> Self {
        self.auto_lap_enabled = enabled;
        self.auto_lap_distance_m = distance_m;
        self
    }

    /// Set the trend ring capacity
    #[must_use]
    pub const fn with_trend_history_size(mut self, size: usize) -> Self {
        self.trend_history_size = size;
        self
    }

    /// Set the athlete profile
    #[must_use]
    pub fn with_athlete(mut self, athlete: AthleteProfile) -> Self {
        self.athlete = athlete;
        self
    }
}

/// Parse an environment variable, logging and ignoring unparseable values
fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    raw.trim().parse().map_or_else(
        |_| {
            warn!(env.key = %key, env.value = %raw, "Ignoring unparseable tracker setting");
            None
        },
        Some,
    )
}
