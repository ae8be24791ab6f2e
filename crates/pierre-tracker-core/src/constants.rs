// ABOUTME: Default thresholds and physical limits for the live tracker, organized by domain
// ABOUTME: Pure data constants consumed by TrackerConfig defaults and sample validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants module
//!
//! Constants are grouped by domain rather than kept in a single flat list.

/// Timer cadences and thresholds for the session lifecycle
pub mod timing {
    /// Tick timer resolution in milliseconds
    pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1_000;
    /// Recording cadence in milliseconds
    pub const DEFAULT_RECORDING_INTERVAL_MS: u64 = 1_000;
    /// Auto-pause monitor cadence in milliseconds
    pub const AUTO_PAUSE_CHECK_INTERVAL_MS: u64 = 1_000;
    /// Inactivity window before auto-pause triggers, in seconds
    pub const DEFAULT_AUTO_PAUSE_THRESHOLD_SECS: u64 = 10;
}

/// Recorder buffering
pub mod recording {
    /// Buffered records that trigger a batch flush
    pub const DEFAULT_FLUSH_THRESHOLD: usize = 10;
    /// Flush attempts made by `stop` before surfacing a storage error
    pub const DEFAULT_FLUSH_RETRY_LIMIT: u32 = 3;
    /// Records held in memory while storage is unavailable; further sets are refused
    pub const DEFAULT_MAX_PENDING_RECORDS: usize = 10_000;
}

/// Lap handling
pub mod laps {
    /// Distance between automatic laps in meters
    pub const DEFAULT_AUTO_LAP_DISTANCE_M: f64 = 1_000.0;
}

/// Metrics history and athlete defaults
pub mod metrics {
    /// Entries kept per metric key in the trend ring
    pub const DEFAULT_TREND_HISTORY_SIZE: usize = 60;
    /// Functional threshold power used when the athlete has none configured
    pub const DEFAULT_FTP_WATTS: f64 = 250.0;
    /// Event channel capacity for state and metrics broadcasts
    pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;
}

/// Location filtering
pub mod location {
    /// Fixes with a worse horizontal accuracy (meters) are ignored
    pub const DEFAULT_MIN_ACCURACY_M: f64 = 50.0;
    /// Mean Earth radius in meters
    pub const EARTH_RADIUS_M: f64 = 6_371_000.0;
}

/// Plausibility bounds applied per sample before aggregation
pub mod limits {
    /// Lowest heart rate accepted (bpm)
    pub const MIN_HEART_RATE_BPM: f64 = 20.0;
    /// Highest heart rate accepted (bpm)
    pub const MAX_HEART_RATE_BPM: f64 = 250.0;
    /// Highest power accepted (watts)
    pub const MAX_POWER_WATTS: f64 = 2_500.0;
    /// Highest cadence accepted (rpm or spm)
    pub const MAX_CADENCE_RPM: f64 = 250.0;
    /// Highest speed accepted (m/s)
    pub const MAX_SPEED_MPS: f64 = 40.0;
    /// Lowest altitude accepted (meters)
    pub const MIN_ALTITUDE_M: f64 = -500.0;
    /// Highest altitude accepted (meters)
    pub const MAX_ALTITUDE_M: f64 = 9_000.0;
}

/// Time conversions
pub mod time {
    /// Seconds per hour
    pub const SECONDS_PER_HOUR: f64 = 3_600.0;
    /// Meters per kilometer
    pub const METERS_PER_KM: f64 = 1_000.0;
}

/// Environment variable names read by `TrackerConfig::from_env`
pub mod env_config {
    /// Tick resolution override (ms)
    pub const TICK_INTERVAL_MS: &str = "TRACKER_TICK_INTERVAL_MS";
    /// Recording cadence override (ms)
    pub const RECORDING_INTERVAL_MS: &str = "TRACKER_RECORDING_INTERVAL_MS";
    /// Flush threshold override
    pub const FLUSH_THRESHOLD: &str = "TRACKER_FLUSH_THRESHOLD";
    /// Flush retry limit override
    pub const FLUSH_RETRY_LIMIT: &str = "TRACKER_FLUSH_RETRY_LIMIT";
    /// Pending record cap override
    pub const MAX_PENDING_RECORDS: &str = "TRACKER_MAX_PENDING_RECORDS";
    /// Auto-pause toggle
    pub const AUTO_PAUSE_ENABLED: &str = "TRACKER_AUTO_PAUSE_ENABLED";
    /// Auto-pause threshold override (s)
    pub const AUTO_PAUSE_THRESHOLD_SECS: &str = "TRACKER_AUTO_PAUSE_THRESHOLD_SECS";
    /// Auto-lap toggle
    pub const AUTO_LAP_ENABLED: &str = "TRACKER_AUTO_LAP_ENABLED";
    /// Auto-lap distance override (m)
    pub const AUTO_LAP_DISTANCE_M: &str = "TRACKER_AUTO_LAP_DISTANCE_M";
    /// Trend ring capacity override
    pub const TREND_HISTORY_SIZE: &str = "TRACKER_TREND_HISTORY_SIZE";
    /// Athlete FTP override (W)
    pub const ATHLETE_FTP: &str = "TRACKER_ATHLETE_FTP";
    /// Athlete max heart rate (bpm)
    pub const ATHLETE_MAX_HR: &str = "TRACKER_ATHLETE_MAX_HR";
    /// Athlete weight (kg)
    pub const ATHLETE_WEIGHT_KG: &str = "TRACKER_ATHLETE_WEIGHT_KG";
    /// Minimum location accuracy (m)
    pub const MIN_LOCATION_ACCURACY_M: &str = "TRACKER_MIN_LOCATION_ACCURACY_M";
}
