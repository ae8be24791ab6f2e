// ABOUTME: Metric snapshot, cumulative aggregates, derived fields, trends, and the session summary
// ABOUTME: Value types produced by the metrics aggregator on every tick and once at stop
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::metric::{MetricKey, Readings};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Running aggregates over the whole session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CumulativeMetrics {
    /// Distance in meters
    pub distance_m: f64,
    /// Total ascent in meters
    pub ascent_m: f64,
    /// Total descent in meters
    pub descent_m: f64,
    /// Average heart rate (bpm)
    pub avg_heart_rate: Option<f64>,
    /// Maximum heart rate (bpm)
    pub max_heart_rate: Option<f64>,
    /// Average power (W)
    pub avg_power: Option<f64>,
    /// Maximum power (W)
    pub max_power: Option<f64>,
    /// Average cadence
    pub avg_cadence: Option<f64>,
    /// Maximum cadence
    pub max_cadence: Option<f64>,
    /// Average speed (m/s)
    pub avg_speed: Option<f64>,
    /// Maximum speed (m/s)
    pub max_speed: Option<f64>,
    /// Energy estimate in kcal
    pub calories: f64,
    /// Training stress estimate (TSS points)
    pub training_stress: f64,
}

/// Fields derived from the latest sample set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DerivedMetrics {
    /// Heart-rate zone (1-5) for the latest heart rate
    pub heart_rate_zone: Option<u8>,
    /// Power zone (1-5) for the latest power
    pub power_zone: Option<u8>,
    /// Pace in seconds per kilometer for the latest speed
    pub pace_sec_per_km: Option<f64>,
    /// Latest power divided by athlete weight (W/kg)
    pub power_to_weight: Option<f64>,
    /// Whether the athlete was moving in the latest update
    pub is_moving: bool,
}

/// Point-in-time view of a session's metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MetricSnapshot {
    /// When the snapshot was produced
    pub timestamp: Option<DateTime<Utc>>,
    /// Sample sets folded in so far
    pub updates: u64,
    /// Latest value per metric key
    pub realtime: Readings,
    /// Session-wide aggregates
    pub totals: CumulativeMetrics,
    /// Fields derived from the latest sample set
    pub derived: DerivedMetrics,
    /// Bounded recent history per metric key, oldest first
    pub history: BTreeMap<MetricKey, Vec<f64>>,
}

impl MetricSnapshot {
    /// Latest value for a key
    #[must_use]
    pub fn latest(&self, key: &MetricKey) -> Option<f64> {
        self.realtime.get(key).copied()
    }
}

/// Time spent in each training zone, index 0 = zone 1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ZoneDistribution {
    /// Seconds per zone
    pub seconds: Vec<f64>,
}

impl ZoneDistribution {
    /// Empty distribution with `zones` buckets
    #[must_use]
    pub fn with_zones(zones: usize) -> Self {
        Self {
            seconds: vec![0.0; zones],
        }
    }

    /// Total seconds across all zones
    #[must_use]
    pub fn total_seconds(&self) -> f64 {
        self.seconds.iter().sum()
    }

    /// Share of time per zone in percent; all zeros when nothing was recorded
    #[must_use]
    pub fn percentages(&self) -> Vec<f64> {
        let total = self.total_seconds();
        if total <= 0.0 {
            return vec![0.0; self.seconds.len()];
        }
        self.seconds.iter().map(|s| s / total * 100.0).collect()
    }
}

/// Direction of a metric trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    /// Increased by more than the deadband
    Up,
    /// Decreased by more than the deadband
    Down,
    /// Within the deadband
    Stable,
}

/// Change of a metric over a window of recent samples
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    /// Direction after applying the deadband
    pub direction: TrendDirection,
    /// Newest minus reference value
    pub absolute_change: f64,
    /// Change relative to the reference value, in percent
    pub percent_change: f64,
    /// Newest value
    pub current: f64,
    /// Samples actually spanned (window clamped to available history)
    pub window: usize,
}

/// Finalized metrics attached to a completed session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Last live snapshot
    pub snapshot: MetricSnapshot,
    /// Average heart rate over max heart rate
    pub intensity: Option<f64>,
    /// Average power over FTP
    pub intensity_factor: Option<f64>,
    /// Average power over athlete weight (W/kg)
    pub avg_power_to_weight: Option<f64>,
    /// Average pace in seconds per kilometer over moving samples
    pub avg_pace_sec_per_km: Option<f64>,
    /// Time in heart-rate zones
    pub heart_rate_zones: Option<ZoneDistribution>,
    /// Time in power zones
    pub power_zones: Option<ZoneDistribution>,
}
