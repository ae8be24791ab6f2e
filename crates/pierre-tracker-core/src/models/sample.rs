// ABOUTME: Location fixes and buffered storage records produced during a live session
// ABOUTME: BufferedRecord carries a stable sample identifier for storage-side deduplication
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::metric::MetricKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Position delivered by the location collaborator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    /// Time the fix was taken
    pub timestamp: DateTime<Utc>,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Altitude in meters, when the provider reports one
    pub altitude: Option<f64>,
    /// Horizontal accuracy radius in meters
    pub accuracy: f64,
}

impl LocationFix {
    /// Whether coordinates are finite and inside the valid lat/lon ranges
    #[must_use]
    pub fn has_valid_coordinates(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// One flattened sample staged for persistence
///
/// Delivery to storage is at-least-once. `sequence` is unique per activity
/// and stable across retries, so `(activity_id, sequence)` is the
/// deduplication key storage collaborators must honor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferedRecord {
    /// Session the sample belongs to
    pub activity_id: Uuid,
    /// Monotonic per-activity sequence number
    pub sequence: u64,
    /// Capture time (non-decreasing within an activity)
    pub timestamp: DateTime<Utc>,
    /// Channel the value was read from
    pub metric: MetricKey,
    /// Sample value
    pub value: f64,
}

impl BufferedRecord {
    /// Stable identifier for deduplication at the storage layer
    #[must_use]
    pub fn sample_id(&self) -> String {
        format!("{}:{}", self.activity_id, self.sequence)
    }
}
