// ABOUTME: Metric keys and keyed reading sets delivered by the sensor collaborator
// ABOUTME: Well-known keys (heart rate, power, cadence, speed, distance, altitude) plus custom keys
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Key identifying one numeric channel of the sample stream
///
/// Serialized as its snake_case string so reading sets round-trip as plain
/// JSON objects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MetricKey {
    /// Heart rate in bpm
    HeartRate,
    /// Power in watts
    Power,
    /// Cadence in rpm (cycling) or steps per minute (running)
    Cadence,
    /// Speed in meters per second
    Speed,
    /// Absolute odometer distance in meters
    Distance,
    /// Altitude in meters
    Altitude,
    /// Temperature in degrees Celsius
    Temperature,
    /// Any other channel reported by the sensor
    Custom(String),
}

impl MetricKey {
    /// Snake_case name used on the wire and in storage records
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::HeartRate => "heart_rate",
            Self::Power => "power",
            Self::Cadence => "cadence",
            Self::Speed => "speed",
            Self::Distance => "distance",
            Self::Altitude => "altitude",
            Self::Temperature => "temperature",
            Self::Custom(name) => name,
        }
    }

    /// Whether the key participates in running mean/max aggregates
    #[must_use]
    pub const fn is_averaged(&self) -> bool {
        matches!(
            self,
            Self::HeartRate | Self::Power | Self::Cadence | Self::Speed
        )
    }
}

impl From<String> for MetricKey {
    fn from(value: String) -> Self {
        match value.as_str() {
            "heart_rate" | "heartRate" | "hr" => Self::HeartRate,
            "power" => Self::Power,
            "cadence" => Self::Cadence,
            "speed" => Self::Speed,
            "distance" => Self::Distance,
            "altitude" | "elevation" => Self::Altitude,
            "temperature" => Self::Temperature,
            _ => Self::Custom(value),
        }
    }
}

impl From<&str> for MetricKey {
    fn from(value: &str) -> Self {
        Self::from(value.to_owned())
    }
}

impl From<MetricKey> for String {
    fn from(key: MetricKey) -> Self {
        match key {
            MetricKey::Custom(name) => name,
            other => other.as_str().to_owned(),
        }
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One instantaneous reading set: latest value per metric key
pub type Readings = BTreeMap<MetricKey, f64>;
