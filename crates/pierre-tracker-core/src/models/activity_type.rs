// ABOUTME: Activity type enumeration for live-tracked sessions
// ABOUTME: Defines supported activity types with parsing, display, and movement heuristics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Activity being tracked
///
/// The `Other` variant carries free-form types supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    /// Running activity
    #[default]
    Run,
    /// Cycling activity
    Ride,
    /// Walking activity
    Walk,
    /// Hiking activity
    Hike,
    /// Indoor/trainer cycling
    VirtualRide,
    /// Treadmill running
    VirtualRun,
    /// Rowing activity
    Rowing,
    /// Cross-country skiing
    CrossCountrySkiing,
    /// Generic workout
    Workout,
    /// Other activity type not covered above
    Other(String),
}

impl ActivityType {
    /// Internal snake_case name
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Run => "run",
            Self::Ride => "ride",
            Self::Walk => "walk",
            Self::Hike => "hike",
            Self::VirtualRide => "virtual_ride",
            Self::VirtualRun => "virtual_run",
            Self::Rowing => "rowing",
            Self::CrossCountrySkiing => "cross_country_skiing",
            Self::Workout => "workout",
            Self::Other(name) => name,
        }
    }

    /// Default display name for a new session of this type
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self {
            Self::Run => "Run",
            Self::Ride => "Ride",
            Self::Walk => "Walk",
            Self::Hike => "Hike",
            Self::VirtualRide => "Virtual Ride",
            Self::VirtualRun => "Virtual Run",
            Self::Rowing => "Row",
            Self::CrossCountrySkiing => "Cross-Country Ski",
            Self::Workout => "Workout",
            Self::Other(name) => name,
        }
    }

    /// Whether the activity normally moves across the map (GPS distance is meaningful)
    #[must_use]
    pub const fn is_outdoor(&self) -> bool {
        !matches!(self, Self::VirtualRide | Self::VirtualRun | Self::Workout)
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "run" | "running" => Self::Run,
            "ride" | "bike_ride" | "cycling" => Self::Ride,
            "walk" | "walking" => Self::Walk,
            "hike" | "hiking" => Self::Hike,
            "virtual_ride" => Self::VirtualRide,
            "virtual_run" | "treadmill" => Self::VirtualRun,
            "rowing" | "row" => Self::Rowing,
            "cross_country_skiing" | "nordic_ski" => Self::CrossCountrySkiing,
            "workout" => Self::Workout,
            _ => Self::Other(s.to_owned()),
        })
    }
}
