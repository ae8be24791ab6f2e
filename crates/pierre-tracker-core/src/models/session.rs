// ABOUTME: Activity session and lap models plus the tracker lifecycle state
// ABOUTME: Laps are append-only and immutable; sessions are detached to the caller on stop
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::activity_type::ActivityType;
use super::snapshot::SessionSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Lifecycle state of a tracker; exactly one holds at any instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrackerState {
    /// No live session
    #[default]
    Idle,
    /// Session running, timers active
    Active,
    /// Session paused, elapsed time frozen
    Paused,
}

impl TrackerState {
    /// Whether a session is live (active or paused)
    #[must_use]
    pub const fn has_session(self) -> bool {
        matches!(self, Self::Active | Self::Paused)
    }
}

impl fmt::Display for TrackerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Active => write!(f, "active"),
            Self::Paused => write!(f, "paused"),
        }
    }
}

/// What caused a state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseCause {
    /// Requested by the caller
    User,
    /// Triggered by the auto-pause monitor after inactivity
    Auto,
}

impl fmt::Display for PauseCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Auto => write!(f, "auto"),
        }
    }
}

/// Caller-supplied options for `start`; unset fields fall back to configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Activity type (defaults to run)
    pub activity_type: Option<ActivityType>,
    /// Display name (defaults to the activity type's display name)
    pub name: Option<String>,
    /// Override for distance-based auto-lap
    pub auto_lap: Option<bool>,
    /// Override for inactivity auto-pause
    pub auto_pause: Option<bool>,
}

impl SessionOptions {
    /// Options for an activity type with everything else defaulted
    #[must_use]
    pub fn for_activity(activity_type: ActivityType) -> Self {
        Self {
            activity_type: Some(activity_type),
            ..Self::default()
        }
    }

    /// Set the display name
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Caller-supplied options for `add_lap`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LapOptions {
    /// Optional lap label
    pub label: Option<String>,
}

/// Immutable lap marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lap {
    /// Lap identifier
    pub id: Uuid,
    /// 1-based lap number within the session
    pub number: u32,
    /// When the lap was recorded
    pub timestamp: DateTime<Utc>,
    /// Session elapsed time at the lap (paused time excluded)
    pub elapsed: Duration,
    /// Cumulative session distance at the lap, in meters
    pub distance_m: f64,
    /// Whether the lap was inserted by auto-lap
    pub automatic: bool,
    /// Optional caller label
    pub label: Option<String>,
}

/// A tracked training session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySession {
    /// Session identifier (also the activity id on stored records)
    pub id: Uuid,
    /// Activity type
    pub activity_type: ActivityType,
    /// Display name
    pub name: String,
    /// Wall-clock start
    pub start_time: DateTime<Utc>,
    /// Wall-clock end, set on stop
    pub end_time: Option<DateTime<Utc>>,
    /// Elapsed time excluding pauses
    pub duration: Duration,
    /// Total time spent paused
    pub paused_duration: Duration,
    /// Cause of every pause, in order
    pub pauses: Vec<PauseCause>,
    /// Cumulative distance in meters (never decreases)
    pub distance_m: f64,
    /// Laps in timestamp order
    laps: Vec<Lap>,
    /// Whether auto-lap is active for this session
    pub auto_lap: bool,
    /// Whether auto-pause is active for this session
    pub auto_pause: bool,
    /// Finalized metrics, set on stop
    pub summary: Option<SessionSummary>,
}

impl ActivitySession {
    /// Create a new session record
    #[must_use]
    pub fn new(
        activity_type: ActivityType,
        name: String,
        start_time: DateTime<Utc>,
        auto_lap: bool,
        auto_pause: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            activity_type,
            name,
            start_time,
            end_time: None,
            duration: Duration::ZERO,
            paused_duration: Duration::ZERO,
            pauses: Vec::new(),
            distance_m: 0.0,
            laps: Vec::new(),
            auto_lap,
            auto_pause,
            summary: None,
        }
    }

    /// Laps recorded so far, in timestamp order
    #[must_use]
    pub fn laps(&self) -> &[Lap] {
        &self.laps
    }

    /// Distance at the most recent lap, or zero if none
    #[must_use]
    pub fn last_lap_distance(&self) -> f64 {
        self.laps.last().map_or(0.0, |lap| lap.distance_m)
    }

    /// Append a lap; the lap list is never reordered or edited
    ///
    /// A timestamp earlier than the previous lap's is clamped to it so the
    /// list stays sorted even if the wall clock steps backwards.
    pub fn push_lap(
        &mut self,
        timestamp: DateTime<Utc>,
        elapsed: Duration,
        automatic: bool,
        label: Option<String>,
    ) -> Lap {
        let timestamp = self
            .laps
            .last()
            .map_or(timestamp, |last| timestamp.max(last.timestamp));
        let lap = Lap {
            id: Uuid::new_v4(),
            number: u32::try_from(self.laps.len() + 1).unwrap_or(u32::MAX),
            timestamp,
            elapsed,
            distance_m: self.distance_m,
            automatic,
            label,
        };
        self.laps.push(lap.clone());
        lap
    }

    /// Number of automatic pauses
    #[must_use]
    pub fn auto_pause_count(&self) -> usize {
        self.pauses
            .iter()
            .filter(|cause| **cause == PauseCause::Auto)
            .count()
    }

    /// Raise cumulative distance; lower values are ignored
    pub fn advance_distance(&mut self, distance_m: f64) {
        if distance_m.is_finite() && distance_m > self.distance_m {
            self.distance_m = distance_m;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn session() -> ActivitySession {
        ActivitySession::new(ActivityType::Run, "Run".to_owned(), Utc::now(), true, true)
    }

    #[test]
    fn test_laps_stay_sorted_when_clock_steps_back() {
        let mut session = session();
        let t0 = Utc::now();
        session.push_lap(t0, Duration::from_secs(60), false, None);
        let second = session.push_lap(
            t0 - ChronoDuration::seconds(5),
            Duration::from_secs(120),
            false,
            Some("interval".to_owned()),
        );

        assert_eq!(second.timestamp, t0);
        assert_eq!(second.number, 2);
        assert!(session
            .laps()
            .windows(2)
            .all(|pair| pair[0].timestamp <= pair[1].timestamp));
    }

    #[test]
    fn test_distance_never_decreases() {
        let mut session = session();
        session.advance_distance(120.0);
        session.advance_distance(80.0);
        session.advance_distance(f64::NAN);
        assert!((session.distance_m - 120.0).abs() < f64::EPSILON);
        assert!((session.last_lap_distance()).abs() < f64::EPSILON);
    }
}
