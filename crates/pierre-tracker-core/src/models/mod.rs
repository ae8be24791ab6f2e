// ABOUTME: Domain models for the live tracker: sessions, laps, samples, records, and snapshots
// ABOUTME: Re-exports ActivitySession, Lap, MetricKey, Readings, MetricSnapshot and friends
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Data Models
//!
//! Plain data shared by the metrics crate and the runtime crate. Computation
//! lives elsewhere; these types only carry values and small accessors.
//!
//! - `ActivitySession` / `Lap`: the lifecycle record handed to the caller on stop
//! - `MetricKey` / `Readings`: keyed numeric samples from the sensor collaborator
//! - `LocationFix`: a position delivered by the location collaborator
//! - `BufferedRecord`: one flattened sample staged for storage
//! - `MetricSnapshot` / `SessionSummary`: live and finalized aggregates

mod activity_type;
mod metric;
mod sample;
mod session;
mod snapshot;

pub use activity_type::ActivityType;
pub use metric::{MetricKey, Readings};
pub use sample::{BufferedRecord, LocationFix};
pub use session::{
    ActivitySession, Lap, LapOptions, PauseCause, SessionOptions, TrackerState,
};
pub use snapshot::{
    CumulativeMetrics, DerivedMetrics, MetricSnapshot, SessionSummary, Trend, TrendDirection,
    ZoneDistribution,
};
