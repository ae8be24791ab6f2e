// ABOUTME: Streaming metrics engine for live activity tracking
// ABOUTME: Aggregates keyed samples into running statistics, zones, trends, and training load
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Pierre Tracker Metrics
//!
//! Pure, synchronous computation used by the live tracker on every tick:
//!
//! - **aggregator**: `MetricsAggregator`, the per-session incremental engine
//! - **stats**: per-key running mean/max and bounded trend rings
//! - **zones**: heart-rate and power zone classification
//! - **training_load**: per-sample training stress and energy increments
//! - **geo**: Haversine distance and GPS route accumulation
//!
//! Nothing in this crate performs I/O or awaits.

/// Computation error type (never surfaced past the aggregator)
pub mod errors;

/// Physiological constants used for zones and energy estimates
pub mod physiological_constants;

/// Haversine distance and route accumulation
pub mod geo;

/// Running statistics and trend history
pub mod stats;

/// Training zone classification
pub mod zones;

/// Training stress and calorie increments
pub mod training_load;

/// Per-session metrics aggregator
pub mod aggregator;

pub use aggregator::{MetricsAggregator, MetricsConfig};
pub use errors::MetricsError;
pub use geo::{haversine_distance, RouteTracker};
