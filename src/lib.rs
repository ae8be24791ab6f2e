// ABOUTME: Main library entry point for the Pierre live activity tracker
// ABOUTME: Session orchestration, buffered recording and collaborator seams over the metrics engine
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Pierre Tracker
//!
//! Real-time activity tracking: turns a live stream of sensor and location
//! samples into a pausable, lap-annotated training session with persisted raw
//! samples and incrementally computed summary metrics.
//!
//! ## Architecture
//!
//! - **tracker**: `ActivityTracker`, the Idle/Active/Paused state machine and its timers
//! - **recorder**: buffered sample pipeline in front of the storage writer
//! - **collaborators**: sensor, location and storage traits implemented by the host
//! - **events**: lifecycle and metrics broadcasts
//! - **synthetic**: in-memory collaborators for tests and the simulator
//!
//! Metrics computation lives in `pierre-tracker-metrics`; configuration,
//! errors and models live in `pierre-tracker-core`.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use pierre_tracker::synthetic::{InMemoryStorage, ScriptedLocation, ScriptedSensor};
//! use pierre_tracker::{ActivityTracker, SessionOptions, TrackerConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let tracker = ActivityTracker::new(
//!         TrackerConfig::from_env(),
//!         Arc::new(ScriptedSensor::new()),
//!         Arc::new(ScriptedLocation::new()),
//!         Arc::new(InMemoryStorage::new()),
//!     )?;
//!
//!     let session = tracker.start(SessionOptions::default()).await?;
//!     println!("Tracking {}", session.id);
//!     let completed = tracker.stop().await?;
//!     println!("Elapsed {:?}", completed.session.duration);
//!     Ok(())
//! }
//! ```

/// External collaborator traits (sensor, location, storage)
pub mod collaborators;

/// Lifecycle and metrics events
pub mod events;

/// Structured logging setup
pub mod logging;

/// Buffered sample recorder
pub mod recorder;

/// In-memory collaborators
pub mod synthetic;

/// Periodic task handles
pub mod timers;

/// Session orchestrator
pub mod tracker;

pub use events::{MetricsUpdate, TrackerEvent};
pub use pierre_tracker_core::models::{
    ActivitySession, ActivityType, Lap, LapOptions, MetricKey, MetricSnapshot, PauseCause,
    Readings, SessionOptions, SessionSummary, TrackerState,
};
pub use pierre_tracker_core::{TrackerConfig, TrackerError, TrackerResult};
pub use recorder::{Recorder, RecorderStats};
pub use tracker::{ActivityTracker, CompletedSession, ResetOutcome, TrackerStatus};
