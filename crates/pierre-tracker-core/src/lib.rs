// ABOUTME: Core types and constants for the Pierre live activity tracker
// ABOUTME: Foundation crate with error taxonomy, tracker configuration, and domain models
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Pierre Tracker Core
//!
//! Foundation crate providing shared types for the live activity tracker.
//! It is deliberately free of async runtime dependencies so the metrics crate
//! and the runtime crate can both depend on it.
//!
//! ## Modules
//!
//! - **errors**: `TrackerError` taxonomy (validation, initialization, storage, config)
//! - **constants**: Default thresholds and physical limits organized by domain
//! - **config**: `TrackerConfig`, the single configuration value object
//! - **models**: Sessions, laps, activity types, metric keys, samples and records

/// Error taxonomy shared by every tracker component
pub mod errors;

/// Default values and physical limits organized by domain
pub mod constants;

/// Tracker configuration value object
pub mod config;

/// Session, lap, sample and record models
pub mod models;

pub use config::{AthleteProfile, TrackerConfig};
pub use errors::{ConfigError, ErrorCode, TrackerError, TrackerResult};
