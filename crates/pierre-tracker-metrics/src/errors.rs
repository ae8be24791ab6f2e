// ABOUTME: Computation error type for metrics aggregation
// ABOUTME: Covers malformed samples and non-finite intermediate results
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use pierre_tracker_core::models::MetricKey;
use thiserror::Error;

/// Errors raised while folding a sample set
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MetricsError {
    /// Sample value is NaN or infinite
    #[error("Non-finite value for {0}")]
    NonFinite(MetricKey),

    /// Sample value outside the plausible range for its key
    #[error("Value {value} for {key} outside plausible range")]
    OutOfRange {
        /// Offending key
        key: MetricKey,
        /// Offending value
        value: f64,
    },

    /// An aggregate became non-finite after folding a sample set
    #[error("Aggregate {0} became non-finite")]
    Overflow(&'static str),
}
