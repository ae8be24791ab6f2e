// ABOUTME: Error taxonomy for the live tracker (validation, initialization, storage, config)
// ABOUTME: Provides TrackerError with stable error codes and collaborator-facing error types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Tracker Error Types
//!
//! - `TrackerError` - errors surfaced by the public tracker operations
//! - `StorageError` - returned by storage collaborators when a batch is rejected
//! - `CollaboratorError` - returned by sensor/location collaborators on start/stop
//! - `ConfigError` - configuration validation failures
//!
//! Computation errors never leave the metrics crate and are not part of this
//! taxonomy.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Stable error codes for logs and callers that branch on the failure class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Operation precondition did not hold (no state change)
    ValidationFailed,
    /// A collaborator failed while a session was being started
    InitializationFailed,
    /// Storage kept rejecting the pending batch after every retry
    StorageRetriesExhausted,
    /// The pending record buffer is full; new samples were refused
    RecordBacklogFull,
    /// Configuration rejected by validation
    ConfigInvalid,
}

impl ErrorCode {
    /// String form used in structured log fields
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::InitializationFailed => "INITIALIZATION_FAILED",
            Self::StorageRetriesExhausted => "STORAGE_RETRIES_EXHAUSTED",
            Self::RecordBacklogFull => "RECORD_BACKLOG_FULL",
            Self::ConfigInvalid => "CONFIG_INVALID",
        }
    }

    /// Whether the tracker state machine is guaranteed unchanged by this error
    #[must_use]
    pub const fn leaves_state_untouched(self) -> bool {
        matches!(self, Self::ValidationFailed | Self::ConfigInvalid)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration-related errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Interval must be strictly positive
    #[error("Interval must be greater than zero: {0}")]
    ZeroInterval(&'static str),

    /// Numeric value outside valid range for parameter
    #[error("Value out of range: {0}")]
    ValueOutOfRange(&'static str),
}

/// Error returned by a storage collaborator when it does not accept a batch
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Storage rejected {records} records: {reason}")]
pub struct StorageError {
    /// Number of records in the rejected batch
    pub records: usize,
    /// Collaborator-provided reason
    pub reason: String,
}

impl StorageError {
    /// Create a storage error for a batch of the given size
    #[must_use]
    pub fn new(records: usize, reason: impl Into<String>) -> Self {
        Self {
            records,
            reason: reason.into(),
        }
    }
}

/// Error returned by sensor or location collaborators
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{collaborator} failed: {reason}")]
pub struct CollaboratorError {
    /// Collaborator name (`sensor`, `location`)
    pub collaborator: &'static str,
    /// Collaborator-provided reason
    pub reason: String,
}

impl CollaboratorError {
    /// Create a collaborator error
    #[must_use]
    pub fn new(collaborator: &'static str, reason: impl Into<String>) -> Self {
        Self {
            collaborator,
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by tracker operations
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TrackerError {
    /// Invalid precondition (for example `stop` with no live session)
    #[error("Cannot {operation}: {reason}")]
    Validation {
        /// Operation that was rejected
        operation: &'static str,
        /// Why the precondition failed
        reason: String,
    },

    /// A collaborator failed during `start`; the tracker rolled back to idle
    #[error("Failed to initialize {component}: {reason}")]
    Initialization {
        /// Component that failed (`sensor`, `location`, ...)
        component: &'static str,
        /// Failure reason
        reason: String,
    },

    /// Storage rejected the final batch after every retry
    #[error("Storage retries exhausted after {attempts} attempts with {pending_records} records pending: {reason}")]
    Storage {
        /// Records still buffered in memory
        pending_records: usize,
        /// Flush attempts made
        attempts: u32,
        /// Last storage failure
        reason: String,
    },

    /// Storage has been rejecting batches long enough to fill the pending buffer
    #[error("Refused {rejected_records} records: {pending_records} pending of {capacity} allowed")]
    BacklogFull {
        /// Records refused by this capture
        rejected_records: usize,
        /// Records waiting for storage
        pending_records: usize,
        /// Configured cap on pending records
        capacity: usize,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl TrackerError {
    /// Create a validation error for an operation
    #[must_use]
    pub fn validation(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            operation,
            reason: reason.into(),
        }
    }

    /// Create an initialization error for a component
    #[must_use]
    pub fn initialization(component: &'static str, reason: impl Into<String>) -> Self {
        Self::Initialization {
            component,
            reason: reason.into(),
        }
    }

    /// Create a storage-exhausted error
    #[must_use]
    pub fn storage(pending_records: usize, attempts: u32, reason: impl Into<String>) -> Self {
        Self::Storage {
            pending_records,
            attempts,
            reason: reason.into(),
        }
    }

    /// Error code for this error
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { .. } => ErrorCode::ValidationFailed,
            Self::Initialization { .. } => ErrorCode::InitializationFailed,
            Self::Storage { .. } => ErrorCode::StorageRetriesExhausted,
            Self::BacklogFull { .. } => ErrorCode::RecordBacklogFull,
            Self::Config(_) => ErrorCode::ConfigInvalid,
        }
    }
}

impl From<CollaboratorError> for TrackerError {
    fn from(error: CollaboratorError) -> Self {
        Self::Initialization {
            component: error.collaborator,
            reason: error.reason,
        }
    }
}

/// Result alias used by tracker operations
pub type TrackerResult<T> = Result<T, TrackerError>;
