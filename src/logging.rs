// ABOUTME: Logging configuration and structured logging setup for the tracker runtime
// ABOUTME: Configures log levels, formatters, and output destinations plus lifecycle log helpers
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Structured logging configuration

use anyhow::{anyhow, Result};
use pierre_tracker_core::errors::ErrorCode;
use pierre_tracker_core::models::{Lap, PauseCause, TrackerState};
use serde_json::json;
use std::env;
use std::io;
use std::time::Duration;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};
use uuid::Uuid;

/// Service name reported in startup logs
pub const SERVICE_NAME: &str = "pierre-tracker";

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty, compact)
    pub format: LogFormat,
    /// Include source file and line numbers
    pub include_location: bool,
    /// Include thread information
    pub include_thread: bool,
    /// Include span open/close events
    pub include_spans: bool,
    /// Service name for structured logging
    pub service_name: String,
    /// Service version
    pub service_version: String,
    /// Environment (development, staging, production)
    pub environment: String,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// `JSON` format for production logging
    Json,
    /// Pretty format for development
    Pretty,
    /// Compact format for space-constrained environments
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty,
            include_location: false,
            include_thread: false,
            include_spans: false,
            service_name: SERVICE_NAME.into(),
            service_version: env!("CARGO_PKG_VERSION").to_owned(),
            environment: "development".into(),
        }
    }
}

impl LoggingConfig {
    /// Create logging configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let level = env::var("RUST_LOG").unwrap_or_else(|_| "info".into());

        let format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") => LogFormat::Compact,
            _ => LogFormat::Pretty,
        };

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let is_production = environment == "production";

        Self {
            level,
            format,
            include_location: is_production || env::var("LOG_INCLUDE_LOCATION").is_ok(),
            include_thread: is_production || env::var("LOG_INCLUDE_THREAD").is_ok(),
            include_spans: env::var("LOG_INCLUDE_SPANS").is_ok(),
            service_name: env::var("SERVICE_NAME").unwrap_or_else(|_| SERVICE_NAME.into()),
            service_version: env::var("SERVICE_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_owned()),
            environment,
        }
    }

    /// Override the output format
    #[must_use]
    pub const fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Build the filter: `RUST_LOG` when set, otherwise the configured level for tracker crates
    fn env_filter(&self) -> EnvFilter {
        let base = env::var("RUST_LOG").map_or_else(
            |_| EnvFilter::new(&self.level),
            |directive| EnvFilter::new(&directive),
        );
        ["pierre_tracker", "pierre_tracker_core", "pierre_tracker_metrics"]
            .iter()
            .fold(base, |filter, target| {
                filter.add_directive(
                    format!("{target}={}", self.level)
                        .parse()
                        .unwrap_or_else(|_| Level::INFO.into()),
                )
            })
    }

    /// Initialize the global tracing subscriber
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already installed
    pub fn init(&self) -> Result<()> {
        let registry = tracing_subscriber::registry().with(self.env_filter());
        let span_events = if self.include_spans {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        let installed = match self.format {
            LogFormat::Json => registry
                .with(
                    fmt::layer()
                        .with_file(self.include_location)
                        .with_line_number(self.include_location)
                        .with_thread_ids(self.include_thread)
                        .with_thread_names(self.include_thread)
                        .with_target(true)
                        .with_writer(io::stdout)
                        .with_span_events(span_events)
                        .json(),
                )
                .try_init(),
            LogFormat::Pretty => registry
                .with(
                    fmt::layer()
                        .with_file(self.include_location)
                        .with_line_number(self.include_location)
                        .with_thread_ids(self.include_thread)
                        .with_thread_names(self.include_thread)
                        .with_target(true)
                        .with_writer(io::stdout)
                        .with_span_events(span_events),
                )
                .try_init(),
            LogFormat::Compact => registry
                .with(
                    fmt::layer()
                        .compact()
                        .with_file(false)
                        .with_line_number(false)
                        .with_target(false)
                        .with_writer(io::stderr)
                        .with_span_events(FmtSpan::NONE),
                )
                .try_init(),
        };
        installed.map_err(|e| anyhow!("Failed to install tracing subscriber: {e}"))?;

        self.log_startup_info();
        Ok(())
    }

    fn log_startup_info(&self) {
        info!(
            service.name = %self.service_name,
            service.version = %self.service_version,
            environment = %self.environment,
            log.level = %self.level,
            log.format = ?self.format,
            "Pierre tracker starting up"
        );

        let config_summary = json!({
            "service": {
                "name": self.service_name,
                "version": self.service_version,
                "environment": self.environment
            },
            "logging": {
                "level": self.level,
                "format": format!("{:?}", self.format),
                "features": {
                    "location": self.include_location,
                    "thread": self.include_thread,
                    "spans": self.include_spans
                }
            }
        });
        info!("Logging configured: {config_summary}");
    }
}

/// Initialize logging with default configuration
///
/// # Errors
///
/// Returns an error if logging initialization fails
pub fn init_default() -> Result<()> {
    LoggingConfig::default().init()
}

/// Initialize logging from environment
///
/// # Errors
///
/// Returns an error if logging initialization fails
pub fn init_from_env() -> Result<()> {
    LoggingConfig::from_env().init()
}

/// Tracker-specific logging helpers with consistent field names
pub struct TrackerLogger;

impl TrackerLogger {
    /// Log a lifecycle transition
    pub fn log_transition(
        activity_id: Uuid,
        from: TrackerState,
        to: TrackerState,
        cause: Option<PauseCause>,
    ) {
        info!(
            activity.id = %activity_id,
            state.from = %from,
            state.to = %to,
            pause.cause = ?cause,
            "Tracker state changed"
        );
    }

    /// Log a recorded lap
    pub fn log_lap(activity_id: Uuid, lap: &Lap) {
        info!(
            activity.id = %activity_id,
            lap.number = lap.number,
            lap.automatic = lap.automatic,
            lap.distance_m = lap.distance_m,
            lap.elapsed_secs = lap.elapsed.as_secs_f64(),
            "Lap recorded"
        );
    }

    /// Log a flush that storage rejected
    pub fn log_flush_failure(activity_id: Uuid, pending: usize, error: &str) {
        warn!(
            activity.id = %activity_id,
            records.pending = pending,
            error = %error,
            "Sample flush failed; records stay queued"
        );
    }

    /// Log a reading set refused because the pending buffer is full
    pub fn log_backlog_full(activity_id: Uuid, rejected: usize, pending: usize) {
        error!(
            activity.id = %activity_id,
            records.rejected = rejected,
            records.pending = pending,
            error_code = ErrorCode::RecordBacklogFull.as_str(),
            "Sample buffer full; storage has not accepted a batch"
        );
    }

    /// Log a completed session
    pub fn log_completion(activity_id: Uuid, duration: Duration, distance_m: f64, persisted: u64) {
        info!(
            activity.id = %activity_id,
            session.duration_secs = duration.as_secs_f64(),
            session.distance_m = distance_m,
            records.persisted = persisted,
            "Session completed"
        );
    }
}
