// ABOUTME: Tests for environment-driven tracker and logging configuration
// ABOUTME: Validates overrides, fallbacks on bad values, and rejection of invalid settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use pierre_tracker::logging::{LogFormat, LoggingConfig};
use pierre_tracker::TrackerConfig;
use pierre_tracker_core::constants::env_config;
use pierre_tracker_core::{AthleteProfile, ConfigError};
use serial_test::serial;
use std::env;
use std::time::Duration;

fn clear_tracker_env() {
    for key in [
        env_config::TICK_INTERVAL_MS,
        env_config::RECORDING_INTERVAL_MS,
        env_config::FLUSH_THRESHOLD,
        env_config::MAX_PENDING_RECORDS,
        env_config::AUTO_PAUSE_THRESHOLD_SECS,
        env_config::AUTO_LAP_DISTANCE_M,
        env_config::ATHLETE_FTP,
    ] {
        env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_tracker_env_overrides_apply() {
    clear_tracker_env();
    env::set_var(env_config::TICK_INTERVAL_MS, "250");
    env::set_var(env_config::AUTO_PAUSE_THRESHOLD_SECS, "45");
    env::set_var(env_config::AUTO_LAP_DISTANCE_M, "400");
    env::set_var(env_config::MAX_PENDING_RECORDS, "500");

    let config = TrackerConfig::from_env();
    assert_eq!(config.tick_interval, Duration::from_millis(250));
    assert_eq!(config.auto_pause_threshold, Duration::from_secs(45));
    assert!((config.auto_lap_distance_m - 400.0).abs() < f64::EPSILON);
    assert_eq!(config.max_pending_records, 500);
    assert!(config.validate().is_ok());

    clear_tracker_env();
}

#[test]
#[serial]
fn test_unparseable_tracker_env_falls_back_to_default() {
    clear_tracker_env();
    env::set_var(env_config::RECORDING_INTERVAL_MS, "often");
    env::set_var(env_config::ATHLETE_FTP, "strong");

    let config = TrackerConfig::from_env();
    let defaults = TrackerConfig::default();
    assert_eq!(config.recording_interval, defaults.recording_interval);
    assert!((config.athlete.ftp_watts - defaults.athlete.ftp_watts).abs() < f64::EPSILON);

    clear_tracker_env();
}

#[test]
#[serial]
fn test_zero_flush_threshold_from_env_fails_validation() {
    clear_tracker_env();
    env::set_var(env_config::FLUSH_THRESHOLD, "0");

    let result = TrackerConfig::from_env().validate();
    assert!(matches!(result, Err(ConfigError::ValueOutOfRange(_))));

    clear_tracker_env();
}

#[test]
fn test_athlete_profile_validation() {
    let negative_weight = TrackerConfig::default().with_athlete(AthleteProfile {
        ftp_watts: 280.0,
        max_heart_rate: Some(190.0),
        weight_kg: Some(-70.0),
    });
    assert!(negative_weight.validate().is_err());

    let zero_ftp = TrackerConfig::default().with_athlete(AthleteProfile {
        ftp_watts: 0.0,
        max_heart_rate: None,
        weight_kg: None,
    });
    assert!(zero_ftp.validate().is_err());
}

#[test]
#[serial]
fn test_logging_config_from_env() {
    env::set_var("LOG_FORMAT", "json");
    env::set_var("ENVIRONMENT", "production");
    env::set_var("SERVICE_NAME", "tracker-under-test");

    let config = LoggingConfig::from_env();
    assert_eq!(config.format, LogFormat::Json);
    assert!(config.include_location);
    assert!(config.include_thread);
    assert_eq!(config.service_name, "tracker-under-test");

    env::remove_var("LOG_FORMAT");
    env::remove_var("ENVIRONMENT");
    env::remove_var("SERVICE_NAME");

    let defaults = LoggingConfig::from_env();
    assert_eq!(defaults.format, LogFormat::Pretty);
    assert_eq!(defaults.environment, "development");
    assert_eq!(
        defaults.with_format(LogFormat::Compact).format,
        LogFormat::Compact
    );
}
