// ABOUTME: Per-sample training stress and energy increments from power output
// ABOUTME: Incremental TSS where one hour at FTP yields 100 points, plus kcal from mechanical work
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Incremental training load.
//!
//! Formula per sample: `power × (power / FTP) × Δt_hours × 100 / FTP`, i.e.
//! `(power / FTP)² × Δt_hours × 100`, the average-power TSS spread over samples.

use crate::physiological_constants::energy::{KCAL_PER_KJ, TSS_BASE_MULTIPLIER};
use pierre_tracker_core::constants::time::SECONDS_PER_HOUR;

/// Training stress contributed by one power sample held for `dt_secs`
#[must_use]
pub fn training_stress_increment(power: f64, ftp: f64, dt_secs: f64) -> f64 {
    if ftp.is_nan() || ftp <= 0.0 || power <= 0.0 {
        return 0.0;
    }
    let intensity = power / ftp;
    let dt_hours = dt_secs / SECONDS_PER_HOUR;
    power * intensity * dt_hours * TSS_BASE_MULTIPLIER / ftp
}

/// Kilocalories contributed by one power sample held for `dt_secs`
#[must_use]
pub fn calorie_increment(power: f64, dt_secs: f64) -> f64 {
    if power <= 0.0 {
        return 0.0;
    }
    let kilojoules = power * dt_secs / 1_000.0;
    kilojoules * KCAL_PER_KJ
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_hour_at_ftp_is_one_hundred() {
        let tss: f64 = (0..3600)
            .map(|_| training_stress_increment(250.0, 250.0, 1.0))
            .sum();
        assert!((tss - 100.0).abs() < 1e-6, "got {tss}");
    }

    #[test]
    fn test_half_ftp_quarters_the_stress() {
        let tss: f64 = (0..3600)
            .map(|_| training_stress_increment(125.0, 250.0, 1.0))
            .sum();
        assert!((tss - 25.0).abs() < 1e-6);
    }

    #[test]
    fn test_calories_from_work() {
        // 200 W for an hour = 720 kJ
        let kcal: f64 = (0..3600).map(|_| calorie_increment(200.0, 1.0)).sum();
        assert!((kcal - 720.0).abs() < 1e-6);
        assert!(calorie_increment(-5.0, 1.0).abs() < f64::EPSILON);
    }
}
