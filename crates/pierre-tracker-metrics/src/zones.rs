// ABOUTME: Heart-rate and power zone classification for live samples
// ABOUTME: Maps a value to a 1-based zone given max heart rate or FTP
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::physiological_constants::zone_percentages::{
    HR_ZONE_UPPER_LIMITS, POWER_ZONE_UPPER_LIMITS,
};

/// Heart-rate zone (1-5) as a fraction of max heart rate
#[must_use]
pub fn heart_rate_zone(heart_rate: f64, max_heart_rate: f64) -> Option<u8> {
    classify(heart_rate, max_heart_rate, &HR_ZONE_UPPER_LIMITS)
}

/// Power zone (1-5) as a fraction of FTP
#[must_use]
pub fn power_zone(power: f64, ftp: f64) -> Option<u8> {
    classify(power, ftp, &POWER_ZONE_UPPER_LIMITS)
}

fn classify(value: f64, reference: f64, upper_limits: &[f64]) -> Option<u8> {
    if reference.is_nan() || reference <= 0.0 || !value.is_finite() {
        return None;
    }
    let ratio = value / reference;
    let zone = upper_limits
        .iter()
        .position(|limit| ratio < *limit)
        .unwrap_or(upper_limits.len());
    u8::try_from(zone + 1).ok()
}
