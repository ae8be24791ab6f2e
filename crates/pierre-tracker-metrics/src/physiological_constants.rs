// ABOUTME: Physiological and signal-processing constants for live metrics
// ABOUTME: Zone boundaries, motion thresholds, elevation noise filter, and energy conversion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Physiological constants based on sports science conventions.

/// Training zone boundaries
///
/// References:
/// - Coggan, A. & Allen, H. (2010). Training and Racing with a Power Meter
/// - ACSM Guidelines for Exercise Testing and Prescription, 11th Edition
pub mod zone_percentages {
    /// Heart-rate zone upper limits as a fraction of max heart rate (zones 1-4; zone 5 above)
    pub const HR_ZONE_UPPER_LIMITS: [f64; 4] = [0.60, 0.70, 0.80, 0.90];

    /// Heart-rate zone count
    pub const HR_ZONE_COUNT: usize = 5;

    /// Power zone upper limits as a fraction of FTP (zones 1-4; zone 5 above)
    pub const POWER_ZONE_UPPER_LIMITS: [f64; 4] = [0.55, 0.75, 0.90, 1.05];

    /// Power zone count
    pub const POWER_ZONE_COUNT: usize = 5;
}

/// Motion detection thresholds
pub mod motion {
    /// Speed above which the athlete is moving (m/s)
    pub const MOVING_SPEED_MPS: f64 = 0.5;

    /// Cadence above which the athlete is moving (rpm/spm)
    pub const MOVING_CADENCE: f64 = 40.0;
}

/// Elevation processing
pub mod elevation {
    /// Altitude change (m) below which deltas are treated as GPS noise
    pub const NOISE_THRESHOLD_M: f64 = 0.5;
}

/// Energy and training stress
pub mod energy {
    /// Kilocalories burned per kilojoule of mechanical work
    ///
    /// Gross efficiency (~24%) and the 4.184 kJ/kcal conversion nearly cancel.
    /// Reference: Jeukendrup, A. & Gleeson, M. (2010). Sport Nutrition
    pub const KCAL_PER_KJ: f64 = 1.0;

    /// TSS scaling: one hour at FTP equals this many points
    pub const TSS_BASE_MULTIPLIER: f64 = 100.0;
}

/// Trend analysis
pub mod trend {
    /// Relative change (fraction) treated as stable
    pub const STABLE_DEADBAND: f64 = 0.01;
}
