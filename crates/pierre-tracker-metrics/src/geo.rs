// ABOUTME: Great-circle distance and GPS route accumulation for live sessions
// ABOUTME: Haversine formula plus an accuracy-filtered odometer fed by location fixes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use pierre_tracker_core::constants::location::EARTH_RADIUS_M;
use pierre_tracker_core::models::LocationFix;
use tracing::debug;

/// Great-circle distance in meters between two points given in decimal degrees
#[must_use]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// Accumulates distance and altitude from a stream of location fixes
///
/// Fixes with an accuracy radius above the configured limit, or with invalid
/// coordinates, are dropped without moving the reference point.
#[derive(Debug, Clone)]
pub struct RouteTracker {
    min_accuracy_m: f64,
    last_fix: Option<LocationFix>,
    distance_m: f64,
    accepted: u64,
    rejected: u64,
}

impl RouteTracker {
    /// Create a tracker that ignores fixes less accurate than `min_accuracy_m`
    #[must_use]
    pub const fn new(min_accuracy_m: f64) -> Self {
        Self {
            min_accuracy_m,
            last_fix: None,
            distance_m: 0.0,
            accepted: 0,
            rejected: 0,
        }
    }

    /// Fold one fix; returns whether it was accepted
    pub fn push(&mut self, fix: LocationFix) -> bool {
        if !fix.has_valid_coordinates()
            || fix.accuracy.is_nan()
            || fix.accuracy > self.min_accuracy_m
        {
            self.rejected += 1;
            debug!(
                accuracy = fix.accuracy,
                latitude = fix.latitude,
                longitude = fix.longitude,
                "Dropping imprecise location fix"
            );
            return false;
        }

        if let Some(previous) = self.last_fix {
            if fix.timestamp < previous.timestamp {
                self.rejected += 1;
                return false;
            }
            self.distance_m += haversine_distance(
                previous.latitude,
                previous.longitude,
                fix.latitude,
                fix.longitude,
            );
        }
        self.last_fix = Some(fix);
        self.accepted += 1;
        true
    }

    /// Odometer distance in meters, `None` until at least one fix was accepted
    #[must_use]
    pub fn distance_m(&self) -> Option<f64> {
        self.last_fix.map(|_| self.distance_m)
    }

    /// Altitude of the latest accepted fix
    #[must_use]
    pub fn altitude(&self) -> Option<f64> {
        self.last_fix.and_then(|fix| fix.altitude)
    }

    /// Accepted and rejected fix counts
    #[must_use]
    pub const fn counts(&self) -> (u64, u64) {
        (self.accepted, self.rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn fix(latitude: f64, longitude: f64, accuracy: f64, offset_secs: i64) -> LocationFix {
        LocationFix {
            timestamp: Utc::now() + Duration::seconds(offset_secs),
            latitude,
            longitude,
            altitude: Some(100.0),
            accuracy,
        }
    }

    #[test]
    fn test_thousandth_degree_latitude_is_about_111_meters() {
        let distance = haversine_distance(45.0, 7.0, 45.001, 7.0);
        assert!((distance - 111.19).abs() < 1.12, "got {distance}");
    }

    #[test]
    fn test_identical_points_are_zero_apart() {
        assert!(haversine_distance(51.5, -0.12, 51.5, -0.12).abs() < 1e-9);
    }

    #[test]
    fn test_route_tracker_skips_inaccurate_fixes() {
        let mut route = RouteTracker::new(50.0);
        assert!(route.distance_m().is_none());

        assert!(route.push(fix(45.0, 7.0, 5.0, 0)));
        assert!(!route.push(fix(45.5, 7.0, 120.0, 1)));
        assert!(route.push(fix(45.001, 7.0, 8.0, 2)));

        let distance = route.distance_m().unwrap_or_default();
        assert!((distance - 111.19).abs() < 1.12, "got {distance}");
        assert_eq!(route.counts(), (2, 1));
        assert_eq!(route.altitude(), Some(100.0));
    }
}
