// ABOUTME: Incremental running statistics and bounded trend history per metric key
// ABOUTME: Running mean via the n+1 recurrence, running max, and fixed-capacity rings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::physiological_constants::trend::STABLE_DEADBAND;
use pierre_tracker_core::models::{Trend, TrendDirection};
use std::collections::VecDeque;

/// Running mean and max for one metric key
///
/// Each key owns its own counter, so the mean stays exact when keys arrive at
/// different cadences.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStat {
    count: u64,
    mean: f64,
    max: f64,
}

impl RunningStat {
    /// Fold one value into the running mean and max
    pub fn push(&mut self, value: f64) {
        #[allow(clippy::cast_precision_loss)]
        let n = self.count as f64;
        self.mean += (value - self.mean) / (n + 1.0);
        if self.count == 0 || value > self.max {
            self.max = value;
        }
        self.count += 1;
    }

    /// Values folded so far
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Running mean, `None` before the first value
    #[must_use]
    pub const fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.mean)
        }
    }

    /// Running max, `None` before the first value
    #[must_use]
    pub const fn max(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.max)
        }
    }
}

/// Fixed-capacity history ring; the oldest entry is evicted on overflow
#[derive(Debug, Clone)]
pub struct TrendRing {
    capacity: usize,
    values: VecDeque<f64>,
}

impl TrendRing {
    /// Create an empty ring holding at most `capacity` entries
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            values: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a value, evicting the oldest when full
    pub fn push(&mut self, value: f64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    /// Number of stored entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the ring holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entries, oldest first
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }

    /// Compare the newest entry with the entry `window` samples back
    ///
    /// The window is clamped to the available history; `None` when empty.
    #[must_use]
    pub fn trend(&self, window: usize) -> Option<Trend> {
        let current = *self.values.back()?;
        let span = window.min(self.values.len() - 1);
        let reference = self.values[self.values.len() - 1 - span];
        let absolute_change = current - reference;

        let percent_change = if reference.abs() > f64::EPSILON {
            absolute_change / reference.abs() * 100.0
        } else {
            0.0
        };

        let direction = if reference.abs() > f64::EPSILON {
            let relative = absolute_change / reference.abs();
            if relative > STABLE_DEADBAND {
                TrendDirection::Up
            } else if relative < -STABLE_DEADBAND {
                TrendDirection::Down
            } else {
                TrendDirection::Stable
            }
        } else if absolute_change > f64::EPSILON {
            TrendDirection::Up
        } else if absolute_change < -f64::EPSILON {
            TrendDirection::Down
        } else {
            TrendDirection::Stable
        };

        Some(Trend {
            direction,
            absolute_change,
            percent_change,
            current,
            window: span,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_mean_matches_arithmetic_mean() {
        let values = [142.0, 150.5, 138.25, 161.0, 155.75, 149.0];
        let mut stat = RunningStat::default();
        for v in values {
            stat.push(v);
        }
        let expected = values.iter().sum::<f64>() / values.len() as f64;
        assert!((stat.mean().unwrap_or_default() - expected).abs() < 1e-9);
        assert_eq!(stat.max(), Some(161.0));
        assert_eq!(stat.count(), 6);
    }

    #[test]
    fn test_empty_stat_reports_nothing() {
        let stat = RunningStat::default();
        assert_eq!(stat.mean(), None);
        assert_eq!(stat.max(), None);
    }

    #[test]
    fn test_ring_evicts_oldest() {
        let mut ring = TrendRing::new(3);
        for v in [1.0, 2.0, 3.0, 4.0] {
            ring.push(v);
        }
        assert_eq!(ring.to_vec(), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_trend_deadband_and_clamping() {
        let mut ring = TrendRing::new(60);
        for v in [200.0, 201.0, 210.0] {
            ring.push(v);
        }

        let trend = ring.trend(1).unwrap();
        assert_eq!(trend.direction, TrendDirection::Up);
        assert!((trend.absolute_change - 9.0).abs() < 1e-9);

        let clamped = ring.trend(30).unwrap();
        assert_eq!(clamped.window, 2);
        assert!((clamped.percent_change - 5.0).abs() < 1e-9);

        let mut flat = TrendRing::new(10);
        flat.push(200.0);
        flat.push(201.0);
        assert_eq!(flat.trend(1).unwrap().direction, TrendDirection::Stable);

        assert!(TrendRing::new(5).trend(3).is_none());
    }
}
