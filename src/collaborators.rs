// ABOUTME: Collaborator seams consumed by the tracker: sensor stream, location stream, storage writer
// ABOUTME: Transport, positioning and persistence live behind these traits and are injected at construction
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! External collaborator traits.
//!
//! The tracker never talks to hardware or a database directly. Device
//! transports, the platform location provider and the persistent store are
//! implemented elsewhere and handed to [`crate::tracker::ActivityTracker`] as
//! trait objects. The in-memory versions in [`crate::synthetic`] back the
//! tests and the simulator binary.

use async_trait::async_trait;
use pierre_tracker_core::errors::{CollaboratorError, StorageError};
use pierre_tracker_core::models::{BufferedRecord, LocationFix, Readings};
use std::fmt;

/// Callback receiving reading sets pushed by the sensor transport
pub type ReadingsCallback = Box<dyn Fn(Readings) + Send + Sync>;

/// Callback receiving fixes from the location provider
pub type LocationCallback = Box<dyn Fn(LocationFix) + Send + Sync>;

/// Handle to an active sensor subscription; dropping it unsubscribes
pub struct SensorSubscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl SensorSubscription {
    /// Wrap the transport's unsubscribe action
    #[must_use]
    pub fn new(unsubscribe: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// Subscription with nothing to release
    #[must_use]
    pub fn noop() -> Self {
        Self { unsubscribe: None }
    }

    /// Release the subscription now
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for SensorSubscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for SensorSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SensorSubscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

/// Live sensor data source (heart-rate strap, power meter, footpod...)
pub trait SensorStream: Send + Sync {
    /// Register a callback for pushed reading sets
    ///
    /// # Errors
    ///
    /// Returns `CollaboratorError` if the transport cannot accept subscribers
    fn subscribe(
        &self,
        callback: ReadingsCallback,
    ) -> Result<SensorSubscription, CollaboratorError>;

    /// Latest value per metric key, as currently known to the transport
    fn latest_readings(&self) -> Readings;
}

/// GPS/positioning provider
#[async_trait]
pub trait LocationStream: Send + Sync {
    /// Begin delivering fixes to `callback`
    ///
    /// # Errors
    ///
    /// Returns `CollaboratorError` if the provider is unavailable or permission is denied
    async fn start(&self, callback: LocationCallback) -> Result<(), CollaboratorError>;

    /// Stop delivering fixes
    ///
    /// # Errors
    ///
    /// Returns `CollaboratorError` if the provider fails to shut down cleanly
    async fn stop(&self) -> Result<(), CollaboratorError>;
}

/// Durable sink for raw samples
///
/// Delivery is at-least-once: a batch that failed may be submitted again, so
/// implementations deduplicate on [`BufferedRecord::sample_id`].
#[async_trait]
pub trait StorageWriter: Send + Sync {
    /// Persist a set of records
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the batch was not accepted; nothing from it is assumed stored
    async fn add_readings(
        &self,
        records: &[BufferedRecord],
        is_batch: bool,
    ) -> Result<(), StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_subscription_releases_once() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&released);
        let subscription = SensorSubscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        subscription.unsubscribe();
        assert_eq!(released.load(Ordering::SeqCst), 1);

        let counter = Arc::clone(&released);
        {
            let _guard = SensorSubscription::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(released.load(Ordering::SeqCst), 2);
    }
}
