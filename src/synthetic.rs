// ABOUTME: In-memory collaborators for tests, demos and the simulator binary
// ABOUTME: Scripted sensor and location streams plus a deduplicating storage writer with failure injection
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Synthetic collaborators.
//!
//! These stand in for the device transport, the platform location provider
//! and the persistent store. Values are driven explicitly by the caller, so
//! tests stay deterministic under a paused tokio clock.

use crate::collaborators::{
    LocationCallback, LocationStream, ReadingsCallback, SensorStream, SensorSubscription,
    StorageWriter,
};
use async_trait::async_trait;
use pierre_tracker_core::errors::{CollaboratorError, StorageError};
use pierre_tracker_core::models::{BufferedRecord, LocationFix, MetricKey, Readings};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct SensorState {
    latest: Mutex<Readings>,
    subscribers: Mutex<BTreeMap<u64, ReadingsCallback>>,
    next_id: AtomicU64,
    fail_subscribe: AtomicBool,
}

/// Sensor whose readings are set by the caller
#[derive(Clone, Default)]
pub struct ScriptedSensor {
    state: Arc<SensorState>,
}

impl ScriptedSensor {
    /// Sensor with no readings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the polled value for a key
    pub fn set(&self, key: MetricKey, value: f64) {
        lock(&self.state.latest).insert(key, value);
    }

    /// Replace every polled value
    pub fn set_all(&self, readings: Readings) {
        *lock(&self.state.latest) = readings;
    }

    /// Remove a key from the polled values
    pub fn clear(&self, key: &MetricKey) {
        lock(&self.state.latest).remove(key);
    }

    /// Deliver a reading set to every subscriber; polled values are left as they are
    pub fn push(&self, readings: Readings) {
        for callback in lock(&self.state.subscribers).values() {
            callback(readings.clone());
        }
    }

    /// Make the next subscriptions fail
    pub fn fail_subscriptions(&self, fail: bool) {
        self.state.fail_subscribe.store(fail, Ordering::SeqCst);
    }

    /// Active subscriber count
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        lock(&self.state.subscribers).len()
    }
}

impl SensorStream for ScriptedSensor {
    fn subscribe(
        &self,
        callback: ReadingsCallback,
    ) -> Result<SensorSubscription, CollaboratorError> {
        if self.state.fail_subscribe.load(Ordering::SeqCst) {
            return Err(CollaboratorError::new("sensor", "no sensor connected"));
        }
        let id = self.state.next_id.fetch_add(1, Ordering::SeqCst);
        lock(&self.state.subscribers).insert(id, callback);

        let state = Arc::downgrade(&self.state);
        Ok(SensorSubscription::new(move || {
            if let Some(state) = state.upgrade() {
                lock(&state.subscribers).remove(&id);
                debug!(subscription = id, "Sensor subscriber removed");
            }
        }))
    }

    fn latest_readings(&self) -> Readings {
        lock(&self.state.latest).clone()
    }
}

/// Location provider whose fixes are emitted by the caller
#[derive(Clone, Default)]
pub struct ScriptedLocation {
    callback: Arc<Mutex<Option<LocationCallback>>>,
    fail_start: Arc<AtomicBool>,
    starts: Arc<AtomicU32>,
    stops: Arc<AtomicU32>,
}

impl ScriptedLocation {
    /// Idle provider
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a fix if the provider is started; returns whether it was delivered
    pub fn emit(&self, fix: LocationFix) -> bool {
        lock(&self.callback).as_ref().is_some_and(|callback| {
            callback(fix);
            true
        })
    }

    /// Make the next starts fail
    pub fn fail_starts(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    /// Whether fixes are currently being delivered
    #[must_use]
    pub fn is_running(&self) -> bool {
        lock(&self.callback).is_some()
    }

    /// Successful start and stop counts
    #[must_use]
    pub fn calls(&self) -> (u32, u32) {
        (
            self.starts.load(Ordering::SeqCst),
            self.stops.load(Ordering::SeqCst),
        )
    }
}

#[async_trait]
impl LocationStream for ScriptedLocation {
    async fn start(&self, callback: LocationCallback) -> Result<(), CollaboratorError> {
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(CollaboratorError::new("location", "location permission denied"));
        }
        *lock(&self.callback) = Some(callback);
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> Result<(), CollaboratorError> {
        lock(&self.callback).take();
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct StorageState {
    records: Vec<BufferedRecord>,
    seen: HashSet<String>,
    batches: u64,
    rejected: u64,
}

/// Storage writer keeping records in memory, deduplicated by sample id
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    state: Arc<Mutex<StorageState>>,
    fail_remaining: Arc<AtomicU32>,
}

impl InMemoryStorage {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `count` writes
    pub fn fail_next(&self, count: u32) {
        self.fail_remaining.store(count, Ordering::SeqCst);
    }

    /// Stored records in arrival order
    #[must_use]
    pub fn records(&self) -> Vec<BufferedRecord> {
        lock(&self.state).records.clone()
    }

    /// Accepted and rejected write counts
    #[must_use]
    pub fn write_counts(&self) -> (u64, u64) {
        let state = lock(&self.state);
        (state.batches, state.rejected)
    }
}

#[async_trait]
impl StorageWriter for InMemoryStorage {
    async fn add_readings(
        &self,
        records: &[BufferedRecord],
        _is_batch: bool,
    ) -> Result<(), StorageError> {
        let should_fail = self
            .fail_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();

        let mut state = lock(&self.state);
        if should_fail {
            state.rejected += 1;
            return Err(StorageError::new(records.len(), "simulated storage outage"));
        }
        for record in records {
            if state.seen.insert(record.sample_id()) {
                state.records.push(record.clone());
            }
        }
        state.batches += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_storage_deduplicates_resubmitted_records() {
        let storage = InMemoryStorage::new();
        let record = BufferedRecord {
            activity_id: Uuid::new_v4(),
            sequence: 7,
            timestamp: Utc::now(),
            metric: MetricKey::Power,
            value: 240.0,
        };
        let batch = vec![record];

        storage.add_readings(&batch, true).await.unwrap();
        storage.add_readings(&batch, true).await.unwrap();
        assert_eq!(storage.records().len(), 1);
        assert_eq!(storage.write_counts(), (2, 0));
    }

    #[test]
    fn test_sensor_push_reaches_subscribers_until_unsubscribed() {
        let sensor = ScriptedSensor::new();
        let seen = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&seen);
        let subscription = sensor
            .subscribe(Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        sensor.push([(MetricKey::HeartRate, 150.0)].into_iter().collect());
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert!(sensor.latest_readings().is_empty());

        drop(subscription);
        sensor.push([(MetricKey::HeartRate, 151.0)].into_iter().collect());
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(sensor.subscriber_count(), 0);
    }
}
