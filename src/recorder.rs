// ABOUTME: Buffered sample recorder flattening reading sets into records and flushing them in batches
// ABOUTME: Records leave the buffer only after storage accepts them; failed batches stay queued
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::collaborators::StorageWriter;
use chrono::{DateTime, Utc};
use pierre_tracker_core::errors::{StorageError, TrackerError, TrackerResult};
use pierre_tracker_core::models::{BufferedRecord, Readings};
use pierre_tracker_core::TrackerConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

/// Buffering limits for one recorder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecorderConfig {
    /// Pending records that trigger a flush
    pub flush_threshold: usize,
    /// Attempts made by `flush_with_retry`
    pub flush_retry_limit: u32,
    /// Records the buffer may hold; sets that would exceed it are refused
    pub max_pending: usize,
}

impl From<&TrackerConfig> for RecorderConfig {
    fn from(config: &TrackerConfig) -> Self {
        Self {
            flush_threshold: config.flush_threshold.max(1),
            flush_retry_limit: config.flush_retry_limit.max(1),
            max_pending: config.max_pending_records.max(config.flush_threshold.max(1)),
        }
    }
}

/// Counters describing a recorder's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecorderStats {
    /// Records captured from the sensor
    pub captured: u64,
    /// Records accepted by storage
    pub persisted: u64,
    /// Batches accepted by storage
    pub batches: u64,
    /// Flush attempts rejected by storage
    pub failed_flushes: u64,
    /// Records refused because the buffer was full
    pub rejected: u64,
    /// Records still waiting in the buffer
    pub pending: usize,
}

/// Per-session sample buffer in front of the storage writer
#[derive(Debug)]
pub struct Recorder {
    activity_id: Uuid,
    config: RecorderConfig,
    buffer: Vec<BufferedRecord>,
    next_sequence: u64,
    last_timestamp: Option<DateTime<Utc>>,
    stats: RecorderStats,
}

impl Recorder {
    /// Create an empty recorder for `activity_id`
    #[must_use]
    pub const fn new(activity_id: Uuid, config: RecorderConfig) -> Self {
        Self {
            activity_id,
            config,
            buffer: Vec::new(),
            next_sequence: 0,
            last_timestamp: None,
            stats: RecorderStats {
                captured: 0,
                persisted: 0,
                batches: 0,
                failed_flushes: 0,
                rejected: 0,
                pending: 0,
            },
        }
    }

    /// Flatten a reading set into one record per key; returns the pending count
    ///
    /// The timestamp is clamped so records never go backwards in time. A set
    /// that does not fit under `max_pending` is refused whole and counted in
    /// `RecorderStats::rejected`.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::BacklogFull` when the set does not fit in the buffer
    pub fn capture(
        &mut self,
        readings: &Readings,
        timestamp: DateTime<Utc>,
    ) -> TrackerResult<usize> {
        let incoming = readings.values().filter(|value| value.is_finite()).count();
        if self.buffer.len() + incoming > self.config.max_pending {
            self.stats.rejected += incoming as u64;
            warn!(
                activity_id = %self.activity_id,
                rejected = incoming,
                pending = self.buffer.len(),
                capacity = self.config.max_pending,
                "Sample buffer full; refusing reading set"
            );
            return Err(TrackerError::BacklogFull {
                rejected_records: incoming,
                pending_records: self.buffer.len(),
                capacity: self.config.max_pending,
            });
        }

        let timestamp = self
            .last_timestamp
            .map_or(timestamp, |last| last.max(timestamp));
        self.last_timestamp = Some(timestamp);

        for (metric, value) in readings {
            if !value.is_finite() {
                continue;
            }
            self.buffer.push(BufferedRecord {
                activity_id: self.activity_id,
                sequence: self.next_sequence,
                timestamp,
                metric: metric.clone(),
                value: *value,
            });
            self.next_sequence += 1;
            self.stats.captured += 1;
        }
        Ok(self.buffer.len())
    }

    /// Whether the buffer reached the flush threshold
    #[must_use]
    pub fn should_flush(&self) -> bool {
        self.buffer.len() >= self.config.flush_threshold
    }

    /// Records waiting for storage
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Buffered records, oldest first
    #[must_use]
    pub fn pending_records(&self) -> &[BufferedRecord] {
        &self.buffer
    }

    /// Lifetime counters
    #[must_use]
    pub fn stats(&self) -> RecorderStats {
        RecorderStats {
            pending: self.buffer.len(),
            ..self.stats
        }
    }

    /// Hand the whole buffer to storage in one call
    ///
    /// The buffer is cleared only when storage accepts the batch; on failure
    /// every record stays queued in its original order.
    ///
    /// # Errors
    ///
    /// Returns the `StorageError` raised by the writer
    pub async fn flush(&mut self, storage: &dyn StorageWriter) -> Result<usize, StorageError> {
        if self.buffer.is_empty() {
            return Ok(0);
        }

        let count = self.buffer.len();
        match storage.add_readings(&self.buffer, true).await {
            Ok(()) => {
                self.buffer.clear();
                self.stats.persisted += count as u64;
                self.stats.batches += 1;
                debug!(activity_id = %self.activity_id, records = count, "Flushed sample batch");
                Ok(count)
            }
            Err(e) => {
                self.stats.failed_flushes += 1;
                warn!(
                    activity_id = %self.activity_id,
                    records = count,
                    error = %e,
                    "Sample batch rejected by storage; keeping records queued"
                );
                Err(e)
            }
        }
    }

    /// Flush, retrying up to the configured attempt limit
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Storage` once every attempt was rejected; records stay queued
    pub async fn flush_with_retry(
        &mut self,
        storage: &dyn StorageWriter,
    ) -> Result<usize, TrackerError> {
        let attempts = self.config.flush_retry_limit;
        let mut last_error = None;
        for attempt in 1..=attempts {
            match self.flush(storage).await {
                Ok(count) => return Ok(count),
                Err(e) => {
                    debug!(activity_id = %self.activity_id, attempt, "Flush attempt failed");
                    last_error = Some(e);
                }
            }
        }
        let reason = last_error.map_or_else(|| "no attempt made".to_owned(), |e| e.to_string());
        Err(TrackerError::storage(self.buffer.len(), attempts, reason))
    }

    /// Drop every pending record; returns how many were discarded
    pub fn discard(&mut self) -> usize {
        let discarded = self.buffer.len();
        self.buffer.clear();
        discarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::InMemoryStorage;
    use chrono::TimeDelta;
    use pierre_tracker_core::models::MetricKey;

    fn readings() -> Readings {
        [(MetricKey::HeartRate, 150.0), (MetricKey::Power, 220.0)]
            .into_iter()
            .collect()
    }

    fn recorder(threshold: usize) -> Recorder {
        Recorder::new(
            Uuid::new_v4(),
            RecorderConfig {
                flush_threshold: threshold,
                flush_retry_limit: 3,
                max_pending: 8,
            },
        )
    }

    #[test]
    fn test_capture_flattens_and_keeps_time_monotonic() {
        let mut recorder = recorder(10);
        let now = Utc::now();
        recorder.capture(&readings(), now).unwrap();
        recorder.capture(&readings(), now - TimeDelta::seconds(3)).unwrap();

        let records = recorder.pending_records();
        assert_eq!(records.len(), 4);
        assert!(records.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert!(records.windows(2).all(|w| w[0].sequence < w[1].sequence));
        assert!(!recorder.should_flush());
    }

    #[tokio::test]
    async fn test_failed_flush_keeps_every_record() {
        let storage = InMemoryStorage::new();
        let mut recorder = recorder(4);
        recorder.capture(&readings(), Utc::now()).unwrap();
        recorder.capture(&readings(), Utc::now()).unwrap();
        assert!(recorder.should_flush());

        storage.fail_next(1);
        let before: Vec<_> = recorder.pending_records().to_vec();
        assert!(recorder.flush(&storage).await.is_err());
        assert_eq!(recorder.pending_records(), before.as_slice());

        assert_eq!(recorder.flush(&storage).await.unwrap(), 4);
        assert_eq!(recorder.pending(), 0);
        assert_eq!(storage.records().len(), 4);

        let stats = recorder.stats();
        assert_eq!(stats.failed_flushes, 1);
        assert_eq!(stats.persisted, 4);
        assert_eq!(stats.batches, 1);
    }

    #[tokio::test]
    async fn test_retry_exhaustion_reports_pending_records() {
        let storage = InMemoryStorage::new();
        let mut recorder = recorder(10);
        recorder.capture(&readings(), Utc::now()).unwrap();

        storage.fail_next(5);
        let err = recorder.flush_with_retry(&storage).await.unwrap_err();
        assert!(matches!(
            err,
            TrackerError::Storage {
                pending_records: 2,
                attempts: 3,
                ..
            }
        ));
        assert_eq!(recorder.pending(), 2);
    }

    #[tokio::test]
    async fn test_full_buffer_refuses_sets_without_losing_queued_records() {
        let storage = InMemoryStorage::new();
        let mut recorder = recorder(4);
        storage.fail_next(u32::MAX);

        for _ in 0..4 {
            recorder.capture(&readings(), Utc::now()).unwrap();
            if recorder.should_flush() {
                assert!(recorder.flush(&storage).await.is_err());
            }
        }
        assert_eq!(recorder.pending(), 8);

        let err = recorder.capture(&readings(), Utc::now()).unwrap_err();
        assert_eq!(
            err,
            TrackerError::BacklogFull {
                rejected_records: 2,
                pending_records: 8,
                capacity: 8,
            }
        );
        assert_eq!(recorder.pending(), 8);
        assert_eq!(recorder.stats().rejected, 2);

        // Once storage recovers the backlog drains and capture resumes
        storage.fail_next(0);
        assert_eq!(recorder.flush(&storage).await.unwrap(), 8);
        assert_eq!(recorder.capture(&readings(), Utc::now()).unwrap(), 2);
        let sequences: Vec<_> = storage.records().iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, (0..8).collect::<Vec<_>>());
    }
}
