// ABOUTME: Lifecycle and metrics events broadcast by the tracker to any number of listeners
// ABOUTME: EventHub owns the broadcast senders; dropping a receiver unsubscribes
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use pierre_tracker_core::models::{Lap, MetricSnapshot, PauseCause, TrackerState};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;
use uuid::Uuid;

/// Lifecycle event emitted after the corresponding transition is fully applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackerEvent {
    /// State machine moved between states
    StateChanged {
        /// Session concerned
        activity_id: Uuid,
        /// Previous state
        from: TrackerState,
        /// New state
        to: TrackerState,
        /// Pause cause, set on transitions into `Paused`
        cause: Option<PauseCause>,
    },
    /// Inactivity monitor paused the session
    AutoPaused {
        /// Session concerned
        activity_id: Uuid,
        /// Seconds without motion when the pause triggered
        idle_for_secs: f64,
    },
    /// Lap appended (manual or automatic)
    LapRecorded {
        /// Session concerned
        activity_id: Uuid,
        /// The new lap
        lap: Lap,
    },
    /// Session stopped and detached
    SessionCompleted {
        /// Session concerned
        activity_id: Uuid,
        /// Elapsed time excluding pauses
        duration_secs: f64,
        /// Final distance in meters
        distance_m: f64,
    },
    /// A batch flush was rejected by storage; records were re-queued
    FlushFailed {
        /// Session concerned
        activity_id: Uuid,
        /// Records waiting for the next attempt
        pending_records: usize,
        /// Storage error message
        error: String,
    },
    /// The pending buffer is full; a reading set was refused instead of queued
    RecordsRejected {
        /// Session concerned
        activity_id: Uuid,
        /// Records refused by this recording tick
        rejected_records: usize,
        /// Records still waiting for storage
        pending_records: usize,
    },
}

/// Per-tick metrics broadcast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsUpdate {
    /// Session concerned
    pub activity_id: Uuid,
    /// Elapsed time excluding pauses
    pub elapsed_secs: f64,
    /// Snapshot produced by this tick
    pub snapshot: MetricSnapshot,
}

/// Broadcast senders for lifecycle and metrics events
#[derive(Debug)]
pub struct EventHub {
    lifecycle: broadcast::Sender<TrackerEvent>,
    metrics: broadcast::Sender<MetricsUpdate>,
}

impl EventHub {
    /// Create a hub whose channels buffer `capacity` events per receiver
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (lifecycle, _) = broadcast::channel(capacity.max(1));
        let (metrics, _) = broadcast::channel(capacity.max(1));
        Self { lifecycle, metrics }
    }

    /// New receiver for lifecycle events
    #[must_use]
    pub fn subscribe_lifecycle(&self) -> broadcast::Receiver<TrackerEvent> {
        self.lifecycle.subscribe()
    }

    /// New receiver for metrics updates
    #[must_use]
    pub fn subscribe_metrics(&self) -> broadcast::Receiver<MetricsUpdate> {
        self.metrics.subscribe()
    }

    /// Emit a lifecycle event; having no listeners is not an error
    pub fn emit(&self, event: TrackerEvent) {
        if self.lifecycle.send(event).is_err() {
            trace!("No lifecycle listeners");
        }
    }

    /// Emit a metrics update; having no listeners is not an error
    pub fn emit_metrics(&self, update: MetricsUpdate) {
        if self.metrics.send(update).is_err() {
            trace!("No metrics listeners");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_reach_every_subscriber() {
        let hub = EventHub::new(8);
        let mut first = hub.subscribe_lifecycle();
        let mut second = hub.subscribe_lifecycle();

        let event = TrackerEvent::StateChanged {
            activity_id: Uuid::new_v4(),
            from: TrackerState::Idle,
            to: TrackerState::Active,
            cause: None,
        };
        hub.emit(event.clone());

        assert_eq!(first.recv().await.unwrap(), event);
        assert_eq!(second.recv().await.unwrap(), event);
    }

    #[test]
    fn test_event_json_is_tagged() {
        let event = TrackerEvent::AutoPaused {
            activity_id: Uuid::nil(),
            idle_for_secs: 10.0,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "auto_paused");
        assert_eq!(json["idle_for_secs"], 10.0);
    }
}
