// ABOUTME: Session orchestrator owning the Idle/Active/Paused state machine and its three timers
// ABOUTME: Composes aggregator, recorder and collaborators per session; emits lifecycle and metrics events
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Live activity tracker.
//!
//! [`ActivityTracker`] owns at most one live session. Three periodic timers
//! drive it while Active: the tick (metrics refresh and auto-lap), the
//! auto-pause monitor, and the recording cadence. Every handler runs under the
//! tracker mutex, so handlers never interleave with each other or with the
//! public operations; the only awaits under the lock are collaborator calls.
//!
//! Timer handlers carry the epoch they were spawned in. Any transition bumps
//! the epoch, so a handler that was already waiting on the lock when its timer
//! was cancelled sees a stale epoch and exits without touching the session.

mod live;

use crate::collaborators::{LocationStream, SensorStream, StorageWriter};
use crate::events::{EventHub, MetricsUpdate, TrackerEvent};
use crate::logging::TrackerLogger;
use crate::recorder::RecorderStats;
use crate::timers::TimerHandle;
use chrono::Utc;
use live::{LiveFeeds, LiveSession, SensorConsumer};
use pierre_tracker_core::errors::{TrackerError, TrackerResult};
use pierre_tracker_core::models::{
    ActivitySession, Lap, LapOptions, MetricKey, MetricSnapshot, PauseCause, SessionOptions,
    TrackerState, Trend,
};
use pierre_tracker_core::TrackerConfig;
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::time::Instant;
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

/// Snapshot of the tracker returned by [`ActivityTracker::get_state`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerStatus {
    /// Current lifecycle state
    pub state: TrackerState,
    /// Live session, if any
    pub session: Option<ActivitySession>,
    /// Elapsed time excluding pauses
    pub elapsed: Duration,
}

/// Session handed back by a successful `stop`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedSession {
    /// Detached session with its final summary
    pub session: ActivitySession,
    /// Recorder counters at completion
    pub recorder: RecorderStats,
}

/// Result of [`ActivityTracker::force_reset`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetOutcome {
    /// Session that was abandoned, if one was live
    pub session: Option<ActivitySession>,
    /// Buffered records dropped without being persisted
    pub discarded_records: usize,
}

#[derive(Debug, Clone, Copy)]
enum TimerKind {
    Tick,
    AutoPause,
    Recording,
}

impl TimerKind {
    const fn name(self) -> &'static str {
        match self {
            Self::Tick => "tick",
            Self::AutoPause => "auto_pause",
            Self::Recording => "recording",
        }
    }
}

#[derive(Default)]
struct TrackerInner {
    state: TrackerState,
    live: Option<LiveSession>,
    epoch: u64,
}

impl TrackerInner {
    /// Live session for a timer handler spawned in `epoch`, if it may still run
    fn live_for_timer(&mut self, epoch: u64) -> Option<&mut LiveSession> {
        if self.epoch != epoch || self.state != TrackerState::Active {
            return None;
        }
        self.live
            .as_mut()
            .filter(|live| live.stop_requested_at.is_none())
    }

    fn next_epoch(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }
}

struct Shared {
    config: TrackerConfig,
    sensor: Arc<dyn SensorStream>,
    location: Arc<dyn LocationStream>,
    storage: Arc<dyn StorageWriter>,
    events: EventHub,
    inner: Mutex<TrackerInner>,
}

/// Real-time activity tracking engine
///
/// Cloning is cheap and every clone drives the same tracker.
#[derive(Clone)]
pub struct ActivityTracker {
    shared: Arc<Shared>,
}

impl ActivityTracker {
    /// Create a tracker over the given collaborators
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Config` if the configuration does not validate
    pub fn new(
        config: TrackerConfig,
        sensor: Arc<dyn SensorStream>,
        location: Arc<dyn LocationStream>,
        storage: Arc<dyn StorageWriter>,
    ) -> TrackerResult<Self> {
        config.validate()?;
        let events = EventHub::new(config.event_channel_capacity);
        Ok(Self {
            shared: Arc::new(Shared {
                config,
                sensor,
                location,
                storage,
                events,
                inner: Mutex::new(TrackerInner::default()),
            }),
        })
    }

    /// Configuration this tracker was built with
    #[must_use]
    pub fn config(&self) -> &TrackerConfig {
        &self.shared.config
    }

    /// Start a session, or resume a paused one
    ///
    /// While Active this returns the live session unchanged.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Initialization` if a collaborator fails to start
    /// (the tracker is back to Idle), or `TrackerError::Validation` while a
    /// failed stop is awaiting retry
    pub async fn start(&self, options: SessionOptions) -> TrackerResult<ActivitySession> {
        let mut inner = self.shared.inner.lock().await;
        if inner
            .live
            .as_ref()
            .is_some_and(|live| live.stop_requested_at.is_some())
        {
            return Err(TrackerError::validation(
                "start",
                "a stop is pending; call stop again or force_reset",
            ));
        }

        match inner.state {
            TrackerState::Active => {
                debug!("Start requested while active; returning live session");
                inner
                    .live
                    .as_ref()
                    .map(|live| live.session.clone())
                    .ok_or_else(|| TrackerError::validation("start", "active without a session"))
            }
            TrackerState::Paused => {
                self.shared.resume_locked(&mut inner);
                inner
                    .live
                    .as_ref()
                    .map(|live| live.session.clone())
                    .ok_or_else(|| TrackerError::validation("start", "paused without a session"))
            }
            TrackerState::Idle => self.shared.start_locked(&mut inner, options).await,
        }
    }

    /// Pause the live session; `false` unless it was Active
    pub async fn pause(&self) -> bool {
        let mut inner = self.shared.inner.lock().await;
        self.shared.pause_locked(&mut inner, PauseCause::User).await
    }

    /// Resume a paused session; `false` unless it was Paused
    pub async fn resume(&self) -> bool {
        let mut inner = self.shared.inner.lock().await;
        self.shared.resume_locked(&mut inner)
    }

    /// Stop the live session and hand it back with its summary
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Validation` when no session is live, or
    /// `TrackerError::Storage` when the final flush keeps failing. In the
    /// latter case timers stay halted, the end time stays frozen, and calling
    /// `stop` again retries the flush.
    pub async fn stop(&self) -> TrackerResult<CompletedSession> {
        let mut inner = self.shared.inner.lock().await;
        self.shared.stop_locked(&mut inner).await
    }

    /// Append a manual lap
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Validation` when no session is live
    pub async fn add_lap(&self, options: LapOptions) -> TrackerResult<Lap> {
        let mut inner = self.shared.inner.lock().await;
        if !inner.state.has_session() {
            return Err(TrackerError::validation("add lap", "no live session"));
        }
        let Some(live) = inner
            .live
            .as_mut()
            .filter(|live| live.stop_requested_at.is_none())
        else {
            return Err(TrackerError::validation("add lap", "session is stopping"));
        };

        let now = Instant::now();
        let elapsed = live.elapsed_at(now);
        let lap = live
            .session
            .push_lap(live.wall_at(now), elapsed, false, options.label);
        let activity_id = live.session.id;

        TrackerLogger::log_lap(activity_id, &lap);
        self.shared.events.emit(TrackerEvent::LapRecorded {
            activity_id,
            lap: lap.clone(),
        });
        Ok(lap)
    }

    /// Current state, live session and elapsed time
    pub async fn get_state(&self) -> TrackerStatus {
        let inner = self.shared.inner.lock().await;
        let now = Instant::now();
        let elapsed = inner
            .live
            .as_ref()
            .map_or(Duration::ZERO, |live| live.elapsed_at(now));
        let session = inner.live.as_ref().map(|live| {
            let mut session = live.session.clone();
            session.duration = elapsed;
            session
        });
        TrackerStatus {
            state: inner.state,
            session,
            elapsed,
        }
    }

    /// Latest metrics snapshot of the live session
    pub async fn latest_metrics(&self) -> Option<MetricSnapshot> {
        let inner = self.shared.inner.lock().await;
        inner
            .live
            .as_ref()
            .map(|live| live.aggregator.snapshot().clone())
    }

    /// Trend of a metric over the last `window` samples of the live session
    pub async fn trend(&self, key: &MetricKey, window: usize) -> Option<Trend> {
        let inner = self.shared.inner.lock().await;
        inner
            .live
            .as_ref()
            .and_then(|live| live.aggregator.trend(key, window))
    }

    /// Listen for lifecycle events; drop the receiver to unsubscribe
    #[must_use]
    pub fn subscribe_to_state_changes(&self) -> broadcast::Receiver<TrackerEvent> {
        self.shared.events.subscribe_lifecycle()
    }

    /// Listen for per-tick metrics; drop the receiver to unsubscribe
    #[must_use]
    pub fn subscribe_to_metrics_updates(&self) -> broadcast::Receiver<MetricsUpdate> {
        self.shared.events.subscribe_metrics()
    }

    /// Abandon any live session and return to Idle unconditionally
    ///
    /// Timers halt, collaborators are released and unflushed records are
    /// discarded. This is the recovery path after a failed `stop`.
    pub async fn force_reset(&self) -> ResetOutcome {
        let mut inner = self.shared.inner.lock().await;
        inner.next_epoch();
        let previous = inner.state;
        inner.state = TrackerState::Idle;

        let Some(mut live) = inner.live.take() else {
            return ResetOutcome {
                session: None,
                discarded_records: 0,
            };
        };

        live.timers.clear();
        let discarded_records = live.recorder.discard();
        if live.location_started {
            if let Err(e) = self.shared.location.stop().await {
                warn!(error = %e, "Location stop failed during reset");
            }
        }
        let session = live.session.clone();
        drop(live);

        warn!(
            activity.id = %session.id,
            records.discarded = discarded_records,
            "Tracker force-reset"
        );
        if previous != TrackerState::Idle {
            self.shared.emit_transition(session.id, previous, TrackerState::Idle, None);
        }
        ResetOutcome {
            session: Some(session),
            discarded_records,
        }
    }
}

impl Shared {
    // Long function: the start sequence with its rollback points reads best in one place
    async fn start_locked(
        self: &Arc<Self>,
        inner: &mut TrackerInner,
        options: SessionOptions,
    ) -> TrackerResult<ActivitySession> {
        let activity_type = options.activity_type.unwrap_or_default();
        let name = options
            .name
            .unwrap_or_else(|| activity_type.display_name().to_owned());
        let session = ActivitySession::new(
            activity_type.clone(),
            name,
            Utc::now(),
            options.auto_lap.unwrap_or(self.config.auto_lap_enabled),
            options.auto_pause.unwrap_or(self.config.auto_pause_enabled),
        );
        let capacity = self.config.event_channel_capacity;

        let (readings_tx, readings_rx) = mpsc::channel(capacity);
        let subscription = self
            .sensor
            .subscribe(Box::new(move |readings| {
                if readings_tx.try_send(readings).is_err() {
                    trace!("Dropping pushed reading set; queue full or closed");
                }
            }))
            .map_err(|e| {
                error!(activity.id = %session.id, error = %e, "Sensor subscription failed");
                TrackerError::from(e)
            })?;

        let (location_tx, location_rx) = mpsc::channel(capacity);
        let location_started = if activity_type.is_outdoor() {
            let started = self
                .location
                .start(Box::new(move |fix| {
                    if location_tx.try_send(fix).is_err() {
                        trace!("Dropping location fix; queue full or closed");
                    }
                }))
                .await;
            if let Err(e) = started {
                // Rollback: release the sensor subscription before surfacing
                drop(subscription);
                error!(activity.id = %session.id, error = %e, "Location start failed; rolled back");
                return Err(e.into());
            }
            true
        } else {
            false
        };

        let mut live = LiveSession::new(
            session,
            &self.config,
            LiveFeeds {
                subscription,
                readings_rx,
                location_rx,
                location_started,
            },
        );
        let epoch = inner.next_epoch();
        self.spawn_timers(&mut live, epoch);

        let snapshot = live.session.clone();
        inner.live = Some(live);
        inner.state = TrackerState::Active;

        info!(
            activity.id = %snapshot.id,
            activity.kind = %snapshot.activity_type,
            auto_lap = snapshot.auto_lap,
            auto_pause = snapshot.auto_pause,
            location = location_started,
            "Session started"
        );
        self.emit_transition(snapshot.id, TrackerState::Idle, TrackerState::Active, None);
        Ok(snapshot)
    }

    async fn pause_locked(&self, inner: &mut TrackerInner, cause: PauseCause) -> bool {
        if inner.state != TrackerState::Active {
            return false;
        }
        let Some(live) = inner
            .live
            .as_mut()
            .filter(|live| live.stop_requested_at.is_none())
        else {
            return false;
        };

        let now = Instant::now();
        live.timers.clear();
        live.paused_at = Some(now);
        live.session.duration = live.elapsed_at(now);
        live.session.pauses.push(cause);

        if let Err(e) = live.recorder.flush(self.storage.as_ref()).await {
            self.report_flush_failure(live.session.id, live.recorder.pending(), &e.to_string());
        }
        let activity_id = live.session.id;

        inner.next_epoch();
        inner.state = TrackerState::Paused;
        self.emit_transition(
            activity_id,
            TrackerState::Active,
            TrackerState::Paused,
            Some(cause),
        );
        true
    }

    fn resume_locked(self: &Arc<Self>, inner: &mut TrackerInner) -> bool {
        if inner.state != TrackerState::Paused {
            return false;
        }
        let epoch = inner.next_epoch();
        let Some(live) = inner
            .live
            .as_mut()
            .filter(|live| live.stop_requested_at.is_none())
        else {
            return false;
        };

        let now = Instant::now();
        let gap = live.close_pause(now);
        live.last_motion = now;
        self.spawn_timers(live, epoch);
        let activity_id = live.session.id;
        debug!(activity.id = %activity_id, pause_secs = gap.as_secs_f64(), "Pause gap excluded");

        inner.state = TrackerState::Active;
        self.emit_transition(activity_id, TrackerState::Paused, TrackerState::Active, None);
        true
    }

    async fn stop_locked(&self, inner: &mut TrackerInner) -> TrackerResult<CompletedSession> {
        if !inner.state.has_session() {
            return Err(TrackerError::validation("stop", "no live session"));
        }
        inner.next_epoch();
        let previous = inner.state;
        let Some(live) = inner.live.as_mut() else {
            return Err(TrackerError::validation("stop", "no live session"));
        };

        live.timers.clear();
        if live.stop_requested_at.is_none() {
            let now = Instant::now();
            live.close_pause(now);
            live.stop_requested_at = Some(now);
            live.session.duration = live.elapsed_at(now);
            live.session.end_time = Some(live.wall_at(now));
        }

        if let Err(e) = live.recorder.flush_with_retry(self.storage.as_ref()).await {
            self.report_flush_failure(live.session.id, live.recorder.pending(), &e.to_string());
            error!(
                activity.id = %live.session.id,
                error_code = e.code().as_str(),
                "Stop failed; session kept for retry"
            );
            return Err(e);
        }

        if live.location_started {
            if let Err(e) = self.location.stop().await {
                warn!(activity.id = %live.session.id, error = %e, "Location stop failed");
            }
            live.location_started = false;
        }

        let summary = live.aggregator.finalize();
        live.session.advance_distance(summary.snapshot.totals.distance_m);
        live.session.summary = Some(summary);
        let recorder = live.recorder.stats();

        let Some(finished) = inner.live.take() else {
            return Err(TrackerError::validation("stop", "no live session"));
        };
        let session = finished.session.clone();
        // Dropping the live state releases the sensor subscription
        drop(finished);
        inner.state = TrackerState::Idle;

        TrackerLogger::log_completion(
            session.id,
            session.duration,
            session.distance_m,
            recorder.persisted,
        );
        self.emit_transition(session.id, previous, TrackerState::Idle, None);
        self.events.emit(TrackerEvent::SessionCompleted {
            activity_id: session.id,
            duration_secs: session.duration.as_secs_f64(),
            distance_m: session.distance_m,
        });
        Ok(CompletedSession { session, recorder })
    }

    fn spawn_timers(self: &Arc<Self>, live: &mut LiveSession, epoch: u64) {
        live.timers.clear();
        live.timers
            .push(self.spawn_timer(TimerKind::Tick, self.config.tick_interval, epoch));
        if live.session.auto_pause {
            live.timers.push(self.spawn_timer(
                TimerKind::AutoPause,
                self.config.auto_pause_check_interval,
                epoch,
            ));
        }
        live.timers.push(self.spawn_timer(
            TimerKind::Recording,
            self.config.recording_interval,
            epoch,
        ));
    }

    fn spawn_timer(self: &Arc<Self>, kind: TimerKind, period: Duration, epoch: u64) -> TimerHandle {
        let weak = Arc::downgrade(self);
        TimerHandle::spawn(kind.name(), period, move || {
            let weak = weak.clone();
            async move {
                let Some(shared) = weak.upgrade() else {
                    return ControlFlow::Break(());
                };
                match kind {
                    TimerKind::Tick => shared.on_tick(epoch).await,
                    TimerKind::AutoPause => shared.on_auto_pause_check(epoch).await,
                    TimerKind::Recording => shared.on_recording_tick(epoch).await,
                }
            }
        })
    }

    async fn on_tick(&self, epoch: u64) -> ControlFlow<()> {
        let mut inner = self.inner.lock().await;
        let Some(live) = inner.live_for_timer(epoch) else {
            return ControlFlow::Break(());
        };

        let now = Instant::now();
        let timestamp = live.wall_at(now);
        let readings = live.poll_all(self.sensor.as_ref());
        let snapshot = live.aggregator.update(&readings, timestamp);
        if snapshot.derived.is_moving {
            live.last_motion = now;
        }

        let elapsed = live.elapsed_at(now);
        live.session.duration = elapsed;
        live.session.advance_distance(snapshot.totals.distance_m);

        let lap = (live.session.auto_lap
            && live.session.distance_m - live.session.last_lap_distance()
                >= self.config.auto_lap_distance_m)
            .then(|| live.session.push_lap(timestamp, elapsed, true, None));
        let activity_id = live.session.id;
        drop(inner);

        self.events.emit_metrics(MetricsUpdate {
            activity_id,
            elapsed_secs: elapsed.as_secs_f64(),
            snapshot,
        });
        if let Some(lap) = lap {
            TrackerLogger::log_lap(activity_id, &lap);
            self.events.emit(TrackerEvent::LapRecorded { activity_id, lap });
        }
        ControlFlow::Continue(())
    }

    async fn on_auto_pause_check(&self, epoch: u64) -> ControlFlow<()> {
        let mut inner = self.inner.lock().await;
        let Some(live) = inner.live_for_timer(epoch) else {
            return ControlFlow::Break(());
        };

        let idle = Instant::now().saturating_duration_since(live.last_motion);
        if idle < self.config.auto_pause_threshold {
            return ControlFlow::Continue(());
        }
        let activity_id = live.session.id;
        info!(
            activity.id = %activity_id,
            idle_secs = idle.as_secs_f64(),
            "No motion detected; auto-pausing"
        );

        if self.pause_locked(&mut inner, PauseCause::Auto).await {
            self.events.emit(TrackerEvent::AutoPaused {
                activity_id,
                idle_for_secs: idle.as_secs_f64(),
            });
        }
        ControlFlow::Break(())
    }

    async fn on_recording_tick(&self, epoch: u64) -> ControlFlow<()> {
        let mut inner = self.inner.lock().await;
        let Some(live) = inner.live_for_timer(epoch) else {
            return ControlFlow::Break(());
        };

        let timestamp = live.wall_at(Instant::now());
        let readings = live.poll_sensor(self.sensor.as_ref(), SensorConsumer::Recording);
        if let Err(TrackerError::BacklogFull {
            rejected_records,
            pending_records,
            ..
        }) = live.recorder.capture(&readings, timestamp)
        {
            TrackerLogger::log_backlog_full(live.session.id, rejected_records, pending_records);
            self.events.emit(TrackerEvent::RecordsRejected {
                activity_id: live.session.id,
                rejected_records,
                pending_records,
            });
        }

        if live.recorder.should_flush() {
            if let Err(e) = live.recorder.flush(self.storage.as_ref()).await {
                self.report_flush_failure(live.session.id, live.recorder.pending(), &e.to_string());
            }
        }
        ControlFlow::Continue(())
    }

    fn report_flush_failure(&self, activity_id: Uuid, pending_records: usize, error: &str) {
        TrackerLogger::log_flush_failure(activity_id, pending_records, error);
        self.events.emit(TrackerEvent::FlushFailed {
            activity_id,
            pending_records,
            error: error.to_owned(),
        });
    }

    fn emit_transition(
        &self,
        activity_id: Uuid,
        from: TrackerState,
        to: TrackerState,
        cause: Option<PauseCause>,
    ) {
        TrackerLogger::log_transition(activity_id, from, to, cause);
        self.events.emit(TrackerEvent::StateChanged {
            activity_id,
            from,
            to,
            cause,
        });
    }
}
