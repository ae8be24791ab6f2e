// ABOUTME: Periodic background task handles used for the tick, auto-pause and recording timers
// ABOUTME: Each timer runs on its own tokio task and stops when its handle is dropped
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Handle to a periodic background task
///
/// The first tick fires one `period` after spawning. Dropping the handle
/// signals the task to exit before its next tick; a handler that is already
/// running is allowed to finish, so a handler may safely drop its own timer.
#[derive(Debug)]
pub struct TimerHandle {
    name: &'static str,
    shutdown_tx: Option<mpsc::Sender<()>>,
}

impl TimerHandle {
    /// Spawn a timer calling `handler` every `period` until it breaks or the handle drops
    pub fn spawn<F, Fut>(name: &'static str, period: Duration, mut handler: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ControlFlow<()>> + Send + 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => {
                        debug!(timer = name, "Timer received shutdown signal");
                        break;
                    }
                    _ = interval.tick() => {
                        if handler().await.is_break() {
                            debug!(timer = name, "Timer handler finished");
                            break;
                        }
                    }
                }
            }
        });

        Self {
            name,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Timer name used in logs
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            // Channel already closed means the task exited on its own
            if let Err(e) = tx.try_send(()) {
                debug!(timer = self.name, error = ?e, "Timer shutdown signal not delivered");
            }
        }
    }
}
