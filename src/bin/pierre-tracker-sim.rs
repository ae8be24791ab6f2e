// ABOUTME: Command-line simulator driving a tracker session with synthetic sensor and GPS data
// ABOUTME: Prints lifecycle events and the completed session as JSON lines
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Pierre Tracker Simulator
//!
//! Runs one session against in-memory collaborators. Timer intervals are
//! scaled by `--tick-ms` so a long workout can be replayed in seconds.

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use pierre_tracker::logging::{LogFormat, LoggingConfig};
use pierre_tracker::synthetic::{InMemoryStorage, ScriptedLocation, ScriptedSensor};
use pierre_tracker::{
    ActivityTracker, ActivityType, LapOptions, MetricKey, SessionOptions, TrackerConfig,
    TrackerState,
};
use pierre_tracker_core::constants::location::EARTH_RADIUS_M;
use pierre_tracker_core::models::LocationFix;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

#[derive(Parser)]
#[command(name = "pierre-tracker-sim")]
#[command(about = "Replay a synthetic workout through the live activity tracker")]
struct Args {
    /// Activity type (run, ride, virtual_ride, ...)
    #[arg(long, default_value = "ride")]
    activity: String,

    /// Number of simulated one-second samples
    #[arg(long, default_value_t = 600)]
    samples: u32,

    /// Real milliseconds per simulated second
    #[arg(long, default_value_t = 10)]
    tick_ms: u64,

    /// Mean speed in m/s
    #[arg(long, default_value_t = 8.0)]
    speed: f64,

    /// Mean power in watts
    #[arg(long, default_value_t = 220.0)]
    power: f64,

    /// Athlete FTP in watts (overrides the environment)
    #[arg(long)]
    ftp: Option<f64>,

    /// Sample index at which the rider stops moving for `--stall-secs`
    #[arg(long)]
    stall_at: Option<u32>,

    /// Length of the stall in simulated seconds
    #[arg(long, default_value_t = 15)]
    stall_secs: u32,

    /// Sample index at which a manual lap is added
    #[arg(long)]
    lap_at: Option<u32>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

struct Profile {
    speed: f64,
    power: f64,
}

impl Profile {
    fn readings_at(&self, second: u32, stalled: bool) -> [(MetricKey, f64); 4] {
        let t = f64::from(second);
        let wave = (t / 45.0).sin();
        if stalled {
            return [
                (MetricKey::Speed, 0.0),
                (MetricKey::Cadence, 0.0),
                (MetricKey::Power, 0.0),
                (MetricKey::HeartRate, 110.0),
            ];
        }
        [
            (MetricKey::Speed, (self.speed + wave).max(0.0)),
            (MetricKey::Cadence, wave.mul_add(4.0, 88.0)),
            (MetricKey::Power, wave.mul_add(25.0, self.power).max(0.0)),
            (MetricKey::HeartRate, t.mul_add(0.05, 130.0).min(185.0)),
        ]
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let format = if args.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    LoggingConfig::from_env().with_format(format).init()?;

    let tick = Duration::from_millis(args.tick_ms.max(1));
    let mut config = TrackerConfig::from_env()
        .with_tick_interval(tick)
        .with_recording_interval(tick);
    config.auto_pause_check_interval = tick;
    config.auto_pause_threshold = tick * 10;
    if let Some(ftp) = args.ftp {
        config.athlete.ftp_watts = ftp;
    }

    let sensor = ScriptedSensor::new();
    let location = ScriptedLocation::new();
    let storage = InMemoryStorage::new();
    let tracker = ActivityTracker::new(
        config,
        Arc::new(sensor.clone()),
        Arc::new(location.clone()),
        Arc::new(storage.clone()),
    )?;

    let mut events = tracker.subscribe_to_state_changes();
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let Ok(line) = serde_json::to_string(&event) {
                println!("{line}");
            }
        }
    });

    let activity_type: ActivityType = args.activity.parse()?;
    let session = tracker
        .start(SessionOptions::for_activity(activity_type).named("Simulated session"))
        .await?;
    info!(activity.id = %session.id, samples = args.samples, "Simulation running");

    let profile = Profile {
        speed: args.speed,
        power: args.power,
    };
    let (mut latitude, longitude) = (45.0_f64, 7.0_f64);
    for second in 0..args.samples {
        let stalled = args
            .stall_at
            .is_some_and(|at| (at..at.saturating_add(args.stall_secs)).contains(&second));
        if !stalled && tracker.get_state().await.state == TrackerState::Paused {
            tracker.resume().await;
        }

        let readings = profile.readings_at(second, stalled);
        let speed = readings[0].1;
        for (key, value) in readings {
            sensor.set(key, value);
        }
        latitude += (speed / EARTH_RADIUS_M).to_degrees();
        location.emit(LocationFix {
            timestamp: Utc::now(),
            latitude,
            longitude,
            altitude: Some(f64::from(second % 120).mul_add(0.25, 300.0)),
            accuracy: 5.0,
        });

        if args.lap_at == Some(second) {
            tracker.add_lap(LapOptions::default()).await?;
        }
        sleep(tick).await;
    }

    let completed = tracker.stop().await?;
    println!("{}", serde_json::to_string_pretty(&completed)?);
    info!(
        records.stored = storage.records().len(),
        "Simulation finished"
    );

    drop(tracker);
    printer.abort();
    Ok(())
}
