//! Daemon - the motion poll loop
//!
//! Reads the sensor, gates triggers, and runs one pipeline cycle per accepted
//! trigger until interrupted.

use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;

use crate::config::GateConfig;
use crate::gate::{GateDecision, SensorGate};
use crate::pipeline::{CycleOutcome, Pipeline};
use crate::sensor::MotionSensor;

/// The nisse daemon - owns the gate state and the sensor handle
pub struct Daemon {
    gate: SensorGate,
    sensor: Box<dyn MotionSensor>,
    pipeline: Pipeline,
    poll_interval: Duration,
    rng: StdRng,
    /// Consecutive failed sensor reads
    sensor_failures: u32,
}

impl Daemon {
    /// Create a daemon seeded from OS entropy
    #[must_use]
    pub fn new(config: &GateConfig, sensor: Box<dyn MotionSensor>, pipeline: Pipeline) -> Self {
        Self::with_rng(config, sensor, pipeline, StdRng::from_entropy())
    }

    /// Create a daemon with a caller-supplied random source
    #[must_use]
    pub fn with_rng(
        config: &GateConfig,
        sensor: Box<dyn MotionSensor>,
        pipeline: Pipeline,
        rng: StdRng,
    ) -> Self {
        Self {
            gate: SensorGate::new(config.cooldown, config.active_hours),
            sensor,
            pipeline,
            poll_interval: config.poll_interval,
            rng,
            sensor_failures: 0,
        }
    }

    /// Trigger gate
    #[must_use]
    pub const fn gate(&self) -> &SensorGate {
        &self.gate
    }

    /// Run until Ctrl+C
    pub async fn run(self) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
        let shutdown_tx_clone = shutdown_tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = shutdown_tx_clone.send(()).await;
            }
        });

        self.run_until(shutdown_rx).await;
        drop(shutdown_tx);
    }

    /// Run until a message arrives on `shutdown_rx` or every sender is dropped
    ///
    /// The sensor is released on exit.
    pub async fn run_until(mut self, mut shutdown_rx: mpsc::Receiver<()>) {
        tracing::info!(
            sensor = self.sensor.name(),
            cooldown = ?self.gate.cooldown(),
            active_hours = %self.gate.active_hours(),
            "nisse awake, waiting for motion"
        );

        loop {
            let reading = tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    tracing::info!("shutdown requested");
                    break;
                }
                reading = self.sensor.motion_detected() => reading,
            };

            match reading {
                Ok(motion) => {
                    self.sensor_recovered();
                    if motion {
                        self.handle_motion(Local::now().naive_local()).await;
                    }
                }
                Err(e) => self.sensor_failed(&e),
            }

            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    tracing::info!("shutdown requested");
                    break;
                }
                () = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        self.sensor.release();
        tracing::info!("Nisse somnar... God jul!");
    }

    /// Warn on the first failure of a streak, then log at debug
    fn sensor_failed(&mut self, error: &crate::Error) {
        self.sensor_failures = self.sensor_failures.saturating_add(1);
        if self.sensor_failures == 1 {
            tracing::warn!(error = %error, "sensor read failed, treating as no motion");
        } else {
            tracing::debug!(
                error = %error,
                failures = self.sensor_failures,
                "sensor read failed, treating as no motion"
            );
        }
    }

    fn sensor_recovered(&mut self) {
        if self.sensor_failures > 0 {
            tracing::info!(failures = self.sensor_failures, "sensor read recovered");
            self.sensor_failures = 0;
        }
    }

    /// Gate a motion event at `now` and run a cycle if it is accepted
    pub async fn handle_motion(&mut self, now: NaiveDateTime) -> Option<CycleOutcome> {
        match self.gate.evaluate(now) {
            GateDecision::Accepted => {
                tracing::info!(at = %now.format("%H:%M:%S"), "motion detected");
                Some(self.pipeline.run_cycle(&mut self.rng, now.date()).await)
            }
            GateDecision::CoolingDown { remaining } => {
                tracing::debug!(remaining = ?remaining, "motion ignored, cooling down");
                None
            }
            GateDecision::OutsideActiveHours => {
                tracing::info!(
                    at = %now.format("%H:%M"),
                    active_hours = %self.gate.active_hours(),
                    "motion outside active hours"
                );
                None
            }
        }
    }
}
