// SPDX-FileCopyrightText: 2026 vaultsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-cadence scheduler driving the backup pipeline.
//!
//! The first run starts immediately, later runs on every interval tick.
//! A run is never interrupted: cancellation is only observed while waiting
//! for the next tick. The first failed run stops the loop and is returned
//! to the caller, which is expected to exit non-zero.

use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use vaultsync_core::BackupError;

use crate::pipeline::BackupPipeline;

pub struct Scheduler {
    pipeline: BackupPipeline,
    interval: Duration,
}

impl Scheduler {
    pub fn new(pipeline: BackupPipeline, interval: Duration) -> Self {
        Self { pipeline, interval }
    }

    /// Runs until `cancel` fires between runs or a run fails.
    ///
    /// Returns the number of completed runs on cancellation.
    pub async fn run(&self, cancel: CancellationToken) -> Result<u64, BackupError> {
        let mut ticker = tokio::time::interval(self.interval);
        // An overrunning run is followed by one immediate run; later ticks
        // stay on the original cadence.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            interval_secs = self.interval.as_secs(),
            artifact = self.pipeline.artifact_name(),
            "scheduler started"
        );

        let mut completed = 0u64;
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(runs = completed, "scheduler shutting down");
                    return Ok(completed);
                }
                _ = ticker.tick() => {}
            }

            let run = self.pipeline.run_at(Utc::now()).await;
            match run.into_result() {
                Ok(_) => completed += 1,
                Err(e) => {
                    error!(stage = %e.stage(), error = %e, "backup failed, stopping scheduler");
                    return Err(e);
                }
            }
        }
    }
}
