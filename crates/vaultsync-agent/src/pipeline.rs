// SPDX-FileCopyrightText: 2026 vaultsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One backup pass: authenticate, export, store, tear down.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use vaultsync_core::{
    BackupError, BackupRun, Credentials, ExportFormat, Session, UploadSink, VaultClient,
};

/// Base name of the backup artifact; the extension follows the format.
pub const ARTIFACT_STEM: &str = "vaultwarden-backup";

/// Fixed artifact name for `format`. Runs do not version their output.
pub fn artifact_name(format: ExportFormat) -> String {
    format!("{ARTIFACT_STEM}.{}", format.extension())
}

/// Wires a vault and a sink together for single-attempt backup runs.
///
/// The session acquired in a run is invalidated before [`run`](Self::run)
/// returns on every path that acquired one. Teardown failures are logged
/// and never replace the run's outcome.
pub struct BackupPipeline {
    vault: Arc<dyn VaultClient>,
    sink: Arc<dyn UploadSink>,
    credentials: Arc<Credentials>,
    format: ExportFormat,
    artifact_name: String,
}

impl BackupPipeline {
    pub fn new(
        vault: Arc<dyn VaultClient>,
        sink: Arc<dyn UploadSink>,
        credentials: Arc<Credentials>,
        format: ExportFormat,
    ) -> Self {
        Self {
            vault,
            sink,
            credentials,
            format,
            artifact_name: artifact_name(format),
        }
    }

    /// Overrides the artifact name derived from the format.
    pub fn with_artifact_name(mut self, name: impl Into<String>) -> Self {
        self.artifact_name = name.into();
        self
    }

    pub fn artifact_name(&self) -> &str {
        &self.artifact_name
    }

    /// Runs once, returning the number of bytes stored.
    pub async fn run(&self) -> Result<u64, BackupError> {
        let session = self.vault.authenticate(&self.credentials).await?;
        debug!(vault = self.vault.name(), "vault session acquired");

        let outcome = self.export_and_store(&session).await;

        match self.vault.invalidate(session).await {
            Ok(()) => debug!("vault session invalidated"),
            Err(e) => warn!(stage = %e.stage(), error = %e, "session teardown failed"),
        }

        outcome
    }

    /// Runs once and wraps the outcome with its timing.
    pub async fn run_at(&self, scheduled_at: DateTime<Utc>) -> BackupRun {
        info!(scheduled_at = %scheduled_at.to_rfc3339(), "backup run starting");
        let started = Instant::now();
        let outcome = self.run().await;
        let duration = started.elapsed();

        match &outcome {
            Ok(bytes) => info!(
                bytes,
                duration_ms = duration.as_millis() as u64,
                artifact = %self.artifact_name,
                "backup run succeeded"
            ),
            Err(e) => warn!(
                stage = %e.stage(),
                error = %e,
                duration_ms = duration.as_millis() as u64,
                "backup run failed"
            ),
        }

        BackupRun {
            scheduled_at,
            duration,
            outcome,
        }
    }

    async fn export_and_store(&self, session: &Session) -> Result<u64, BackupError> {
        let stream = self.vault.export(session, self.format).await?;
        debug!(format = %self.format, "export stream ready");
        self.sink.store(stream, &self.artifact_name).await
    }
}
