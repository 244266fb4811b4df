// SPDX-FileCopyrightText: 2026 vaultsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Startup wiring: turns a validated config into a pipeline and scheduler.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::info;
use vaultsync_agent::{BackupPipeline, Scheduler, install_signal_handler};
use vaultsync_bitwarden::BitwardenCli;
use vaultsync_config::VaultSyncConfig;
use vaultsync_config::model::mask_secret;
use vaultsync_core::BackupError;

/// Builds the pipeline from a validated config.
///
/// Reads the Drive service-account key, so a missing or malformed key file
/// fails here with [`BackupError::Config`] before any run starts.
pub fn build_pipeline(config: &VaultSyncConfig) -> Result<BackupPipeline, BackupError> {
    let credentials = Arc::new(config.vault.credentials()?);
    let format = config.vault.format()?;

    let vault = Arc::new(BitwardenCli::new(
        &config.vault.cli_path,
        config.vault.command_timeout(),
    ));
    let sink = Arc::new(vaultsync_gdrive::sink_from_key_file(
        &config.storage.credentials_path()?,
        config.storage.parent()?,
        config.storage.request_timeout(),
    )?);

    Ok(BackupPipeline::new(vault, sink, credentials, format))
}

/// `vaultsync run`: scheduled runs until a signal or the first failure.
pub async fn run_scheduled(config: &VaultSyncConfig) -> Result<(), BackupError> {
    let pipeline = build_pipeline(config)?;
    let interval = config.schedule.interval()?;
    let cancel = install_signal_handler();

    let completed = Scheduler::new(pipeline, interval).run(cancel).await?;
    info!(runs = completed, "vaultsync stopped");
    Ok(())
}

/// `vaultsync once`: a single run.
pub async fn run_once(config: &VaultSyncConfig) -> Result<(), BackupError> {
    let pipeline = build_pipeline(config)?;
    let bytes = pipeline.run().await?;
    info!(bytes, artifact = pipeline.artifact_name(), "backup stored");
    Ok(())
}

/// Human-readable config summary with secrets masked.
pub fn summary(config: &VaultSyncConfig) -> String {
    let masked = |value: &Option<String>| {
        value
            .as_deref()
            .map(mask_secret)
            .unwrap_or_else(|| "(unset)".to_string())
    };
    let plain = |value: &Option<String>| value.clone().unwrap_or_else(|| "(unset)".to_string());

    let mut out = String::new();
    let _ = writeln!(out, "[vault]");
    let _ = writeln!(out, "  client_id       = {}", plain(&config.vault.client_id));
    let _ = writeln!(out, "  client_secret   = {}", masked(&config.vault.client_secret));
    let _ = writeln!(out, "  master_password = {}", masked(&config.vault.master_password));
    let _ = writeln!(
        out,
        "  server          = {}",
        config.vault.server.as_deref().unwrap_or("(default)")
    );
    let _ = writeln!(
        out,
        "  export_format   = {}",
        config
            .vault
            .export_format
            .map(|f| f.to_string())
            .unwrap_or_else(|| "(unset)".to_string())
    );
    let _ = writeln!(out, "  cli_path        = {}", config.vault.cli_path);
    let _ = writeln!(out, "[storage]");
    let _ = writeln!(
        out,
        "  credentials     = {}",
        config
            .storage
            .credentials_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| "(unset)".to_string())
    );
    let _ = writeln!(out, "  parent_id       = {}", plain(&config.storage.parent_id));
    let _ = writeln!(out, "[schedule]");
    let _ = writeln!(
        out,
        "  interval        = {} min",
        config
            .schedule
            .interval_minutes
            .map(|m| m.to_string())
            .unwrap_or_else(|| "(unset)".to_string())
    );
    out
}
