// SPDX-FileCopyrightText: 2026 vaultsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./vaultsync.toml` > `~/.config/vaultsync/vaultsync.toml`
//! > `/etc/vaultsync/vaultsync.toml`, then `VAULTSYNC_*` variables, then the
//! legacy container variables (`BITWARDEN_ID`, `BACKUP_DELAY_MINUTES`, ...).

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::VaultSyncConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/vaultsync/vaultsync.toml";

/// Config file in the working directory.
pub const LOCAL_CONFIG_PATH: &str = "vaultsync.toml";

/// Legacy environment variable names and the keys they set.
pub const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("BITWARDEN_ID", "vault.client_id"),
    ("BITWARDEN_SECRET", "vault.client_secret"),
    ("BITWARDEN_MASTER_PASSWORD", "vault.master_password"),
    ("BITWARDEN_SERVER", "vault.server"),
    ("BITWARDEN_EXPORT_FORMAT", "vault.export_format"),
    ("GOOGLE_DRIVE_CREDENTIALS", "storage.credentials_file"),
    ("GOOGLE_DRIVE_PARENT_ID", "storage.parent_id"),
    ("BACKUP_DELAY_MINUTES", "schedule.interval_minutes"),
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/vaultsync/vaultsync.toml`
/// 3. `~/.config/vaultsync/vaultsync.toml`
/// 4. `./vaultsync.toml`
/// 5. `VAULTSYNC_*` environment variables
/// 6. Legacy environment variables
pub fn load_config() -> Result<VaultSyncConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no environment).
pub fn load_config_from_str(toml_content: &str) -> Result<VaultSyncConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VaultSyncConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<VaultSyncConfig, figment::Error> {
    with_env(
        Figment::new()
            .merge(Serialized::defaults(VaultSyncConfig::default()))
            .merge(Toml::file(path)),
    )
    .extract()
}

/// Build the Figment used for XDG config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    with_env(
        Figment::new()
            .merge(Serialized::defaults(VaultSyncConfig::default()))
            .merge(Toml::file(SYSTEM_CONFIG_PATH))
            .merge(Toml::file(user_config_path().unwrap_or_default()))
            .merge(Toml::file(LOCAL_CONFIG_PATH)),
    )
}

/// `~/.config/vaultsync/vaultsync.toml`, when a config dir is known.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("vaultsync/vaultsync.toml"))
}

fn with_env(figment: Figment) -> Figment {
    figment.merge(prefixed_env()).merge(legacy_env())
}

/// `VAULTSYNC_*` variables, mapped section-first with `Env::map()`.
///
/// `Env::split("_")` would turn `VAULTSYNC_VAULT_CLIENT_ID` into
/// `vault.client.id`; only the section prefix is rewritten here.
fn prefixed_env() -> Env {
    Env::prefixed("VAULTSYNC_").map(|key| {
        let mapped = key
            .as_str()
            .replacen("vault_", "vault.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("schedule_", "schedule.", 1)
            .replacen("daemon_", "daemon.", 1);
        mapped.into()
    })
}

/// Unprefixed variables understood by existing container deployments.
fn legacy_env() -> Env {
    let names: Vec<&str> = LEGACY_ENV_KEYS.iter().map(|(name, _)| *name).collect();
    Env::raw().only(&names).map(|key| {
        LEGACY_ENV_KEYS
            .iter()
            .find(|(name, _)| key == *name)
            .map(|(_, target)| target.to_string())
            .unwrap_or_else(|| key.as_str().to_string())
            .into()
    })
}
