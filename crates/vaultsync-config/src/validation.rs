// SPDX-FileCopyrightText: 2026 vaultsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks what serde attributes cannot express: required values, a positive
//! backup interval, sane timeouts and a known log level.

use crate::diagnostic::ConfigError;
use crate::model::VaultSyncConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns every problem found rather than stopping at the first one.
pub fn validate_config(config: &VaultSyncConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let required = [
        ("vault.client_id", &config.vault.client_id),
        ("vault.client_secret", &config.vault.client_secret),
        ("vault.master_password", &config.vault.master_password),
        ("storage.credentials_file", &config.storage.credentials_file),
        ("storage.parent_id", &config.storage.parent_id),
    ];
    for (key, value) in required {
        if value.as_deref().is_none_or(|v| v.trim().is_empty()) {
            errors.push(ConfigError::MissingKey {
                key: key.to_string(),
            });
        }
    }

    if config.vault.export_format.is_none() {
        errors.push(ConfigError::MissingKey {
            key: "vault.export_format".to_string(),
        });
    }

    if config.vault.cli_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "vault.cli_path must not be empty".to_string(),
        });
    }

    if let Some(server) = config.vault.server.as_deref() {
        let server = server.trim();
        if !server.is_empty() && !(server.starts_with("http://") || server.starts_with("https://")) {
            errors.push(ConfigError::Validation {
                message: format!("vault.server `{server}` must be an http(s) URL"),
            });
        }
    }

    if config.storage.credentials_dir.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.credentials_dir must not be empty".to_string(),
        });
    }

    match config.schedule.interval_minutes {
        None => errors.push(ConfigError::MissingKey {
            key: "schedule.interval_minutes".to_string(),
        }),
        Some(0) => errors.push(ConfigError::Validation {
            message: "schedule.interval_minutes must be at least 1, got 0".to_string(),
        }),
        Some(minutes) if minutes > u64::MAX / 60 => errors.push(ConfigError::Validation {
            message: format!("schedule.interval_minutes is too large, got {minutes}"),
        }),
        Some(_) => {}
    }

    if config.vault.command_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "vault.command_timeout_secs must be at least 1".to_string(),
        });
    }

    if config.storage.request_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "storage.request_timeout_secs must be at least 1".to_string(),
        });
    }

    let level = config.daemon.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "daemon.log_level `{}` must be one of: {}",
                config.daemon.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
