// SPDX-FileCopyrightText: 2026 vaultsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for vaultsync.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup. Required values are modelled as `Option` so a
//! missing key is reported by validation alongside every other problem
//! instead of aborting deserialization at the first one.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use vaultsync_core::{BackupError, Credentials, ExportFormat};

/// Top-level vaultsync configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultSyncConfig {
    /// Password-vault (Bitwarden) settings.
    #[serde(default)]
    pub vault: VaultConfig,

    /// Backup destination (Google Drive) settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Backup cadence.
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Process-level settings.
    #[serde(default)]
    pub daemon: DaemonConfig,
}

/// Password-vault configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// API-key client id (`user.xxxxxxxx-...`).
    #[serde(default, deserialize_with = "lenient_string")]
    pub client_id: Option<String>,

    /// API-key client secret.
    #[serde(default, deserialize_with = "lenient_string")]
    pub client_secret: Option<String>,

    /// Master passphrase used to unlock the vault.
    #[serde(default, deserialize_with = "lenient_string")]
    pub master_password: Option<String>,

    /// Self-hosted server URL. `None` uses the CLI's configured default.
    #[serde(default, deserialize_with = "lenient_string")]
    pub server: Option<String>,

    /// Export format passed to the vault.
    #[serde(default)]
    pub export_format: Option<ExportFormat>,

    /// Path or name of the `bw` executable.
    #[serde(default = "default_cli_path")]
    pub cli_path: String,

    /// Upper bound for a single CLI invocation, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub command_timeout_secs: u64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            master_password: None,
            server: None,
            export_format: None,
            cli_path: default_cli_path(),
            command_timeout_secs: default_timeout_secs(),
        }
    }
}

impl fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[REDACTED]"))
            .field(
                "master_password",
                &self.master_password.as_ref().map(|_| "[REDACTED]"),
            )
            .field("server", &self.server)
            .field("export_format", &self.export_format)
            .field("cli_path", &self.cli_path)
            .field("command_timeout_secs", &self.command_timeout_secs)
            .finish()
    }
}

impl VaultConfig {
    /// Builds the immutable credential bundle handed to the pipeline.
    ///
    /// Only fails on configs that did not pass validation.
    pub fn credentials(&self) -> Result<Credentials, BackupError> {
        let client_id = required(&self.client_id, "vault.client_id")?;
        let client_secret = required(&self.client_secret, "vault.client_secret")?;
        let master_password = required(&self.master_password, "vault.master_password")?;
        let server = self
            .server
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(Credentials::new(
            client_id,
            SecretString::from(client_secret.to_string()),
            SecretString::from(master_password.to_string()),
            server,
        ))
    }

    pub fn format(&self) -> Result<ExportFormat, BackupError> {
        self.export_format
            .ok_or_else(|| BackupError::Config("vault.export_format is required".into()))
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

fn default_cli_path() -> String {
    "bw".to_string()
}

fn default_timeout_secs() -> u64 {
    600
}

/// Google Drive destination configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Directory holding the service-account credential file.
    #[serde(default = "default_credentials_dir")]
    pub credentials_dir: String,

    /// File name of the service-account JSON inside `credentials_dir`.
    #[serde(default, deserialize_with = "lenient_string")]
    pub credentials_file: Option<String>,

    /// Drive folder (or shared drive) id receiving the backup.
    #[serde(default, deserialize_with = "lenient_string")]
    pub parent_id: Option<String>,

    /// Upper bound for a single HTTP request, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            credentials_dir: default_credentials_dir(),
            credentials_file: None,
            parent_id: None,
            request_timeout_secs: default_timeout_secs(),
        }
    }
}

impl StorageConfig {
    pub fn credentials_path(&self) -> Result<PathBuf, BackupError> {
        let file = required(&self.credentials_file, "storage.credentials_file")?;
        Ok(PathBuf::from(&self.credentials_dir).join(file))
    }

    pub fn parent(&self) -> Result<&str, BackupError> {
        required(&self.parent_id, "storage.parent_id")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_credentials_dir() -> String {
    "/config".to_string()
}

/// Backup cadence configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleConfig {
    /// Minutes between backup runs. Must be at least 1.
    #[serde(default)]
    pub interval_minutes: Option<u64>,
}

impl ScheduleConfig {
    pub fn interval(&self) -> Result<Duration, BackupError> {
        match self.interval_minutes {
            Some(minutes) if minutes >= 1 => Ok(Duration::from_secs(minutes * 60)),
            Some(minutes) => Err(BackupError::Config(format!(
                "schedule.interval_minutes must be at least 1, got {minutes}"
            ))),
            None => Err(BackupError::Config(
                "schedule.interval_minutes is required".into(),
            )),
        }
    }
}

/// Process-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn required<'a>(value: &'a Option<String>, key: &str) -> Result<&'a str, BackupError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| BackupError::Config(format!("{key} is required")))
}

/// Mask a secret for display, keeping a short prefix and suffix of long values.
pub fn mask_secret(value: &str) -> String {
    if value.chars().count() < 10 {
        return "****".to_string();
    }
    let prefix: String = value.chars().take(4).collect();
    let suffix: String = value
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("{prefix}...{suffix}")
}

/// Accepts strings, numbers and booleans as a string.
///
/// Environment values are type-inferred, so a numeric secret such as
/// `BITWARDEN_SECRET=123456` arrives as an integer.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OptionVisitor;

    impl<'de> Visitor<'de> for OptionVisitor {
        type Value = Option<String>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            d.deserialize_any(ScalarVisitor).map(Some)
        }
    }

    struct ScalarVisitor;

    impl Visitor<'_> for ScalarVisitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i128<E: de::Error>(self, v: i128) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u128<E: de::Error>(self, v: u128) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<String, E> {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_option(OptionVisitor)
}
