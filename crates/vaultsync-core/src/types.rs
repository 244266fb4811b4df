// SPDX-FileCopyrightText: 2026 vaultsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data model shared by the pipeline and its collaborators.

use std::fmt;
use std::io;
use std::pin::Pin;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::{Stream, TryStreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::BackupError;

/// Immutable vault credentials, supplied once at startup.
#[derive(Debug)]
pub struct Credentials {
    client_id: String,
    client_secret: SecretString,
    master_password: SecretString,
    server: Option<String>,
}

impl Credentials {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: SecretString,
        master_password: SecretString,
        server: Option<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
            master_password,
            server,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &SecretString {
        &self.client_secret
    }

    pub fn master_password(&self) -> &SecretString {
        &self.master_password
    }

    /// Self-hosted server URL, if the default cloud endpoint is not used.
    pub fn server(&self) -> Option<&str> {
        self.server.as_deref()
    }

    /// Secret values that must never appear in logs or error messages.
    pub fn secret_values(&self) -> Vec<String> {
        vec![
            self.client_secret.expose_secret().to_string(),
            self.master_password.expose_secret().to_string(),
        ]
    }
}

/// An authenticated vault session.
///
/// Deliberately not `Clone`: [`VaultClient::invalidate`](crate::VaultClient::invalidate)
/// takes the session by value, so a session cannot be used after teardown.
#[derive(Debug)]
pub struct Session {
    token: SecretString,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::from(token.into()),
        }
    }

    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }
}

/// Structural encoding of the vault export.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExportFormat {
    /// Plain JSON.
    Json,
    /// Account-key encrypted JSON.
    EncryptedJson,
    /// Tabular CSV.
    Csv,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [
        ExportFormat::Json,
        ExportFormat::EncryptedJson,
        ExportFormat::Csv,
    ];

    /// File extension for artifacts in this format.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json | ExportFormat::EncryptedJson => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

/// Boxed byte-chunk stream backing an [`ExportStream`].
pub type ByteStream = Pin<Box<dyn Stream<Item = io::Result<Vec<u8>>> + Send>>;

/// Single-pass stream of export bytes.
///
/// Produced by a [`VaultClient`](crate::VaultClient) and consumed exactly once
/// by an [`UploadSink`](crate::UploadSink).
pub struct ExportStream {
    inner: ByteStream,
}

impl ExportStream {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::from_stream(futures::stream::once(async move { Ok(bytes) }))
    }

    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = io::Result<Vec<u8>>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }

    pub fn into_inner(self) -> ByteStream {
        self.inner
    }

    /// Drains the stream into memory.
    pub async fn read_to_end(self) -> io::Result<Vec<u8>> {
        self.inner.try_concat().await
    }
}

impl fmt::Debug for ExportStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportStream").finish_non_exhaustive()
    }
}

/// Outcome of one pipeline execution. Never persisted.
#[derive(Debug)]
pub struct BackupRun {
    pub scheduled_at: DateTime<Utc>,
    pub duration: Duration,
    /// Bytes stored on success.
    pub outcome: Result<u64, BackupError>,
}

impl BackupRun {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn into_result(self) -> Result<u64, BackupError> {
        self.outcome
    }
}
