// SPDX-FileCopyrightText: 2026 vaultsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Drive upload sink for vaultsync.
//!
//! Authenticates as a service account (JWT-bearer grant, `drive.file`
//! scope) and stores each export as a new file under one parent folder
//! using a streamed `multipart/related` upload.

pub mod auth;
pub mod client;
pub mod credentials;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use vaultsync_core::BackupError;

pub use auth::{ServiceAccountAuth, StaticToken, TokenSource};
pub use client::DriveSink;
pub use credentials::ServiceAccountKey;

/// Builds a [`DriveSink`] from a service-account key file.
///
/// Everything that can be checked without the network (file readable, JSON
/// well-formed, private key accepted) fails here as [`BackupError::Config`].
pub fn sink_from_key_file(
    key_path: &Path,
    parent_id: &str,
    timeout: Duration,
) -> Result<DriveSink, BackupError> {
    let key = ServiceAccountKey::from_file(key_path)?;
    let auth = ServiceAccountAuth::new(&key, timeout)?;
    tracing::debug!(client_email = %key.client_email, "drive service account loaded");
    DriveSink::new(Arc::new(auth), parent_id, timeout)
}
