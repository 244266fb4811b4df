// SPDX-FileCopyrightText: 2026 vaultsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Upload sink trait for the backup destination.

use async_trait::async_trait;

use crate::error::BackupError;
use crate::types::ExportStream;

/// A destination that durably stores one export artifact.
#[async_trait]
pub trait UploadSink: Send + Sync + 'static {
    /// Human-readable adapter name for logs.
    fn name(&self) -> &str;

    /// Reads `stream` to the end and stores it under `name`.
    ///
    /// Returns the number of bytes written. A failure midway is reported
    /// as-is; no cleanup of a partial artifact is attempted.
    async fn store(&self, stream: ExportStream, name: &str) -> Result<u64, BackupError>;
}
