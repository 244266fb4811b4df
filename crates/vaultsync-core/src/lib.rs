// SPDX-FileCopyrightText: 2026 vaultsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for vaultsync.
//!
//! Holds the data model shared by every crate in the workspace (credentials,
//! sessions, export formats and streams), the error taxonomy for a backup
//! run, and the two collaborator traits the pipeline is written against:
//! [`VaultClient`] and [`UploadSink`].

pub mod error;
pub mod redact;
pub mod traits;
pub mod types;

pub use error::{BackupError, Stage};
pub use traits::{UploadSink, VaultClient};
pub use types::{BackupRun, Credentials, ExportFormat, ExportStream, Session};
