// SPDX-FileCopyrightText: 2026 vaultsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for vaultsync.
//!
//! Provides recording mock collaborators for fast, deterministic pipeline
//! and scheduler tests without a `bw` binary or network access.
//!
//! # Components
//!
//! - [`MockVault`] - Mock session manager recording every call
//! - [`MockSink`] - Mock upload sink capturing stored artifacts

pub mod mock_sink;
pub mod mock_vault;

pub use mock_sink::{MockSink, StoredArtifact};
pub use mock_vault::{MockVault, VaultCall, VaultOp};

use vaultsync_core::BackupError;

/// Which error a scripted failure produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Auth,
    Protocol,
    Export,
    Upload,
    Teardown,
}

impl FailureKind {
    pub fn to_error(self, message: &str) -> BackupError {
        match self {
            FailureKind::Auth => BackupError::auth(message),
            FailureKind::Protocol => BackupError::Protocol(message.to_string()),
            FailureKind::Export => BackupError::export(message),
            FailureKind::Upload => BackupError::upload(message),
            FailureKind::Teardown => BackupError::teardown(message),
        }
    }
}

/// Fails every call from the `from_call`-th (1-based) onwards.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ScriptedFailure {
    from_call: usize,
    kind: FailureKind,
}

impl ScriptedFailure {
    pub(crate) fn new(from_call: usize, kind: FailureKind) -> Self {
        Self {
            from_call: from_call.max(1),
            kind,
        }
    }

    pub(crate) fn check(script: Option<Self>, call: usize, what: &str) -> Result<(), BackupError> {
        match script {
            Some(s) if call >= s.from_call => {
                Err(s.kind.to_error(&format!("scripted {what} failure on call {call}")))
            }
            _ => Ok(()),
        }
    }
}
