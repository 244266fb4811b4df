// SPDX-FileCopyrightText: 2026 vaultsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error taxonomy for a backup run.

use strum::Display;
use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Every failure a backup run can produce.
///
/// `Auth`, `Protocol`, `Export` and `Upload` abort the current run and are
/// surfaced to the scheduler. `Teardown` is only ever logged by the pipeline.
#[derive(Debug, Error)]
pub enum BackupError {
    /// Invalid or missing configuration, detected before the pipeline runs.
    #[error("configuration error: {0}")]
    Config(String),

    /// Vault login, unlock or server configuration was rejected.
    #[error("vault authentication failed: {message}")]
    Auth {
        message: String,
        source: Option<BoxedSource>,
    },

    /// The vault answered, but not in the shape we expect.
    #[error("vault protocol error: {0}")]
    Protocol(String),

    /// Export failed after a session was established.
    #[error("vault export failed: {message}")]
    Export {
        message: String,
        source: Option<BoxedSource>,
    },

    /// Writing the export to the destination failed.
    #[error("upload failed: {message}")]
    Upload {
        message: String,
        source: Option<BoxedSource>,
    },

    /// Session invalidation failed.
    #[error("session teardown failed: {message}")]
    Teardown {
        message: String,
        source: Option<BoxedSource>,
    },
}

/// The pipeline stage an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    Config,
    Authenticate,
    Export,
    Upload,
    Teardown,
}

impl BackupError {
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
            source: None,
        }
    }

    pub fn export(message: impl Into<String>) -> Self {
        Self::Export {
            message: message.into(),
            source: None,
        }
    }

    pub fn upload(message: impl Into<String>) -> Self {
        Self::Upload {
            message: message.into(),
            source: None,
        }
    }

    pub fn teardown(message: impl Into<String>) -> Self {
        Self::Teardown {
            message: message.into(),
            source: None,
        }
    }

    /// Returns the stage that produced this error.
    ///
    /// Protocol errors come out of token extraction, which is part of
    /// authentication.
    pub fn stage(&self) -> Stage {
        match self {
            BackupError::Config(_) => Stage::Config,
            BackupError::Auth { .. } | BackupError::Protocol(_) => Stage::Authenticate,
            BackupError::Export { .. } => Stage::Export,
            BackupError::Upload { .. } => Stage::Upload,
            BackupError::Teardown { .. } => Stage::Teardown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn stage_display_is_snake_case() {
        assert_eq!(Stage::Authenticate.to_string(), "authenticate");
        assert_eq!(Stage::Upload.to_string(), "upload");
    }

    #[test]
    fn source_is_exposed_through_error_trait() {
        let err = BackupError::Upload {
            message: "connection reset".into(),
            source: Some(Box::new(std::io::Error::other("reset by peer"))),
        };
        assert_eq!(err.to_string(), "upload failed: connection reset");
        assert!(err.source().is_some());
    }

    #[test]
    fn protocol_error_is_distinct_from_auth() {
        let protocol = BackupError::Protocol("session marker missing".into());
        assert!(matches!(protocol, BackupError::Protocol(_)));
        assert!(!matches!(protocol, BackupError::Auth { .. }));
        assert_eq!(protocol.stage(), Stage::Authenticate);
    }
}
