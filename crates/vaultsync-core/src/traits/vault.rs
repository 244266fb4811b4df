// SPDX-FileCopyrightText: 2026 vaultsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session manager trait for the password-vault collaborator.

use async_trait::async_trait;

use crate::error::BackupError;
use crate::types::{Credentials, ExportFormat, ExportStream, Session};

/// Authenticate / export / invalidate protocol against a vault service.
///
/// Session lifecycle: `authenticate` yields a live [`Session`], `export` may
/// be called any number of times while it is live, and `invalidate` consumes
/// it. There is no way back to a usable session without a fresh
/// `authenticate`.
#[async_trait]
pub trait VaultClient: Send + Sync + 'static {
    /// Human-readable adapter name for logs.
    fn name(&self) -> &str;

    /// Logs in and unlocks the vault, returning a live session.
    ///
    /// Fails with [`BackupError::Auth`] when a step is rejected and with
    /// [`BackupError::Protocol`] when the unlock response carries no token.
    /// No partial session is ever returned.
    async fn authenticate(&self, credentials: &Credentials) -> Result<Session, BackupError>;

    /// Exports the vault in `format`, returning the raw bytes unmodified.
    async fn export(
        &self,
        session: &Session,
        format: ExportFormat,
    ) -> Result<ExportStream, BackupError>;

    /// Best-effort session teardown. Errors are reported as
    /// [`BackupError::Teardown`].
    async fn invalidate(&self, session: Session) -> Result<(), BackupError>;
}
