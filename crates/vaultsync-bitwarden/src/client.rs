// SPDX-FileCopyrightText: 2026 vaultsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`VaultClient`] implementation driving the `bw` CLI.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use tracing::{debug, info, warn};
use vaultsync_core::redact::redact;
use vaultsync_core::{BackupError, Credentials, ExportFormat, ExportStream, Session, VaultClient};

use crate::cli::CommandRunner;
use crate::session::extract_session_token;

/// Bitwarden session manager backed by the `bw` command-line client.
///
/// Every step is a separate child process: `config server` (optional),
/// `login --apikey`, `unlock --passwordenv`, `export --raw` and `logout`.
/// The CLI keeps its own on-disk state between invocations, so at most one
/// session should be live per data directory.
#[derive(Debug, Clone)]
pub struct BitwardenCli {
    runner: CommandRunner,
}

impl BitwardenCli {
    /// Creates a client that runs `program` and gives each invocation at
    /// most `timeout` to finish.
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            runner: CommandRunner::new(program, timeout),
        }
    }

    /// Logout used to roll back a login whose unlock step failed.
    async fn abandon_login(&self, secrets: &[String]) {
        if let Err(failure) = self.runner.run_checked(&["logout"], &[], secrets).await {
            warn!(error = failure.message(), "logout after failed unlock did not succeed");
        }
    }
}

#[async_trait]
impl VaultClient for BitwardenCli {
    fn name(&self) -> &str {
        "bitwarden-cli"
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<Session, BackupError> {
        let secrets = credentials.secret_values();

        if let Some(server) = credentials.server() {
            debug!(server, "pointing vault cli at server");
            self.runner
                .run_checked(&["config", "server", server], &[], &secrets)
                .await
                .map_err(|f| f.into_auth())?;
        }

        self.runner
            .run_checked(
                &["login", "--apikey"],
                &[
                    ("BW_CLIENTID", credentials.client_id()),
                    ("BW_CLIENTSECRET", credentials.client_secret().expose_secret()),
                ],
                &secrets,
            )
            .await
            .map_err(|f| f.into_auth())?;

        let unlocked = self
            .runner
            .run_checked(
                &["unlock", "--passwordenv", "BW_PASSWORD"],
                &[("BW_PASSWORD", credentials.master_password().expose_secret())],
                &secrets,
            )
            .await;

        let output = match unlocked {
            Ok(output) => output,
            Err(failure) => {
                self.abandon_login(&secrets).await;
                return Err(failure.into_auth());
            }
        };

        match extract_session_token(&output.combined_text()) {
            Ok(token) => {
                info!(client_id = credentials.client_id(), "vault unlocked");
                Ok(Session::new(token))
            }
            Err(e) => {
                self.abandon_login(&secrets).await;
                Err(e)
            }
        }
    }

    async fn export(
        &self,
        session: &Session,
        format: ExportFormat,
    ) -> Result<ExportStream, BackupError> {
        let format_arg = format.to_string();
        let secrets = vec![session.token().to_string()];
        let output = self
            .runner
            .run_checked(
                &["export", "--format", format_arg.as_str(), "--raw"],
                &[("BW_SESSION", session.token())],
                &secrets,
            )
            .await
            .map_err(|f| f.into_export())?;

        if output.stdout.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = redact(stderr.trim(), &secrets);
            return Err(BackupError::export(if detail.is_empty() {
                "export produced no output".to_string()
            } else {
                format!("export produced no output: {detail}")
            }));
        }

        if !output.stderr.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!(stderr = %redact(stderr.trim(), &secrets), "vault cli wrote to stderr during export");
        }

        info!(%format, bytes = output.stdout.len(), "vault exported");
        Ok(ExportStream::from_bytes(output.stdout))
    }

    async fn invalidate(&self, session: Session) -> Result<(), BackupError> {
        let secrets = vec![session.token().to_string()];
        self.runner
            .run_checked(&["logout"], &[("BW_SESSION", session.token())], &secrets)
            .await
            .map_err(|f| f.into_teardown())?;
        debug!("vault session closed");
        Ok(())
    }
}
