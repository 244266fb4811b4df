// SPDX-FileCopyrightText: 2026 vaultsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Child-process plumbing for `bw` invocations.

use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tracing::debug;
use vaultsync_core::BackupError;
use vaultsync_core::redact::redact;

/// Captured output of a finished `bw` command.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    /// Stdout followed by stderr, lossily decoded.
    pub fn combined_text(&self) -> String {
        let mut text = String::from_utf8_lossy(&self.stdout).into_owned();
        if !self.stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&String::from_utf8_lossy(&self.stderr));
        }
        text
    }
}

/// Why a `bw` command did not succeed.
#[derive(Debug)]
pub struct CliFailure {
    message: String,
    source: Option<std::io::Error>,
}

impl CliFailure {
    pub fn message(&self) -> &str {
        &self.message
    }

    fn boxed_source(self) -> (String, Option<Box<dyn std::error::Error + Send + Sync>>) {
        (
            self.message,
            self.source
                .map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        )
    }

    pub fn into_auth(self) -> BackupError {
        let (message, source) = self.boxed_source();
        BackupError::Auth { message, source }
    }

    pub fn into_export(self) -> BackupError {
        let (message, source) = self.boxed_source();
        BackupError::Export { message, source }
    }

    pub fn into_teardown(self) -> BackupError {
        let (message, source) = self.boxed_source();
        BackupError::Teardown { message, source }
    }
}

/// Runs `bw` subcommands with a bounded duration.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    program: PathBuf,
    timeout: Duration,
}

impl CommandRunner {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Runs `bw <args>` with `envs` added to the inherited environment and
    /// fails unless the command exits successfully.
    ///
    /// Output quoted in the failure message is redacted with `secrets`.
    pub async fn run_checked<S: AsRef<OsStr>>(
        &self,
        args: &[S],
        envs: &[(&str, &str)],
        secrets: &[String],
    ) -> Result<CommandOutput, CliFailure> {
        let label = self.label(args);
        debug!(command = %label, "running vault cli");

        let mut command = tokio::process::Command::new(&self.program);
        command
            .args(args)
            .env("BW_NOINTERACTION", "true")
            .env_remove("BW_SESSION")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in envs {
            command.env(key, value);
        }

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(CliFailure {
                    message: format!("failed to execute `{label}`: {e}"),
                    source: Some(e),
                });
            }
            Err(_) => {
                return Err(CliFailure {
                    message: format!("`{label}` timed out after {:?}", self.timeout),
                    source: None,
                });
            }
        };

        let output = CommandOutput {
            status: output.status,
            stdout: output.stdout,
            stderr: output.stderr,
        };

        if output.status.success() {
            return Ok(output);
        }

        let exit = output
            .status
            .code()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());
        let detail = redact(output.combined_text().trim(), secrets);
        Err(CliFailure {
            message: if detail.is_empty() {
                format!("`{label}` exited with status {exit}")
            } else {
                format!("`{label}` exited with status {exit}: {detail}")
            },
            source: None,
        })
    }

    /// `bw <subcommand>` for messages; arguments after the subcommand may
    /// carry URLs or formats but never secrets.
    fn label<S: AsRef<OsStr>>(&self, args: &[S]) -> String {
        let name = self
            .program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "bw".to_string());
        let mut parts = vec![name];
        parts.extend(args.iter().map(|a| a.as_ref().to_string_lossy().into_owned()));
        parts.join(" ")
    }
}
