// SPDX-FileCopyrightText: 2026 vaultsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock session manager for deterministic testing.
//!
//! `MockVault` implements `VaultClient`, hands out numbered sessions, and
//! records every call with a tokio timestamp so tests running on paused
//! time can assert when each step happened.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use vaultsync_core::{BackupError, Credentials, ExportFormat, ExportStream, Session, VaultClient};

use crate::{FailureKind, ScriptedFailure};

/// One operation against the mock vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultOp {
    Authenticate,
    Export(ExportFormat),
    Invalidate,
}

/// A recorded call and the instant it started.
#[derive(Debug, Clone)]
pub struct VaultCall {
    pub op: VaultOp,
    pub at: Instant,
}

#[derive(Default)]
struct State {
    calls: Vec<VaultCall>,
    live: HashSet<String>,
    issued: usize,
    authenticate_calls: usize,
    export_calls: usize,
    invalidate_calls: usize,
}

/// A mock vault returning a fixed export payload.
pub struct MockVault {
    payload: Vec<u8>,
    export_delay: Option<Duration>,
    first_export_delay: Option<Duration>,
    authenticate_failure: Option<ScriptedFailure>,
    export_failure: Option<ScriptedFailure>,
    invalidate_failure: Option<ScriptedFailure>,
    state: Mutex<State>,
}

impl MockVault {
    /// Create a mock vault whose exports yield `payload`.
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
            export_delay: None,
            first_export_delay: None,
            authenticate_failure: None,
            export_failure: None,
            invalidate_failure: None,
            state: Mutex::new(State::default()),
        }
    }

    /// Make each export take `delay` (virtual time under a paused clock).
    pub fn with_export_delay(mut self, delay: Duration) -> Self {
        self.export_delay = Some(delay);
        self
    }

    /// Make only the first export take `delay`; later exports use the
    /// regular export delay.
    pub fn with_first_export_delay(mut self, delay: Duration) -> Self {
        self.first_export_delay = Some(delay);
        self
    }

    /// Fail authenticate calls from the `from_call`-th onwards.
    pub fn fail_authenticate_from(mut self, from_call: usize, kind: FailureKind) -> Self {
        self.authenticate_failure = Some(ScriptedFailure::new(from_call, kind));
        self
    }

    /// Fail export calls from the `from_call`-th onwards.
    pub fn fail_export_from(mut self, from_call: usize, kind: FailureKind) -> Self {
        self.export_failure = Some(ScriptedFailure::new(from_call, kind));
        self
    }

    /// Fail invalidate calls from the `from_call`-th onwards. The session is
    /// still dropped from the live set.
    pub fn fail_invalidate_from(mut self, from_call: usize, kind: FailureKind) -> Self {
        self.invalidate_failure = Some(ScriptedFailure::new(from_call, kind));
        self
    }

    /// Every call in order.
    pub async fn calls(&self) -> Vec<VaultCall> {
        self.state.lock().await.calls.clone()
    }

    /// Just the operations, in order.
    pub async fn ops(&self) -> Vec<VaultOp> {
        self.calls().await.into_iter().map(|c| c.op).collect()
    }

    pub async fn count(&self, op: &VaultOp) -> usize {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter(|c| std::mem::discriminant(&c.op) == std::mem::discriminant(op))
            .count()
    }

    /// Number of authenticate calls that returned a session.
    pub async fn sessions_issued(&self) -> usize {
        self.state.lock().await.issued
    }

    /// Sessions issued and not yet invalidated.
    pub async fn live_sessions(&self) -> usize {
        self.state.lock().await.live.len()
    }
}

#[async_trait]
impl VaultClient for MockVault {
    fn name(&self) -> &str {
        "mock-vault"
    }

    async fn authenticate(&self, _credentials: &Credentials) -> Result<Session, BackupError> {
        let mut state = self.state.lock().await;
        state.authenticate_calls += 1;
        state.calls.push(VaultCall {
            op: VaultOp::Authenticate,
            at: Instant::now(),
        });
        ScriptedFailure::check(
            self.authenticate_failure,
            state.authenticate_calls,
            "authenticate",
        )?;

        state.issued += 1;
        let token = format!("mock-session-{}", state.issued);
        state.live.insert(token.clone());
        Ok(Session::new(token))
    }

    async fn export(
        &self,
        session: &Session,
        format: ExportFormat,
    ) -> Result<ExportStream, BackupError> {
        let call = {
            let mut state = self.state.lock().await;
            state.export_calls += 1;
            state.calls.push(VaultCall {
                op: VaultOp::Export(format),
                at: Instant::now(),
            });
            if !state.live.contains(session.token()) {
                return Err(BackupError::export("export with a session that is not live"));
            }
            ScriptedFailure::check(self.export_failure, state.export_calls, "export")?;
            state.export_calls
        };

        let delay = match self.first_export_delay {
            Some(first) if call == 1 => Some(first),
            _ => self.export_delay,
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(ExportStream::from_bytes(self.payload.clone()))
    }

    async fn invalidate(&self, session: Session) -> Result<(), BackupError> {
        let mut state = self.state.lock().await;
        state.invalidate_calls += 1;
        state.calls.push(VaultCall {
            op: VaultOp::Invalidate,
            at: Instant::now(),
        });
        let was_live = state.live.remove(session.token());
        ScriptedFailure::check(
            self.invalidate_failure,
            state.invalidate_calls,
            "invalidate",
        )?;
        if !was_live {
            return Err(BackupError::teardown("session was not live"));
        }
        Ok(())
    }
}
