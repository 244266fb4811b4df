// SPDX-FileCopyrightText: 2026 vaultsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock upload sink capturing stored artifacts for assertion in tests.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use vaultsync_core::{BackupError, ExportStream, UploadSink};

use crate::{FailureKind, ScriptedFailure};

/// An artifact passed to [`MockSink::store`].
#[derive(Debug, Clone)]
pub struct StoredArtifact {
    pub name: String,
    pub bytes: Vec<u8>,
    /// When the store call started.
    pub at: Instant,
}

/// A mock upload sink.
///
/// The stream is always drained before a scripted failure is returned, so
/// a failing store still consumes its input like a real mid-write failure.
pub struct MockSink {
    failure: Option<ScriptedFailure>,
    attempts: Mutex<Vec<StoredArtifact>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self {
            failure: None,
            attempts: Mutex::new(Vec::new()),
        }
    }

    /// Fail store calls from the `from_call`-th onwards.
    pub fn fail_from(mut self, from_call: usize, kind: FailureKind) -> Self {
        self.failure = Some(ScriptedFailure::new(from_call, kind));
        self
    }

    /// Every store attempt, successful or not.
    pub async fn attempts(&self) -> Vec<StoredArtifact> {
        self.attempts.lock().await.clone()
    }

    pub async fn store_count(&self) -> usize {
        self.attempts.lock().await.len()
    }
}

impl Default for MockSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UploadSink for MockSink {
    fn name(&self) -> &str {
        "mock-sink"
    }

    async fn store(&self, stream: ExportStream, name: &str) -> Result<u64, BackupError> {
        let at = Instant::now();
        let read = stream.read_to_end().await;

        let call = {
            let mut attempts = self.attempts.lock().await;
            attempts.push(StoredArtifact {
                name: name.to_string(),
                bytes: read.as_ref().map(Vec::clone).unwrap_or_default(),
                at,
            });
            attempts.len()
        };

        let bytes = read.map_err(|e| BackupError::Upload {
            message: format!("failed to read export: {e}"),
            source: Some(Box::new(e)),
        })?;
        ScriptedFailure::check(self.failure, call, "store")?;
        Ok(bytes.len() as u64)
    }
}
