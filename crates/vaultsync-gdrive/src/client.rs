// SPDX-FileCopyrightText: 2026 vaultsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Drive v3 upload sink.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use futures::{StreamExt, TryStreamExt};
use ring::rand::{SecureRandom, SystemRandom};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::{debug, info};
use vaultsync_core::redact::redact;
use vaultsync_core::{BackupError, ExportStream, UploadSink};

use crate::auth::TokenSource;

/// Base URL for the Drive API.
const API_BASE_URL: &str = "https://www.googleapis.com";

const UPLOAD_PATH: &str = "/upload/drive/v3/files?uploadType=multipart&supportsAllDrives=true";

#[derive(Deserialize)]
struct CreatedFile {
    #[serde(default)]
    id: Option<String>,
}

/// Uploads each artifact as a new file under a fixed parent folder.
///
/// Drive allows duplicate names within a folder, so every run creates a
/// new file rather than replacing the previous one.
pub struct DriveSink {
    http: reqwest::Client,
    tokens: Arc<dyn TokenSource>,
    parent_id: String,
    base_url: String,
}

impl std::fmt::Debug for DriveSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriveSink")
            .field("parent_id", &self.parent_id)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl DriveSink {
    pub fn new(
        tokens: Arc<dyn TokenSource>,
        parent_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, BackupError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackupError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            tokens,
            parent_id: parent_id.into(),
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn metadata(&self, name: &str) -> Result<Vec<u8>, BackupError> {
        serde_json::to_vec(&serde_json::json!({
            "name": name,
            "parents": [self.parent_id],
        }))
        .map_err(|e| BackupError::Upload {
            message: format!("failed to encode file metadata: {e}"),
            source: Some(Box::new(e)),
        })
    }
}

fn content_type_for(name: &str) -> &'static str {
    if name.ends_with(".csv") {
        "text/csv"
    } else if name.ends_with(".json") {
        "application/json"
    } else {
        "application/octet-stream"
    }
}

fn new_boundary() -> Result<String, BackupError> {
    let mut bytes = [0u8; 18];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| BackupError::upload("failed to generate multipart boundary"))?;
    Ok(format!("vaultsync-{}", URL_SAFE_NO_PAD.encode(bytes)))
}

#[async_trait]
impl UploadSink for DriveSink {
    fn name(&self) -> &str {
        "google-drive"
    }

    async fn store(&self, stream: ExportStream, name: &str) -> Result<u64, BackupError> {
        let token = self.tokens.access_token().await?;
        let boundary = new_boundary()?;

        let mut head = format!(
            "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n"
        )
        .into_bytes();
        head.extend(self.metadata(name)?);
        head.extend(
            format!(
                "\r\n--{boundary}\r\nContent-Type: {}\r\n\r\n",
                content_type_for(name)
            )
            .into_bytes(),
        );
        let tail = format!("\r\n--{boundary}--\r\n").into_bytes();

        let written = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&written);
        let payload = stream.into_inner().inspect_ok(move |chunk| {
            counter.fetch_add(chunk.len() as u64, Ordering::Relaxed);
        });
        let body = futures::stream::once(async move { Ok::<_, std::io::Error>(head) })
            .chain(payload)
            .chain(futures::stream::once(async move { Ok(tail) }));

        debug!(name, parent = %self.parent_id, "uploading artifact");
        let response = self
            .http
            .post(format!("{}{UPLOAD_PATH}", self.base_url))
            .bearer_auth(token.expose_secret())
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(reqwest::Body::wrap_stream(body))
            .send()
            .await
            .map_err(|e| BackupError::Upload {
                message: format!("upload request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let secrets = vec![token.expose_secret().to_string()];
            return Err(BackupError::upload(format!(
                "drive returned {status}: {}",
                redact(body.trim(), &secrets)
            )));
        }

        let created: CreatedFile = response.json().await.map_err(|e| BackupError::Upload {
            message: format!("malformed upload response: {e}"),
            source: Some(Box::new(e)),
        })?;
        let bytes = written.load(Ordering::Relaxed);
        info!(
            name,
            bytes,
            file_id = created.id.as_deref().unwrap_or("unknown"),
            "artifact stored in drive"
        );
        Ok(bytes)
    }
}
