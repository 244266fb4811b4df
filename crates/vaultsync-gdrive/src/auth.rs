// SPDX-FileCopyrightText: 2026 vaultsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OAuth2 access tokens for the Drive API.
//!
//! [`ServiceAccountAuth`] implements the JWT-bearer grant: it signs an RS256
//! assertion with the service account's private key, exchanges it at the
//! token endpoint, and caches the resulting access token until shortly
//! before it expires.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use ring::rand::SystemRandom;
use ring::signature::{RSA_PKCS1_SHA256, RsaKeyPair};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;
use vaultsync_core::BackupError;
use vaultsync_core::redact::redact;

use crate::credentials::ServiceAccountKey;

/// Scope limited to files created by this application.
pub const DRIVE_FILE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

const JWT_BEARER_GRANT: &str = "urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Supplies bearer tokens for Drive requests.
#[async_trait]
pub trait TokenSource: Send + Sync + 'static {
    async fn access_token(&self) -> Result<SecretString, BackupError>;
}

/// A fixed token, for tests and externally managed credentials.
pub struct StaticToken(SecretString);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<SecretString, BackupError> {
        Ok(SecretString::from(self.0.expose_secret().to_string()))
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

struct CachedToken {
    token: SecretString,
    refresh_at: Instant,
}

/// Service-account token source using the JWT-bearer grant.
pub struct ServiceAccountAuth {
    http: reqwest::Client,
    client_email: String,
    key_id: Option<String>,
    token_uri: String,
    key_pair: RsaKeyPair,
    rng: SystemRandom,
    cached: Mutex<Option<CachedToken>>,
}

impl std::fmt::Debug for ServiceAccountAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountAuth")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountAuth {
    /// Parses the private key up front so a bad key fails at startup.
    pub fn new(key: &ServiceAccountKey, timeout: Duration) -> Result<Self, BackupError> {
        let der = key.private_key_der()?;
        let key_pair = RsaKeyPair::from_pkcs8(&der).map_err(|e| {
            BackupError::Config(format!("service account private key rejected: {e}"))
        })?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackupError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            client_email: key.client_email.clone(),
            key_id: key.private_key_id.clone(),
            token_uri: key.token_uri.clone(),
            key_pair,
            rng: SystemRandom::new(),
            cached: Mutex::new(None),
        })
    }

    /// Builds the signed `header.claims.signature` assertion.
    fn assertion(&self, now: DateTime<Utc>) -> Result<String, BackupError> {
        let mut header = serde_json::json!({ "alg": "RS256", "typ": "JWT" });
        if let Some(kid) = &self.key_id {
            header["kid"] = serde_json::Value::String(kid.clone());
        }
        let iat = now.timestamp();
        let claims = serde_json::json!({
            "iss": self.client_email,
            "scope": DRIVE_FILE_SCOPE,
            "aud": self.token_uri,
            "iat": iat,
            "exp": iat + ASSERTION_LIFETIME_SECS,
        });

        let encode = |value: &serde_json::Value| {
            serde_json::to_vec(value)
                .map(|bytes| URL_SAFE_NO_PAD.encode(bytes))
                .map_err(|e| BackupError::Upload {
                    message: format!("failed to encode token assertion: {e}"),
                    source: Some(Box::new(e)),
                })
        };
        let signing_input = format!("{}.{}", encode(&header)?, encode(&claims)?);

        let mut signature = vec![0u8; self.key_pair.public().modulus_len()];
        self.key_pair
            .sign(
                &RSA_PKCS1_SHA256,
                &self.rng,
                signing_input.as_bytes(),
                &mut signature,
            )
            .map_err(|_| BackupError::upload("failed to sign token assertion"))?;

        Ok(format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature)))
    }

    async fn exchange(&self) -> Result<CachedToken, BackupError> {
        let assertion = self.assertion(Utc::now())?;
        let body = format!("grant_type={JWT_BEARER_GRANT}&assertion={assertion}");

        let response = self
            .http
            .post(&self.token_uri)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(body)
            .send()
            .await
            .map_err(|e| BackupError::Upload {
                message: format!("token request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackupError::upload(format!(
                "token endpoint returned {status}: {}",
                redact(body.trim(), &[])
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| BackupError::Upload {
            message: format!("malformed token response: {e}"),
            source: Some(Box::new(e)),
        })?;

        let lifetime = Duration::from_secs(
            token
                .expires_in
                .unwrap_or(ASSERTION_LIFETIME_SECS as u64),
        );
        debug!(expires_in = ?lifetime, "drive access token issued");
        Ok(CachedToken {
            token: SecretString::from(token.access_token),
            refresh_at: Instant::now() + lifetime.saturating_sub(REFRESH_MARGIN),
        })
    }
}

#[async_trait]
impl TokenSource for ServiceAccountAuth {
    async fn access_token(&self) -> Result<SecretString, BackupError> {
        let mut cached = self.cached.lock().await;
        if let Some(entry) = cached.as_ref() {
            if Instant::now() < entry.refresh_at {
                return Ok(SecretString::from(entry.token.expose_secret().to_string()));
            }
        }

        let fresh = self.exchange().await?;
        let token = SecretString::from(fresh.token.expose_secret().to_string());
        *cached = Some(fresh);
        Ok(token)
    }
}
