// SPDX-FileCopyrightText: 2026 vaultsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Drive sink tests against a wiremock token endpoint and upload API.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use vaultsync_core::{BackupError, ExportStream, UploadSink};
use vaultsync_gdrive::{
    DriveSink, ServiceAccountAuth, ServiceAccountKey, StaticToken, sink_from_key_file,
};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FIXTURE: &str = include_str!("fixtures/service-account.json");

fn key_for(server: &MockServer) -> String {
    FIXTURE.replace(
        "https://oauth2.googleapis.com/token",
        &format!("{}/token", server.uri()),
    )
}

fn static_sink(server: &MockServer) -> DriveSink {
    DriveSink::new(
        Arc::new(StaticToken::new("ya29.static")),
        "folder-123",
        Duration::from_secs(5),
    )
    .unwrap()
    .with_base_url(server.uri())
}

async fn mount_token(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains(
            "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer",
        ))
        .and(body_string_contains("assertion="))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "ya29.exchanged",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_upload(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/upload/drive/v3/files"))
        .and(query_param("uploadType", "multipart"))
        .and(query_param("supportsAllDrives", "true"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "kind": "drive#file",
            "id": "file-abc",
            "name": "vaultwarden-backup.json"
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn store_uploads_multipart_body() {
    let server = MockServer::start().await;
    mount_upload(&server, "ya29.static").await;

    let stream = ExportStream::from_stream(futures::stream::iter(vec![
        Ok(b"{\"items\":".to_vec()),
        Ok(b"[]}".to_vec()),
    ]));
    let written = static_sink(&server)
        .store(stream, "vaultwarden-backup.json")
        .await
        .unwrap();
    assert_eq!(written, 12);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    let content_type = request
        .headers
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let boundary = content_type
        .strip_prefix("multipart/related; boundary=")
        .expect("multipart/related content type");

    let body = String::from_utf8(request.body.clone()).unwrap();
    assert!(body.starts_with(&format!("--{boundary}\r\n")));
    assert!(body.ends_with(&format!("\r\n--{boundary}--\r\n")));
    assert!(body.contains(r#""name":"vaultwarden-backup.json""#));
    assert!(body.contains(r#""parents":["folder-123"]"#));
    assert!(body.contains("Content-Type: application/json\r\n\r\n{\"items\":[]}\r\n"));
}

#[tokio::test]
async fn csv_artifacts_are_sent_as_text_csv() {
    let server = MockServer::start().await;
    mount_upload(&server, "ya29.static").await;

    static_sink(&server)
        .store(
            ExportStream::from_bytes(b"name,login\n".to_vec()),
            "vaultwarden-backup.csv",
        )
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8(requests[0].body.clone()).unwrap();
    assert!(body.contains("Content-Type: text/csv\r\n\r\nname,login\n"));
}

#[tokio::test]
async fn rejected_upload_is_upload_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload/drive/v3/files"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "error": {"code": 403, "message": "The user does not have sufficient permissions for file folder-123."}
        })))
        .mount(&server)
        .await;

    let err = static_sink(&server)
        .store(ExportStream::from_bytes(b"{}".to_vec()), "vaultwarden-backup.json")
        .await
        .unwrap_err();
    assert!(matches!(err, BackupError::Upload { .. }), "got {err:?}");
    let message = err.to_string();
    assert!(message.contains("403"));
    assert!(message.contains("sufficient permissions"));
}

#[tokio::test]
async fn failing_export_stream_aborts_upload() {
    let server = MockServer::start().await;
    mount_upload(&server, "ya29.static").await;

    let stream = ExportStream::from_stream(futures::stream::iter(vec![
        Ok(b"partial".to_vec()),
        Err(io::Error::other("export pipe closed")),
    ]));
    let err = static_sink(&server)
        .store(stream, "vaultwarden-backup.json")
        .await
        .unwrap_err();
    assert!(matches!(err, BackupError::Upload { .. }), "got {err:?}");
}

#[tokio::test]
async fn service_account_token_is_exchanged_once_and_cached() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    mount_upload(&server, "ya29.exchanged").await;

    let key = ServiceAccountKey::from_json(&key_for(&server)).unwrap();
    let auth = ServiceAccountAuth::new(&key, Duration::from_secs(5)).unwrap();
    let sink = DriveSink::new(Arc::new(auth), "folder-123", Duration::from_secs(5))
        .unwrap()
        .with_base_url(server.uri());

    for _ in 0..2 {
        sink.store(ExportStream::from_bytes(b"{}".to_vec()), "vaultwarden-backup.json")
            .await
            .unwrap();
    }
    // `expect(1)` on the token mock is verified when the server drops.
}

#[tokio::test]
async fn rejected_token_exchange_is_upload_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "Invalid JWT Signature."
        })))
        .mount(&server)
        .await;

    let key = ServiceAccountKey::from_json(&key_for(&server)).unwrap();
    let auth = ServiceAccountAuth::new(&key, Duration::from_secs(5)).unwrap();
    let sink = DriveSink::new(Arc::new(auth), "folder-123", Duration::from_secs(5))
        .unwrap()
        .with_base_url(server.uri());

    let err = sink
        .store(ExportStream::from_bytes(b"{}".to_vec()), "vaultwarden-backup.json")
        .await
        .unwrap_err();
    assert!(matches!(err, BackupError::Upload { .. }));
    assert!(err.to_string().contains("invalid_grant"));
}

#[test]
fn sink_from_key_file_reads_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("service-account.json");
    std::fs::write(&path, FIXTURE).unwrap();
    assert!(sink_from_key_file(&path, "folder-123", Duration::from_secs(5)).is_ok());
}

#[test]
fn sink_from_malformed_key_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("service-account.json");
    std::fs::write(&path, "{ not json").unwrap();
    let err = sink_from_key_file(&path, "folder-123", Duration::from_secs(5)).unwrap_err();
    assert!(matches!(err, BackupError::Config(_)));
}
