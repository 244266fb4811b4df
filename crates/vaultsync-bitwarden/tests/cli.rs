// SPDX-FileCopyrightText: 2026 vaultsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tests for the Bitwarden adapter against a scripted stand-in for `bw`.
//!
//! Tests are serialized: writing an executable while another test forks a
//! child can fail with ETXTBSY.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;
use serial_test::serial;
use tempfile::TempDir;
use vaultsync_bitwarden::BitwardenCli;
use vaultsync_core::{BackupError, Credentials, ExportFormat, Session, VaultClient};

const TOKEN: &str = "tok3n+abc/def==";

/// Shell bodies for each `bw` subcommand.
struct FakeBw {
    config: String,
    login: String,
    unlock: String,
    export: String,
    logout: String,
}

impl Default for FakeBw {
    fn default() -> Self {
        Self {
            config: "exit 0".into(),
            login: "echo 'You are logged in!'".into(),
            unlock: format!(
                "echo 'Your vault is now unlocked!'; echo '$ export BW_SESSION=\"{TOKEN}\"'"
            ),
            export: "printf '{\"items\":[]}'".into(),
            logout: "echo 'You have logged out.'".into(),
        }
    }
}

struct Harness {
    _dir: TempDir,
    program: PathBuf,
    log: PathBuf,
}

impl Harness {
    fn new(fake: FakeBw) -> Self {
        let dir = TempDir::new().unwrap();
        let program = dir.path().join("bw");
        let log = dir.path().join("calls.log");
        let script = format!(
            "#!/bin/sh\n\
             echo \"$*|session=${{BW_SESSION:-}}|id=${{BW_CLIENTID:-}}|secret=${{BW_CLIENTSECRET:-}}|pw=${{BW_PASSWORD:-}}|nointeraction=${{BW_NOINTERACTION:-}}\" >> '{log}'\n\
             case \"$1\" in\n\
             config) {config} ;;\n\
             login) {login} ;;\n\
             unlock) {unlock} ;;\n\
             export) {export} ;;\n\
             logout) {logout} ;;\n\
             *) exit 64 ;;\n\
             esac\n",
            log = log.display(),
            config = fake.config,
            login = fake.login,
            unlock = fake.unlock,
            export = fake.export,
            logout = fake.logout,
        );
        std::fs::write(&program, script).unwrap();
        std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();
        Self {
            _dir: dir,
            program,
            log,
        }
    }

    fn client(&self) -> BitwardenCli {
        BitwardenCli::new(&self.program, Duration::from_secs(10))
    }

    fn calls(&self) -> Vec<String> {
        read_lines(&self.log)
    }

    fn subcommands(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|line| line.split('|').next().unwrap_or_default().to_string())
            .collect()
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

fn credentials(server: Option<&str>) -> Credentials {
    Credentials::new(
        "user.8c1f",
        SecretString::from("client-secret-xyz"),
        SecretString::from("master-pass-123"),
        server.map(str::to_string),
    )
}

#[tokio::test]
#[serial]
async fn authenticate_logs_in_and_unlocks() {
    let harness = Harness::new(FakeBw::default());
    let session = harness
        .client()
        .authenticate(&credentials(None))
        .await
        .unwrap();
    assert_eq!(session.token(), TOKEN);

    let calls = harness.calls();
    assert_eq!(harness.subcommands(), vec!["login --apikey", "unlock --passwordenv BW_PASSWORD"]);
    assert!(calls[0].contains("id=user.8c1f"));
    assert!(calls[0].contains("secret=client-secret-xyz"));
    assert!(calls[0].contains("nointeraction=true"));
    assert!(calls[1].contains("pw=master-pass-123"));
    assert!(!calls[1].contains("secret=client-secret-xyz"));
}

#[tokio::test]
#[serial]
async fn authenticate_configures_server_first() {
    let harness = Harness::new(FakeBw::default());
    harness
        .client()
        .authenticate(&credentials(Some("https://vault.example.com")))
        .await
        .unwrap();
    assert_eq!(
        harness.subcommands(),
        vec![
            "config server https://vault.example.com",
            "login --apikey",
            "unlock --passwordenv BW_PASSWORD"
        ]
    );
}

#[tokio::test]
#[serial]
async fn rejected_login_is_auth_error_without_secrets() {
    let harness = Harness::new(FakeBw {
        login: "echo 'client_secret client-secret-xyz is invalid' >&2; exit 1".into(),
        ..FakeBw::default()
    });
    let err = harness
        .client()
        .authenticate(&credentials(None))
        .await
        .unwrap_err();
    assert!(matches!(err, BackupError::Auth { .. }), "got {err:?}");
    assert!(!err.to_string().contains("client-secret-xyz"));
    assert_eq!(harness.subcommands(), vec!["login --apikey"]);
}

#[tokio::test]
#[serial]
async fn rejected_server_config_is_auth_error() {
    let harness = Harness::new(FakeBw {
        config: "echo 'Logout required before server config update.' >&2; exit 1".into(),
        ..FakeBw::default()
    });
    let err = harness
        .client()
        .authenticate(&credentials(Some("https://vault.example.com")))
        .await
        .unwrap_err();
    assert!(matches!(err, BackupError::Auth { .. }));
    assert!(err.to_string().contains("Logout required"));
}

#[tokio::test]
#[serial]
async fn failed_unlock_logs_out_again() {
    let harness = Harness::new(FakeBw {
        unlock: "echo 'Invalid master password.' >&2; exit 1".into(),
        ..FakeBw::default()
    });
    let err = harness
        .client()
        .authenticate(&credentials(None))
        .await
        .unwrap_err();
    assert!(matches!(err, BackupError::Auth { .. }));
    assert_eq!(
        harness.subcommands(),
        vec!["login --apikey", "unlock --passwordenv BW_PASSWORD", "logout"]
    );
}

#[tokio::test]
#[serial]
async fn unlock_without_marker_is_protocol_error() {
    let harness = Harness::new(FakeBw {
        unlock: "echo 'Your vault is now unlocked!'".into(),
        ..FakeBw::default()
    });
    let err = harness
        .client()
        .authenticate(&credentials(None))
        .await
        .unwrap_err();
    assert!(matches!(err, BackupError::Protocol(_)), "got {err:?}");
    assert_eq!(harness.subcommands().last().map(String::as_str), Some("logout"));
}

#[tokio::test]
#[serial]
async fn export_passes_session_and_format() {
    let harness = Harness::new(FakeBw::default());
    let client = harness.client();
    let stream = client
        .export(&Session::new(TOKEN), ExportFormat::EncryptedJson)
        .await
        .unwrap();
    assert_eq!(stream.read_to_end().await.unwrap(), br#"{"items":[]}"#);

    let calls = harness.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].starts_with("export --format encrypted_json --raw|"));
    assert!(calls[0].contains(&format!("session={TOKEN}")));
}

#[tokio::test]
#[serial]
async fn export_keeps_stderr_out_of_the_artifact() {
    let harness = Harness::new(FakeBw {
        export: "echo 'update available' >&2; printf 'name,login\\n'".into(),
        ..FakeBw::default()
    });
    let stream = harness
        .client()
        .export(&Session::new(TOKEN), ExportFormat::Csv)
        .await
        .unwrap();
    assert_eq!(stream.read_to_end().await.unwrap(), b"name,login\n");
}

#[tokio::test]
#[serial]
async fn failed_export_is_export_error_with_token_redacted() {
    let harness = Harness::new(FakeBw {
        export: "echo \"session $BW_SESSION expired\" >&2; exit 1".into(),
        ..FakeBw::default()
    });
    let err = harness
        .client()
        .export(&Session::new(TOKEN), ExportFormat::Json)
        .await
        .unwrap_err();
    assert!(matches!(err, BackupError::Export { .. }), "got {err:?}");
    assert!(!err.to_string().contains(TOKEN));
}

#[tokio::test]
#[serial]
async fn empty_export_is_export_error() {
    let harness = Harness::new(FakeBw {
        export: "exit 0".into(),
        ..FakeBw::default()
    });
    let err = harness
        .client()
        .export(&Session::new(TOKEN), ExportFormat::Json)
        .await
        .unwrap_err();
    assert!(matches!(err, BackupError::Export { .. }));
}

#[tokio::test]
#[serial]
async fn invalidate_runs_logout_with_session() {
    let harness = Harness::new(FakeBw::default());
    harness
        .client()
        .invalidate(Session::new(TOKEN))
        .await
        .unwrap();
    let calls = harness.calls();
    assert_eq!(harness.subcommands(), vec!["logout"]);
    assert!(calls[0].contains(&format!("session={TOKEN}")));
}

#[tokio::test]
#[serial]
async fn failed_logout_is_teardown_error() {
    let harness = Harness::new(FakeBw {
        logout: "echo 'You are not logged in.' >&2; exit 1".into(),
        ..FakeBw::default()
    });
    let err = harness
        .client()
        .invalidate(Session::new(TOKEN))
        .await
        .unwrap_err();
    assert!(matches!(err, BackupError::Teardown { .. }));
}

#[tokio::test]
#[serial]
async fn hung_command_times_out() {
    let harness = Harness::new(FakeBw {
        export: "exec sleep 30".into(),
        ..FakeBw::default()
    });
    let client = BitwardenCli::new(&harness.program, Duration::from_millis(200));
    let err = client
        .export(&Session::new(TOKEN), ExportFormat::Json)
        .await
        .unwrap_err();
    assert!(matches!(err, BackupError::Export { .. }));
    assert!(err.to_string().contains("timed out"));
}
