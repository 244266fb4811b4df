// SPDX-FileCopyrightText: 2026 vaultsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session token extraction from `bw unlock` output.

use std::sync::LazyLock;

use regex::Regex;
use vaultsync_core::BackupError;

/// `bw unlock` prints a shell hint of the form `$ export BW_SESSION="<token>"`.
static SESSION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"export BW_SESSION="([^"]+)""#).expect("session marker pattern is valid")
});

/// Pull the session token out of the unlock output.
///
/// Fails with [`BackupError::Protocol`] when the marker is absent, which
/// means the CLI changed its output format rather than that the
/// credentials were wrong.
pub fn extract_session_token(output: &str) -> Result<String, BackupError> {
    SESSION_MARKER
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            BackupError::Protocol(
                "unlock output did not contain an `export BW_SESSION=\"...\"` marker".to_string(),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNLOCK_OUTPUT: &str = "Your vault is now unlocked!\n\n\
        To unlock your vault, set your session key to the `BW_SESSION` environment variable. ex:\n\
        $ export BW_SESSION=\"5PBYGU+5yt3RHcCjoeJKx/wByU34vokGRZjXpSH7Ylo8w==\"\n\
        > $env:BW_SESSION=\"5PBYGU+5yt3RHcCjoeJKx/wByU34vokGRZjXpSH7Ylo8w==\"\n\n\
        You can also pass the session key to any command with the `--session` option. ex:\n\
        $ bw list items --session 5PBYGU+5yt3RHcCjoeJKx/wByU34vokGRZjXpSH7Ylo8w==\n";

    #[test]
    fn extracts_token_from_real_unlock_output() {
        let token = extract_session_token(UNLOCK_OUTPUT).unwrap();
        assert_eq!(token, "5PBYGU+5yt3RHcCjoeJKx/wByU34vokGRZjXpSH7Ylo8w==");
    }

    #[test]
    fn missing_marker_is_a_protocol_error() {
        let err = extract_session_token("some unrelated text").unwrap_err();
        assert!(matches!(err, BackupError::Protocol(_)));
    }

    #[test]
    fn empty_token_is_not_accepted() {
        let err = extract_session_token(r#"$ export BW_SESSION="""#).unwrap_err();
        assert!(matches!(err, BackupError::Protocol(_)));
    }

    #[test]
    fn powershell_hint_alone_is_not_a_match() {
        let err = extract_session_token(r#"> $env:BW_SESSION="abc""#).unwrap_err();
        assert!(matches!(err, BackupError::Protocol(_)));
    }
}
