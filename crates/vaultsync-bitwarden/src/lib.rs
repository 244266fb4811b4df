// SPDX-FileCopyrightText: 2026 vaultsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bitwarden session manager backed by the `bw` command-line client.
//!
//! [`BitwardenCli`] implements [`vaultsync_core::VaultClient`] by running
//! `bw` as a child process. Secrets reach the child only through its
//! environment, and everything the CLI prints is redacted before it can end
//! up in an error message.

pub mod cli;
pub mod client;
pub mod session;

pub use client::BitwardenCli;
pub use session::extract_session_token;
