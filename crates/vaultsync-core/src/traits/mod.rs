// SPDX-FileCopyrightText: 2026 vaultsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits consumed by the backup pipeline.
//!
//! Both traits use `#[async_trait]` so adapters can be held as
//! `Arc<dyn ...>` and swapped for recording mocks in tests.

pub mod sink;
pub mod vault;

pub use sink::UploadSink;
pub use vault::VaultClient;
