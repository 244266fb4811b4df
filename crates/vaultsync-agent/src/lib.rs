// SPDX-FileCopyrightText: 2026 vaultsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backup orchestration for vaultsync.
//!
//! [`BackupPipeline`] runs one authenticate → export → store pass with a
//! guaranteed session teardown, [`Scheduler`] drives it on a fixed cadence,
//! and [`shutdown`] turns SIGINT/SIGTERM into a cancellation token.

pub mod pipeline;
pub mod scheduler;
pub mod shutdown;

pub use pipeline::{ARTIFACT_STEM, BackupPipeline, artifact_name};
pub use scheduler::Scheduler;
pub use shutdown::install_signal_handler;
