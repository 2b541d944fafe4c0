// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Debug CLI
//!
//! `injecterror`/`injectdelay` subcommands. Only compiled in behind the
//! `debug-hooks` feature — these are debugging hooks, not production
//! surface.

use std::time::Duration;

use async_completion_domain::value_objects::{CompletionStatus, TransferKind};
use clap::{Parser, Subcommand, ValueEnum};

use crate::application::Subsystem;

#[derive(Parser, Debug, Clone)]
#[command(name = "async-completion-debug")]
#[command(about = "Fault-injection hooks for the async completion subsystem")]
pub struct DebugCli {
    #[command(subcommand)]
    pub command: DebugCommand,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorOp {
    Read,
    Write,
}

impl From<ErrorOp> for TransferKind {
    fn from(op: ErrorOp) -> Self {
        match op {
            ErrorOp::Read => TransferKind::Read,
            ErrorOp::Write => TransferKind::Write,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayOp {
    Read,
    Write,
    Flush,
    Any,
}

impl From<DelayOp> for Option<TransferKind> {
    fn from(op: DelayOp) -> Self {
        match op {
            DelayOp::Read => Some(TransferKind::Read),
            DelayOp::Write => Some(TransferKind::Write),
            DelayOp::Flush => Some(TransferKind::Flush),
            DelayOp::Any => None,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum DebugCommand {
    /// Make the next matching operation on `filename` fail with `status_code`.
    InjectError {
        op: ErrorOp,
        filename: String,
        status_code: u8,
    },
    /// Delay matching operations on `filename` by `delay_ms` (+/- `jitter_ms`),
    /// for `requests` operations (default: until cleared).
    InjectDelay {
        op: DelayOp,
        filename: String,
        delay_ms: u64,
        jitter_ms: Option<u64>,
        requests: Option<u32>,
    },
}

/// Runs a parsed [`DebugCommand`] against `subsystem`, returning the message
/// to print ("No file with name … found" on a miss).
pub fn run(subsystem: &Subsystem, command: DebugCommand) -> String {
    match command {
        DebugCommand::InjectError { op, filename, status_code } => match subsystem.find_endpoint_by_filename(&filename) {
            Some(endpoint) => {
                endpoint.inject_error(op.into(), CompletionStatus::from_code(status_code));
                format!("injected error {status_code} into next {op:?} on {filename}")
            }
            None => format!("No file with name {filename} found"),
        },
        DebugCommand::InjectDelay { op, filename, delay_ms, jitter_ms, requests } => match subsystem.find_endpoint_by_filename(&filename) {
            Some(endpoint) => {
                let delay = Duration::from_millis(delay_ms);
                let jitter = Duration::from_millis(jitter_ms.unwrap_or(0));
                endpoint.inject_delay(op.into(), delay, jitter, requests);
                format!("injected {delay_ms}ms delay into {op:?} on {filename}")
            }
            None => format!("No file with name {filename} found"),
        },
    }
}

#[cfg(test)]
mod tests {
    use async_completion_domain::value_objects::{BackendKind, OpenFlags};
    use tempfile::NamedTempFile;

    use super::*;
    use crate::infrastructure::config::Settings;

    #[tokio::test]
    async fn inject_error_reports_missing_file() {
        let subsystem = Subsystem::new(Settings::default()).unwrap();
        let msg = run(&subsystem, DebugCommand::InjectError { op: ErrorOp::Read, filename: "nope.img".into(), status_code: 3 });
        assert_eq!(msg, "No file with name nope.img found");
    }

    #[tokio::test]
    async fn inject_delay_finds_endpoint_by_basename() {
        let subsystem = Subsystem::new(Settings::default()).unwrap();
        let tmp = NamedTempFile::new().unwrap();
        subsystem.create_endpoint_for_file(tmp.path(), BackendKind::Buffered, OpenFlags::read_write()).await.unwrap();
        let filename = tmp.path().file_name().unwrap().to_string_lossy().into_owned();

        let msg = run(&subsystem, DebugCommand::InjectDelay { op: DelayOp::Any, filename: filename.clone(), delay_ms: 10, jitter_ms: None, requests: Some(1) });
        assert!(msg.contains(&filename));
    }
}
