// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Completion Error Taxonomy
//!
//! Domain-specific errors for the async completion subsystem. Each variant
//! represents a specific failure mode so callers can pattern-match on the
//! category rather than parsing a message string.
//!
//! ## Error Categories
//!
//! - **Invariant violations** (caller bugs): [`CompletionError::BadArgument`],
//!   [`CompletionError::BadState`].
//! - **Host resource exhaustion**: [`CompletionError::ResourceExhausted`],
//!   carrying a `/proc/sys/fs/aio-max-nr` hint on Linux when the host's async
//!   I/O context limit is what was actually hit.
//! - **Transient I/O**: surfaced via [`CompletionError::Io`] only once the
//!   normal manager's retry/migration policy has given up.
//! - **Fatal I/O**: [`CompletionError::Fatal`] — the kernel reported one of
//!   the unrecoverable codes (disk full, device I/O error, file too big).
//! - **End of stream**: [`CompletionError::Eof`].
//! - **Unsupported backend feature**: [`CompletionError::NotSupported`].
//! - **Busy**: [`CompletionError::Busy`] — template destroy with outstanding
//!   references.
//! - **Not found**: [`CompletionError::NotFound`] — unknown bandwidth group.
//! - **Not implemented**: [`CompletionError::NotImplemented`] — task
//!   cancellation is intentionally unsupported (see the crate's design
//!   notes).

use thiserror::Error;

/// Kernel-reported I/O status codes that are treated as fatal.
///
/// Fatal errors are surfaced to the consumer's completion callback
/// immediately; everything else is treated as transient and drives the
/// endpoint's degrade-to-failsafe migration path.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalIoKind {
    #[error("I/O error")]
    IoError,
    #[error("disk I/O error")]
    DiskIoError,
    #[error("device I/O error")]
    DevIoError,
    #[error("disk full")]
    DiskFull,
    #[error("file too big")]
    FileTooBig,
}

/// Domain-specific errors for the async completion subsystem.
#[derive(Error, Debug, Clone)]
pub enum CompletionError {
    #[error("bad argument: {0}")]
    BadArgument(String),

    #[error("bad state: {0}")]
    BadState(String),

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("fatal I/O error: {kind} ({detail})")]
    Fatal { kind: FatalIoKind, detail: String },

    #[error("end of file")]
    Eof,

    #[error("not supported: {0}")]
    NotSupported(String),

    #[error("busy: {0}")]
    Busy(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("not implemented: {0}")]
    NotImplemented(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CompletionError {
    pub fn bad_argument(msg: impl Into<String>) -> Self {
        Self::BadArgument(msg.into())
    }

    pub fn bad_state(msg: impl Into<String>) -> Self {
        Self::BadState(msg.into())
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    pub fn fatal(kind: FatalIoKind, detail: impl Into<String>) -> Self {
        Self::Fatal { kind, detail: detail.into() }
    }

    pub fn not_supported(msg: impl Into<String>) -> Self {
        Self::NotSupported(msg.into())
    }

    pub fn busy(msg: impl Into<String>) -> Self {
        Self::Busy(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error indicates a transient condition a caller may
    /// retry, as opposed to a permanent failure.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CompletionError::Io(_) | CompletionError::ResourceExhausted(_))
    }

    /// Whether this error belongs to the fatal set that must surface to the
    /// consumer immediately without triggering endpoint migration.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CompletionError::Fatal { .. })
    }
}

impl From<std::io::Error> for CompletionError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::UnexpectedEof => CompletionError::Eof,
            ErrorKind::OutOfMemory => {
                CompletionError::fatal(FatalIoKind::DiskFull, err.to_string())
            }
            _ if is_host_context_exhaustion(&err) => {
                CompletionError::ResourceExhausted(context_exhaustion_hint(err.to_string()))
            }
            _ => CompletionError::Io(err.to_string()),
        }
    }
}

/// `EMFILE`/`ENFILE`/`EAGAIN` — the host has no more file descriptors or
/// async I/O contexts to hand out. Numeric rather than `libc`-sourced since
/// this is the one place the domain crate looks at a raw errno.
#[cfg(unix)]
fn is_host_context_exhaustion(err: &std::io::Error) -> bool {
    matches!(err.raw_os_error(), Some(24) | Some(23) | Some(11))
}

#[cfg(not(unix))]
fn is_host_context_exhaustion(_err: &std::io::Error) -> bool {
    false
}

/// Appends the Linux-specific `/proc/sys/fs/aio-max-nr` hint the consumer
/// needs to raise the host's async I/O context limit, when readable.
fn context_exhaustion_hint(detail: String) -> String {
    #[cfg(target_os = "linux")]
    {
        match std::fs::read_to_string("/proc/sys/fs/aio-max-nr") {
            Ok(value) => format!("{detail} (raise /proc/sys/fs/aio-max-nr, currently {})", value.trim()),
            Err(_) => format!("{detail} (host async I/O context limit reached; see /proc/sys/fs/aio-max-nr)"),
        }
    }
    #[cfg(not(target_os = "linux"))]
    {
        format!("{detail} (host async I/O context limit reached)")
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn emfile_converts_to_resource_exhausted_with_a_hint() {
        let io_err = std::io::Error::from_raw_os_error(24); // EMFILE
        let err: CompletionError = io_err.into();
        match err {
            CompletionError::ResourceExhausted(detail) => {
                assert!(detail.contains("aio-max-nr") || detail.contains("async I/O context"))
            }
            other => panic!("expected ResourceExhausted, got {other:?}"),
        }
    }

    #[test]
    fn plain_io_error_stays_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: CompletionError = io_err.into();
        assert!(matches!(err, CompletionError::Io(_)));
    }
}
