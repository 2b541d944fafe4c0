// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Backend Kind
//!
//! Selects whether an endpoint's file is opened through the host page cache
//! (`Buffered`) or bypasses it (`NonBuffered`), which in turn determines
//! whether the endpoint must honor 512-byte alignment and fall back to
//! bounce buffering.

use serde::{Deserialize, Serialize};

/// The backend selector for an endpoint's open file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendKind {
    /// Host page cache is used; no alignment constraints.
    Buffered,
    /// Direct/unbuffered I/O; offsets, lengths, and buffers must be aligned
    /// to [`BackendKind::ALIGNMENT`] bytes or routed through a bounce buffer.
    NonBuffered,
}

impl BackendKind {
    /// The alignment, in bytes, required by non-buffered backends.
    pub const ALIGNMENT: u64 = 512;

    pub fn requires_alignment(&self) -> bool {
        matches!(self, BackendKind::NonBuffered)
    }
}

/// The I/O manager type backing an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ManagerKind {
    /// Dedicated thread driving a kernel async-I/O context.
    Async,
    /// Degenerate synchronous fallback, one endpoint at a time.
    Simple,
}
