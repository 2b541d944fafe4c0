// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Range Lock
//!
//! A reservation on a file byte interval, used by the range lock table to
//! serialize sub-requests whose byte ranges overlap. Inserted into the
//! endpoint's interval tree on request preparation when the endpoint has at
//! least one misaligned request active, or the request itself is
//! misaligned; freed on sub-request completion, which pops the queued
//! waiters in FIFO order.

use crate::value_objects::{ByteRange, RangeLockId, SubRequestId};

/// Whether a range lock was taken for a read or a write. The current design
/// treats any overlap as conflicting regardless of this flag — read/read
/// coalescing is future work (see the crate's design notes) — but the flag
/// is retained so that optimization can be added without changing the
/// lock's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Read,
    Write,
}

/// A reservation on `[first, last]` held by one active sub-request, with a
/// FIFO of sub-requests deferred behind it.
#[derive(Debug)]
pub struct RangeLock {
    id: RangeLockId,
    range: ByteRange,
    mode: LockMode,
    waiters: Vec<SubRequestId>,
}

impl RangeLock {
    pub fn new(range: ByteRange, mode: LockMode) -> Self {
        Self { id: RangeLockId::next(), range, mode, waiters: Vec::new() }
    }

    pub fn id(&self) -> RangeLockId {
        self.id
    }

    pub fn range(&self) -> ByteRange {
        self.range
    }

    pub fn mode(&self) -> LockMode {
        self.mode
    }

    /// Appends a sub-request to the waiter FIFO (called when `tryLock`
    /// finds a conflicting, already-held range).
    pub fn push_waiter(&mut self, sub_request: SubRequestId) {
        self.waiters.push(sub_request);
    }

    /// Drains the waiter FIFO in arrival order, for requeueing onto the
    /// endpoint's pending-task list once this lock is released.
    pub fn drain_waiters(&mut self) -> Vec<SubRequestId> {
        std::mem::take(&mut self.waiters)
    }

    pub fn has_waiters(&self) -> bool {
        !self.waiters.is_empty()
    }
}
