// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Sub-request
//!
//! One kernel-level async I/O operation. A [`crate::entities::Task`] fans
//! out to one sub-request per scatter/gather segment for read/write, and
//! exactly one for flush. Sub-requests own no data themselves — the kernel
//! async-I/O context "holds" each one during flight, and the parent task
//! owns the fan-out logically — so this entity carries only the metadata
//! needed to submit, retry, and release the operation. The actual buffer
//! bytes live in an arena kept by the owning endpoint, addressed by this
//! sub-request's id, per the crate's handle-over-pointer design notes.

use crate::value_objects::{ByteRange, RangeLockId, SubRequestId, TaskId, TransferKind};

/// Bounce-buffer bookkeeping for a misaligned sub-request.
///
/// Bounce for writes starts with a READ "prefetch" sub-request that fetches
/// the surrounding aligned window, then a WRITE sub-request over the filled
/// buffer. Bounce for reads performs the I/O into the bounce buffer, then
/// the infrastructure layer copies the requested slice out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BounceInfo {
    /// The aligned window the bounce buffer actually covers on disk.
    pub aligned_range: ByteRange,
    /// Offset of the consumer's slice within the bounce buffer.
    pub slice_offset: u64,
    /// Length of the consumer's slice within the bounce buffer.
    pub slice_len: u64,
}

/// One kernel-level async I/O operation fanned out from a task.
#[derive(Debug, Clone)]
pub struct SubRequest {
    id: SubRequestId,
    parent: TaskId,
    kind: TransferKind,
    range: ByteRange,
    bounce: Option<BounceInfo>,
    range_lock: Option<RangeLockId>,
    /// Reused across retries of the same operation (e.g. a partial-transfer
    /// resubmit): one native request handle per sub-request for its whole
    /// lifetime.
    native_handle: Option<u64>,
    bytes_transferred: u64,
    /// Set when this sub-request is the READ half of a write-bounce, i.e.
    /// the prefetch that must complete before the WRITE half is submitted.
    is_prefetch: bool,
}

impl SubRequest {
    pub fn new(parent: TaskId, kind: TransferKind, range: ByteRange) -> Self {
        Self {
            id: SubRequestId::next(),
            parent,
            kind,
            range,
            bounce: None,
            range_lock: None,
            native_handle: None,
            bytes_transferred: 0,
            is_prefetch: false,
        }
    }

    pub fn with_bounce(mut self, bounce: BounceInfo) -> Self {
        self.bounce = Some(bounce);
        self
    }

    pub fn as_prefetch(mut self) -> Self {
        self.is_prefetch = true;
        self
    }

    pub fn id(&self) -> SubRequestId {
        self.id
    }

    pub fn parent(&self) -> TaskId {
        self.parent
    }

    pub fn kind(&self) -> TransferKind {
        self.kind
    }

    pub fn range(&self) -> ByteRange {
        self.range
    }

    pub fn bounce(&self) -> Option<BounceInfo> {
        self.bounce
    }

    pub fn is_bounced(&self) -> bool {
        self.bounce.is_some()
    }

    pub fn is_prefetch(&self) -> bool {
        self.is_prefetch
    }

    pub fn range_lock(&self) -> Option<RangeLockId> {
        self.range_lock
    }

    pub fn assign_range_lock(&mut self, lock: RangeLockId) {
        self.range_lock = Some(lock);
    }

    pub fn clear_range_lock(&mut self) -> Option<RangeLockId> {
        self.range_lock.take()
    }

    pub fn native_handle(&self) -> Option<u64> {
        self.native_handle
    }

    pub fn set_native_handle(&mut self, handle: u64) {
        self.native_handle = Some(handle);
    }

    pub fn bytes_transferred(&self) -> u64 {
        self.bytes_transferred
    }

    /// Shrinks the request to the remaining, not-yet-transferred tail after
    /// a short read/write, advancing the file offset and shrinking the
    /// range in place for resubmission.
    pub fn advance_after_partial_transfer(&mut self, bytes: u64) -> Result<(), crate::error::CompletionError> {
        let new_transferred = self.bytes_transferred + bytes;
        if new_transferred > self.range.len() {
            return Err(crate::error::CompletionError::internal(
                "partial transfer exceeded sub-request length",
            ));
        }
        self.bytes_transferred = new_transferred;
        Ok(())
    }

    /// The remaining byte range still to be transferred, accounting for any
    /// partial transfer already recorded.
    pub fn remaining_range(&self) -> Result<ByteRange, crate::error::CompletionError> {
        let remaining = self.range.len() - self.bytes_transferred;
        if remaining == 0 {
            return Err(crate::error::CompletionError::internal(
                "remaining_range called on a fully transferred sub-request",
            ));
        }
        ByteRange::new(self.range.first() + self.bytes_transferred, remaining)
    }

    pub fn is_fully_transferred(&self) -> bool {
        self.bytes_transferred >= self.range.len()
    }
}
