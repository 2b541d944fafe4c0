// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Alignment Policy
//!
//! Stateless arithmetic deciding whether a request needs bounce-buffering
//! against a non-buffered endpoint, and computing the aligned window a
//! bounce buffer must cover. Pure value-object math: no entity state, no
//! I/O.

use crate::error::CompletionError;
use crate::value_objects::{BackendKind, ByteRange};

/// True when `offset`/`length` do not already satisfy `backend`'s alignment
/// requirement and therefore need a bounce buffer.
pub fn needs_bounce(backend: BackendKind, offset: u64, length: u64) -> bool {
    backend.requires_alignment() && !ByteRange::is_aligned(offset, length, BackendKind::ALIGNMENT)
}

/// Computes the smallest alignment-multiple window that covers
/// `[offset, offset + length)`, along with the consumer's slice position
/// within that window.
///
/// Returns `(aligned_range, slice_offset_within_window)`.
pub fn bounce_window(offset: u64, length: u64, alignment: u64) -> Result<(ByteRange, u64), CompletionError> {
    if alignment == 0 || length == 0 {
        return Err(CompletionError::bad_argument("alignment and length must be non-zero"));
    }
    let aligned_start = (offset / alignment) * alignment;
    let end = offset
        .checked_add(length)
        .ok_or_else(|| CompletionError::bad_argument("bounce window overflows u64"))?;
    let aligned_end = end.div_ceil(alignment) * alignment;
    let aligned_range = ByteRange::new(aligned_start, aligned_end - aligned_start)?;
    Ok((aligned_range, offset - aligned_start))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligned_request_needs_no_bounce() {
        assert!(!needs_bounce(BackendKind::NonBuffered, 512, 512));
        assert!(!needs_bounce(BackendKind::Buffered, 100, 7));
    }

    #[test]
    fn misaligned_request_against_nonbuffered_needs_bounce() {
        assert!(needs_bounce(BackendKind::NonBuffered, 100, 50));
    }

    #[test]
    fn bounce_window_covers_full_alignment_multiple() {
        let (range, slice_offset) = bounce_window(100, 50, 512).unwrap();
        assert_eq!(range.first(), 0);
        assert_eq!(range.len(), 512);
        assert_eq!(slice_offset, 100);
    }

    #[test]
    fn bounce_window_spans_two_alignment_blocks() {
        let (range, slice_offset) = bounce_window(500, 100, 512).unwrap();
        assert_eq!(range.first(), 0);
        assert_eq!(range.len(), 1024);
        assert_eq!(slice_offset, 500);
    }
}
