// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Task
//!
//! The consumer-visible async operation returned by `read`, `write`, and
//! `flush`. A task is the parent of 1..N sub-requests (one per scatter/gather
//! segment for read/write, exactly one for flush); its completion callback
//! fires exactly once, when the last outstanding sub-request finishes.

use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::value_objects::{CompletionStatus, EndpointId, TaskId, TemplateId};

/// Opaque consumer payload carried alongside a task, delivered back to the
/// completion callback untouched.
pub type UserData = Arc<dyn Any + Send + Sync>;

/// A consumer-visible async operation.
///
/// # Invariants
///
/// `bytes_remaining` equals the sum of segment lengths of all still
/// incomplete sub-requests belonging to this task. When it reaches zero, the
/// completion flag transitions to `true` via compare-and-swap exactly once,
/// and the caller that performed that transition is responsible for firing
/// the completion callback.
#[derive(Debug)]
pub struct Task {
    id: TaskId,
    endpoint: EndpointId,
    template: TemplateId,
    bytes_remaining: AtomicI64,
    completed: AtomicBool,
    /// First-observed failure status, CAS-latched; `0` means "success so
    /// far" per [`CompletionStatus::to_code`].
    first_error: AtomicU8,
    started_at: Instant,
    user_data: Option<UserData>,
}

impl Task {
    pub fn new(endpoint: EndpointId, template: TemplateId, total_bytes: u64, user_data: Option<UserData>) -> Self {
        Self {
            id: TaskId::next(),
            endpoint,
            template,
            bytes_remaining: AtomicI64::new(total_bytes as i64),
            completed: AtomicBool::new(false),
            first_error: AtomicU8::new(0),
            started_at: Instant::now(),
            user_data,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn endpoint(&self) -> EndpointId {
        self.endpoint
    }

    pub fn template(&self) -> TemplateId {
        self.template
    }

    pub fn user_data(&self) -> Option<&UserData> {
        self.user_data.as_ref()
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }

    pub fn status(&self) -> CompletionStatus {
        CompletionStatus::from_code(self.first_error.load(Ordering::Acquire))
    }

    /// Records the result of one finished sub-request belonging to this
    /// task: `segment_len` bytes are removed from `bytes_remaining`
    /// regardless of outcome (a failed sub-request still counts toward the
    /// total so the parent eventually completes), and `status` — if an
    /// error — is CAS-latched into the first-error slot only if no earlier
    /// sub-request has already recorded one.
    ///
    /// Returns `Some(final_status)` exactly once: on the call that drives
    /// `bytes_remaining` to zero and wins the completion-flag CAS. Callers
    /// must treat this as the single trigger to invoke the completion
    /// callback.
    pub fn complete_sub_request(&self, segment_len: u64, status: Option<CompletionStatus>) -> Option<CompletionStatus> {
        if let Some(status) = status {
            if !status.is_success() {
                let _ = self.first_error.compare_exchange(
                    0,
                    status.to_code(),
                    Ordering::AcqRel,
                    Ordering::Acquire,
                );
            }
        }

        let remaining = self.bytes_remaining.fetch_sub(segment_len as i64, Ordering::AcqRel) - segment_len as i64;
        debug_assert!(remaining >= 0, "bytes_remaining underflow: task completed more bytes than it owned");

        if remaining <= 0
            && self
                .completed
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        {
            Some(self.status())
        } else {
            None
        }
    }

    pub fn bytes_remaining(&self) -> i64 {
        self.bytes_remaining.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(total: u64) -> Task {
        Task::new(EndpointId::next(), TemplateId::next(), total, None)
    }

    #[test]
    fn single_segment_completes_immediately() {
        let t = task(4096);
        let result = t.complete_sub_request(4096, Some(CompletionStatus::Success));
        assert_eq!(result, Some(CompletionStatus::Success));
        assert!(t.is_completed());
    }

    #[test]
    fn fan_out_completes_exactly_once_on_last_segment() {
        let t = task(100);
        assert_eq!(t.complete_sub_request(40, Some(CompletionStatus::Success)), None);
        assert_eq!(t.complete_sub_request(30, Some(CompletionStatus::Success)), None);
        assert_eq!(
            t.complete_sub_request(30, Some(CompletionStatus::Success)),
            Some(CompletionStatus::Success)
        );
        // Any further call must not re-fire (completion flag already set).
        assert!(t.is_completed());
    }

    #[test]
    fn first_error_wins() {
        let t = task(100);
        assert_eq!(
            t.complete_sub_request(50, Some(CompletionStatus::Io)),
            None
        );
        // A later success does not overwrite the first-observed error.
        let result = t.complete_sub_request(50, Some(CompletionStatus::Success));
        assert_eq!(result, Some(CompletionStatus::Io));
    }
}
