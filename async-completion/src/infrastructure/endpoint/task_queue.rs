// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Task Queue
//!
//! Per-endpoint queues:
//!
//! - [`NewTaskQueue`] — the cross-thread producer side. Consumer threads
//!   push work items; the manager thread drains the whole batch in the
//!   order submitted, via a [`crossbeam::queue::SegQueue`], a lock-free
//!   MPSC-safe queue that gives the externally observable guarantee this
//!   needs (many producers, one consumer, FIFO drain order) without a
//!   hand-rolled atomic pointer chain.
//! - [`PendingQueue`] — manager-thread-only. Holds items deferred by
//!   capacity, alignment, or bandwidth denial; drained before `NewTaskQueue`
//!   on each wake-up.
//!
//! Both are generic over the queued item `T`: the endpoint's own demo usage
//! queues [`async_completion_domain::SubRequest`] values directly (see the
//! tests below), while [`crate::infrastructure::manager`] queues its own
//! `Operation` type, which additionally carries the owned buffer and
//! completion plumbing a manager thread needs to actually run the I/O — an
//! owned `Vec<u8>` simply moves through the channel rather than being looked
//! up from a separate request arena by handle.

use std::collections::VecDeque;

use crossbeam::queue::SegQueue;

/// The cross-thread producer→manager handoff queue.
#[derive(Default)]
pub struct NewTaskQueue<T> {
    inner: SegQueue<T>,
}

impl<T> NewTaskQueue<T> {
    pub fn new() -> Self {
        Self { inner: SegQueue::new() }
    }

    /// Called from any consumer thread.
    pub fn push(&self, item: T) {
        self.inner.push(item);
    }

    /// Called from the manager thread only: drains everything currently
    /// queued, in the order it was pushed.
    pub fn drain(&self) -> Vec<T> {
        let mut drained = Vec::new();
        while let Some(item) = self.inner.pop() {
            drained.push(item);
        }
        drained
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// The manager-thread-only deferred-work FIFO.
#[derive(Default)]
pub struct PendingQueue<T> {
    inner: VecDeque<T>,
}

impl<T> PendingQueue<T> {
    pub fn new() -> Self {
        Self { inner: VecDeque::new() }
    }

    pub fn push_back(&mut self, item: T) {
        self.inner.push_back(item);
    }

    pub fn pop_front(&mut self) -> Option<T> {
        self.inner.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Drains everything currently pending, in FIFO order.
    pub fn drain_all(&mut self) -> Vec<T> {
        self.inner.drain(..).collect()
    }
}
