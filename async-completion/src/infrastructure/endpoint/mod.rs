// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Endpoint
//!
//! A single open file and everything manager threads need to drive I/O
//! against it:
//!
//! - [`endpoint::Endpoint`] — the open file, its range lock table, bandwidth
//!   manager attachment, and debug injection hooks.
//! - [`request_pool::RequestPool`] — the per-endpoint free list of native
//!   request handles.
//! - [`task_queue::NewTaskQueue`] / [`task_queue::PendingQueue`] — the
//!   cross-thread producer handoff and manager-thread deferred-work FIFO.

pub mod endpoint;
pub mod request_pool;
pub mod task_queue;

pub use endpoint::Endpoint;
pub use request_pool::RequestPool;
pub use task_queue::{NewTaskQueue, PendingQueue};
