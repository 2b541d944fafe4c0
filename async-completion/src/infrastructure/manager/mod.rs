// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Async I/O Managers
//!
//! The [`normal::NormalManager`] drives every endpoint concurrently on one
//! dedicated OS thread; the [`failsafe::FailsafeManager`] is the degraded,
//! strictly-sequential fallback a recoverable I/O error migrates an
//! endpoint to.
//!
//! There is no separate "kernel async I/O context" component here:
//! `tokio`'s async filesystem API already provides non-blocking submission
//! backed by its own blocking-pool, and no io_uring/libc crate is pulled in
//! to justify introducing one. [`operation::Operation`] is an owned buffer
//! that moves through the channel instead of being looked up by handle in a
//! shared request arena.

pub mod blocking_event;
pub mod failsafe;
pub mod normal;
pub mod operation;

pub use blocking_event::{EventMailbox, ManagerEvent, ManagerMailbox};
pub use failsafe::FailsafeManager;
pub use normal::NormalManager;
pub use operation::{Operation, OperationKind};
