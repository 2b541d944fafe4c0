// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Async Completion Domain
//!
//! The async completion domain represents the core business logic and rules of
//! the asynchronous file I/O completion subsystem. It implements Domain-Driven
//! Design (DDD) patterns and is completely independent of external concerns
//! like kernel async-I/O contexts, OS threads, or the host filesystem.
//!
//! ## Module Structure
//!
//! - `entities` — objects with identity that change over time: `Task`,
//!   `SubRequest`, `Template`, `RangeLock`.
//! - `value_objects` — immutable, self-validating values: `ByteRange`,
//!   `CompletionStatus`, `TransferKind`, `BackendKind`, `TemplateKind`,
//!   `OpenFlags`, latency bucketing.
//! - `services` — pure domain logic that coordinates entities:
//!   `alignment_policy`, `RangeLockTable`.
//! - `error` — the domain error taxonomy (`CompletionError`).
//!
//! ## Domain-Driven Design Concepts
//!
//! ### Entities
//!
//! **Key Characteristics:**
//! - Have unique identifiers
//! - Can be mutated (state changes)
//! - Identity persists through changes
//! - Equality based on identity, not attributes
//!
//! **Examples in this domain:**
//! - `Task`: the consumer-visible async operation created by read/write/flush
//! - `SubRequest`: one kernel-level async I/O operation fanned out from a task
//! - `Template`: a completion callback binding owned by a device/driver/USB
//!   instance
//! - `RangeLock`: a reservation on a file byte interval
//!
//! ### Value Objects
//!
//! **Key Characteristics:**
//! - Immutable (cannot be changed after creation)
//! - No identity (equality based on attributes)
//! - Self-validating (enforce business rules)
//!
//! **Examples in this domain:**
//! - `ByteRange`: an inclusive `[first, last]` byte interval
//! - `CompletionStatus`: the status code delivered to a completion callback
//! - `TransferKind`: READ, WRITE, or FLUSH
//! - `TemplateKind`: DEVICE, DRIVER, INTERNAL, or USB
//!
//! ## Business Rules and Invariants
//!
//! - A task's `bytes_remaining` equals the sum of segment lengths of all
//!   still-incomplete sub-requests belonging to it.
//! - A template can only be destroyed when its use-count is zero.
//! - Two sub-requests submitted concurrently to the same endpoint must not
//!   share an overlapping byte range.
//!
//! Non-goals inherited from the wider specification (explicitly out of scope
//! for this crate): block-level caching, elevator-style reordering,
//! cross-endpoint fairness beyond bandwidth groups, and task cancellation.

pub mod entities;
pub mod error;
pub mod services;
pub mod value_objects;

// Re-export commonly used types for convenient access across the workspace.
pub use entities::{BandwidthManager, ConsumeOutcome, RangeLock, SubRequest, Task, Template};
pub use error::CompletionError;
pub use services::{LockAttempt, RangeLockTable};
pub use value_objects::{
    BackendKind, ByteRange, CompletionStatus, OpenFlags, TemplateKind, TransferKind,
};
