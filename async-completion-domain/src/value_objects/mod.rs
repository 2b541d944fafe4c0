// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Value Objects
//!
//! Immutable objects that represent concepts without identity. Value objects
//! are defined by their attributes and enforce business rules through
//! validation at construction.
//!
//! - [`ByteRange`]: an inclusive `[first, last]` byte interval with the
//!   overlap test used by the range lock table.
//! - [`TransferKind`]: READ, WRITE, or FLUSH.
//! - [`BackendKind`] / [`ManagerKind`]: endpoint backend and manager
//!   selectors.
//! - [`TemplateKind`]: DEVICE, DRIVER, INTERNAL, or USB.
//! - [`CompletionStatus`]: the status code stored on a task's first-error
//!   latch and delivered to its completion callback.
//! - [`OpenFlags`]: flags accepted by `endpoint.createForFile`.
//! - latency bucketing via [`latency_bucket::bucket_index`].

pub mod backend_kind;
pub mod byte_range;
pub mod completion_status;
pub mod ids;
pub mod latency_bucket;
pub mod open_flags;
pub mod template_kind;
pub mod transfer_kind;

pub use backend_kind::{BackendKind, ManagerKind};
pub use byte_range::ByteRange;
pub use completion_status::CompletionStatus;
pub use ids::{EndpointId, RangeLockId, SubRequestId, TaskId, TemplateId};
pub use latency_bucket::{bucket_index, LATENCY_BUCKET_COUNT};
pub use open_flags::OpenFlags;
pub use template_kind::TemplateKind;
pub use transfer_kind::TransferKind;
