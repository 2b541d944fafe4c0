// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Application Layer
//!
//! The single composition root a consumer constructs explicitly: no
//! process-wide singletons. [`subsystem::Subsystem`] owns the template and
//! bandwidth registries, the endpoint class, and the normal/failsafe manager
//! pair, and is the only thing the `presentation` CLI and any embedding
//! application talk to.

pub mod subsystem;

pub use subsystem::{Completion, Subsystem};
