// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Completion Dispatch
//!
//! [`dispatch::run_operation`] runs an operation, drives the task's
//! decrement-to-zero completion CAS, fires the owning template, and records
//! the statistics surface.

pub mod dispatch;

pub use dispatch::{run_operation, Outcome};
