// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Runtime Supervision
//!
//! Task supervision for the async, consumer-facing half of this crate. The
//! manager loops that actually drive I/O are supervised separately — each
//! owns one dedicated OS thread (see [`crate::infrastructure::manager`]).

pub mod supervisor;

pub use supervisor::{join_supervised, spawn_supervised, AppResult};
