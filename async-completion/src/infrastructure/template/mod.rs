// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Template Registry
//!
//! The process-wide (in this crate: `Subsystem`-wide) table of completion
//! [`Template`](async_completion_domain::Template) bindings. Guarded by a
//! single `parking_lot::Mutex` — registration and destruction are a rare
//! path, not a hot one.

mod registry;

pub use registry::TemplateRegistry;
