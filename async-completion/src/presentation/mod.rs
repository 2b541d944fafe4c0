// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Presentation Layer
//!
//! The debug CLI surface (`injecterror`/`injectdelay`), gated behind the
//! `debug-hooks` feature — not part of the default build.

#[cfg(feature = "debug-hooks")]
pub mod cli;

#[cfg(feature = "debug-hooks")]
pub use cli::{DebugCli, DebugCommand};
