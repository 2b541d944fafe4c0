// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error Module
//!
//! Defines the error taxonomy used across the async completion subsystem.
//! Errors are categorized so the manager can decide, per [`CompletionError`]
//! variant, whether to surface the failure to the consumer immediately or to
//! retry/migrate the endpoint first.

mod completion_error;

pub use completion_error::{CompletionError, FatalIoKind};
