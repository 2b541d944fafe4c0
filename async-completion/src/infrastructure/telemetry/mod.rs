// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Telemetry
//!
//! Structured logging ([`logging`]) and the `prometheus`-backed statistics
//! surface ([`metrics`]).

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::Telemetry;
