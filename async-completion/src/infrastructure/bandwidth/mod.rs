// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Bandwidth Group Registry
//!
//! The class-owned table of named [`BandwidthManager`]s created from
//! configuration (`bw_groups.<name>.*` keys). Endpoints reference a group by
//! name via `set_bandwidth_manager`; the registry hands out
//! `Arc<BandwidthManager>` clones so every referencing endpoint sees the
//! same shared token bucket.

mod registry;

pub use registry::BandwidthRegistry;
