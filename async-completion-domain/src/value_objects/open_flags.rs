// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Open Flags
//!
//! Flags accepted by `endpoint.createForFile`.

use serde::{Deserialize, Serialize};

/// Flags controlling how an endpoint's underlying file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OpenFlags {
    pub read_only: bool,
    pub dont_lock: bool,
    pub host_cache_enabled: bool,
}

impl OpenFlags {
    pub fn read_only() -> Self {
        Self { read_only: true, ..Default::default() }
    }

    pub fn read_write() -> Self {
        Self::default()
    }
}
