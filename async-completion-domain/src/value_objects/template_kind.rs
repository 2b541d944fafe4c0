// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Template Kind
//!
//! The kind of owner a completion [`crate::entities::Template`] is bound to.

use serde::{Deserialize, Serialize};

/// The owner kind of a completion template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemplateKind {
    Device,
    Driver,
    Internal,
    Usb,
}

impl TemplateKind {
    /// Whether this kind's callback receives the template's own per-kind
    /// user argument in addition to the task's user data (DRIVER/INTERNAL
    /// per the completion dispatch contract).
    pub fn passes_template_argument(&self) -> bool {
        matches!(self, TemplateKind::Driver | TemplateKind::Internal)
    }
}
