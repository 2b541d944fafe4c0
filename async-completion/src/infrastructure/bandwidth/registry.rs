// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Process-wide table of named bandwidth groups.

use std::collections::HashMap;
use std::sync::Arc;

use async_completion_domain::{BandwidthManager, CompletionError};
use parking_lot::RwLock;
use tracing::info;

/// Owns every named [`BandwidthManager`] declared via `bw_groups.<name>.*`
/// configuration. Endpoints hold an `Arc` clone; `setBandwidthMax` mutates
/// the shared manager in place so every referencing endpoint sees the new
/// cap immediately.
#[derive(Default)]
pub struct BandwidthRegistry {
    groups: RwLock<HashMap<String, Arc<BandwidthManager>>>,
}

impl BandwidthRegistry {
    pub fn new() -> Self {
        Self { groups: RwLock::new(HashMap::new()) }
    }

    /// Registers a group from configuration. Overwrites any existing group
    /// of the same name (used when (re)loading configuration at startup).
    pub fn register(&self, name: impl Into<String>, max: u64, start: u64, step: u64) {
        let name = name.into();
        info!(group = %name, max, start, step, "registering bandwidth group");
        self.groups
            .write()
            .insert(name.clone(), Arc::new(BandwidthManager::new(name, max, start, step)));
    }

    pub fn get(&self, name: &str) -> Option<Arc<BandwidthManager>> {
        self.groups.read().get(name).cloned()
    }

    /// `class.bwMgr.setMax`
    pub fn set_max(&self, name: &str, new_max: u64) -> Result<(), CompletionError> {
        let groups = self.groups.read();
        let group = groups
            .get(name)
            .ok_or_else(|| CompletionError::not_found(format!("bandwidth group '{name}'")))?;
        group.set_max(new_max);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.groups.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_group_returns_not_found() {
        let registry = BandwidthRegistry::new();
        assert!(registry.set_max("missing", 100).is_err());
    }

    #[test]
    fn registered_group_can_have_its_cap_raised() {
        let registry = BandwidthRegistry::new();
        registry.register("default", 1_000_000, 1_000_000, 0);
        registry.set_max("default", 2_000_000).unwrap();
        assert_eq!(registry.get("default").unwrap().max_bytes_per_sec(), 2_000_000);
    }
}
