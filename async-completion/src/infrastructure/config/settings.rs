// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Settings
//!
//! Layered configuration for the subsystem: built-in defaults, an optional
//! TOML file, then `ASYNC_COMPLETION_*`-prefixed environment overrides,
//! merged through the `config` crate into this `serde`-deserializable
//! struct.

use std::collections::HashMap;
use std::path::Path;

use async_completion_domain::CompletionError;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagerSetting {
    Simple,
    Async,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendSetting {
    Buffered,
    NonBuffered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandwidthGroupSettings {
    pub max: u64,
    #[serde(default)]
    pub start: Option<u64>,
    #[serde(default)]
    pub step: Option<u64>,
}

impl BandwidthGroupSettings {
    /// `start` defaults to `max` (ramp-up disabled unless configured), `step`
    /// defaults to 0 (no ramp-up).
    pub fn start_or_default(&self) -> u64 {
        self.start.unwrap_or(self.max)
    }

    pub fn step_or_default(&self) -> u64 {
        self.step.unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_io_mgr")]
    pub io_mgr: ManagerSetting,
    #[serde(default = "default_file_backend")]
    pub file_backend: BackendSetting,
    #[serde(default)]
    pub advanced_statistics: bool,
    #[serde(default)]
    pub bw_groups: HashMap<String, BandwidthGroupSettings>,
}

fn default_io_mgr() -> ManagerSetting {
    ManagerSetting::Async
}

fn default_file_backend() -> BackendSetting {
    BackendSetting::NonBuffered
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            io_mgr: default_io_mgr(),
            file_backend: default_file_backend(),
            advanced_statistics: false,
            bw_groups: HashMap::new(),
        }
    }
}

impl Settings {
    /// Loads defaults, then an optional TOML file at `path` if it exists,
    /// then `ASYNC_COMPLETION_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, CompletionError> {
        let mut builder = Config::builder()
            .set_default("io_mgr", "async")
            .map_err(config_err)?
            .set_default("file_backend", "non_buffered")
            .map_err(config_err)?
            .set_default("advanced_statistics", false)
            .map_err(config_err)?;

        if let Some(path) = path {
            if path.exists() {
                builder = builder.add_source(File::from(path));
            }
        }

        let config = builder
            .add_source(Environment::with_prefix("ASYNC_COMPLETION").separator("__"))
            .build()
            .map_err(config_err)?;

        config.try_deserialize().map_err(config_err)
    }
}

fn config_err(err: config::ConfigError) -> CompletionError {
    CompletionError::bad_argument(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_any_file() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.io_mgr, ManagerSetting::Async);
        assert_eq!(settings.file_backend, BackendSetting::NonBuffered);
        assert!(!settings.advanced_statistics);
        assert!(settings.bw_groups.is_empty());
    }

    #[test]
    fn bandwidth_group_defaults_start_to_max_and_step_to_zero() {
        let group = BandwidthGroupSettings { max: 1_000_000, start: None, step: None };
        assert_eq!(group.start_or_default(), 1_000_000);
        assert_eq!(group.step_or_default(), 0);
    }

    #[test]
    fn loads_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("async-completion.toml");
        std::fs::write(
            &path,
            r#"
            io_mgr = "simple"
            file_backend = "buffered"
            advanced_statistics = true

            [bw_groups.default]
            max = 10485760
            start = 1048576
            step = 1048576
            "#,
        )
        .unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.io_mgr, ManagerSetting::Simple);
        assert_eq!(settings.file_backend, BackendSetting::Buffered);
        assert!(settings.advanced_statistics);
        let group = &settings.bw_groups["default"];
        assert_eq!(group.max, 10_485_760);
        assert_eq!(group.start_or_default(), 1_048_576);
    }
}
