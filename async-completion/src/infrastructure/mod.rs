// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Infrastructure Layer
//!
//! Adapters that give the domain layer somewhere to run: real file I/O
//! ([`endpoint`]), the async/failsafe manager pair ([`manager`]), the
//! subsystem-wide endpoint and bandwidth tables ([`endpoint_class`],
//! [`bandwidth`]), template bookkeeping ([`template`]), completion dispatch
//! ([`completion`]), configuration ([`config`]), the statistics and logging
//! surface ([`telemetry`]), and the supervised-task runtime glue
//! ([`runtime`]).

pub mod bandwidth;
pub mod completion;
pub mod config;
pub mod endpoint;
pub mod endpoint_class;
pub mod manager;
pub mod runtime;
pub mod telemetry;
pub mod template;

pub use bandwidth::BandwidthRegistry;
pub use config::Settings;
pub use endpoint::Endpoint;
pub use endpoint_class::EndpointClass;
pub use manager::{FailsafeManager, NormalManager};
pub use telemetry::Telemetry;
pub use template::TemplateRegistry;
