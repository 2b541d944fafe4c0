// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Async Completion
//!
//! The infrastructure and application crate implementing the async file I/O
//! completion subsystem on top of [`async_completion_domain`]'s pure business
//! logic. This crate owns everything the domain layer deliberately does not:
//! OS threads, a kernel async-I/O context, the host filesystem, configuration
//! loading, metrics, and logging.
//!
//! ## Module Structure
//!
//! - `application` — the `Subsystem` composition root: the single owner of
//!   the template registry and endpoint class tables (no process-wide
//!   globals, per the crate's design notes).
//! - `infrastructure` — concrete adapters: the endpoint, its task queue and
//!   request pool, the normal and failsafe async I/O managers, the endpoint
//!   class, the template registry, completion dispatch, configuration,
//!   telemetry.
//! - `presentation` — the debug CLI surface (`injecterror`/`injectdelay`).
//!
//! ## Architecture
//!
//! This follows the same layering the domain crate documents: application
//! orchestrates, infrastructure implements, nothing here is reachable except
//! through a `Subsystem` handle a consumer constructs explicitly.

pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use application::Subsystem;
pub use infrastructure::config::Settings;
