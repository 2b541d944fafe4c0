// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Entity Identifiers
//!
//! Per the crate's design notes, cross-thread entity references are modeled
//! as opaque handles rather than raw pointers: a `TaskId`, `SubRequestId`,
//! `TemplateId`, or `EndpointId` is resolved against an arena owned by its
//! respective registry (the endpoint's sub-request table, the process-wide
//! template registry, the endpoint class's endpoint table). This keeps the
//! domain layer free of any synchronization primitive while still giving
//! infrastructure code a stable, `Copy`-able reference type.

use std::sync::atomic::{AtomicU64, Ordering};

macro_rules! handle_id {
    ($name:ident, $counter:ident) => {
        static $counter: AtomicU64 = AtomicU64::new(1);

        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u64);

        impl $name {
            /// Allocates a fresh, process-wide unique id.
            pub fn next() -> Self {
                Self($counter.fetch_add(1, Ordering::Relaxed))
            }

            pub fn as_u64(&self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

handle_id!(TaskId, TASK_ID_COUNTER);
handle_id!(SubRequestId, SUB_REQUEST_ID_COUNTER);
handle_id!(TemplateId, TEMPLATE_ID_COUNTER);
handle_id!(EndpointId, ENDPOINT_ID_COUNTER);
handle_id!(RangeLockId, RANGE_LOCK_ID_COUNTER);
