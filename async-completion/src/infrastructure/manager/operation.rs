// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Queued Operation
//!
//! What a manager actually drains from its [`super::super::endpoint::NewTaskQueue`]:
//! a sub-request plus everything needed to run it and report back. An owned
//! buffer moves through the channel rather than a handle into a shared
//! request arena.

use std::sync::Arc;

use async_completion_domain::entities::{SubRequest, Task, Template};
use async_completion_domain::CompletionError;

use crate::infrastructure::endpoint::Endpoint;

/// The concrete work a sub-request performs.
pub enum OperationKind {
    Read { length: u64 },
    Write { data: Vec<u8> },
    Flush,
}

/// One queued unit of work against an endpoint.
pub struct Operation {
    pub sub_request: SubRequest,
    pub task: Arc<Task>,
    pub endpoint: Arc<Endpoint>,
    pub template: Option<Arc<Template>>,
    pub kind: OperationKind,
    pub result_tx: Option<tokio::sync::oneshot::Sender<Result<Option<Vec<u8>>, CompletionError>>>,
}
