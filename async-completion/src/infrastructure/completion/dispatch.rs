// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Completion Dispatch
//!
//! Runs one [`Operation`] against its endpoint and performs the completion
//! bookkeeping: decrement-to-zero CAS on the task
//! (`Task::complete_sub_request`, already atomic in the domain crate), firing
//! the owning template on the task's last sub-request, recording the
//! statistics surface, and replying to the consumer. Shared by
//! [`crate::infrastructure::manager::NormalManager`] and
//! [`crate::infrastructure::manager::FailsafeManager`], which differ only in
//! how many operations they run concurrently, not in per-operation behavior.

use async_completion_domain::value_objects::CompletionStatus;
use tracing::{debug, trace, warn};

use crate::infrastructure::manager::{Operation, OperationKind};
use crate::infrastructure::telemetry::Telemetry;

/// What the manager should do after an operation finishes.
pub enum Outcome {
    /// Ran to completion (success or a fatal error already surfaced to the
    /// consumer).
    Done,
    /// A transient, recoverable error occurred; the caller should migrate
    /// the owning endpoint to the failsafe manager.
    Migrate,
}

pub async fn run_operation(op: Operation, telemetry: Option<&Telemetry>) -> Outcome {
    let Operation { mut sub_request, task, endpoint, template, kind, result_tx } = op;
    trace!(sub_request = %sub_request.id(), task = %task.id(), "dispatching operation");

    let native_handle = endpoint.acquire_native_handle();
    sub_request.set_native_handle(native_handle);
    let is_flush = matches!(kind, OperationKind::Flush);

    let result = match kind {
        OperationKind::Read { length } => {
            endpoint.read(sub_request.id(), sub_request.range().first(), length).await.map(Some)
        }
        OperationKind::Write { data } => {
            endpoint.write(sub_request.id(), sub_request.range().first(), &data).await.map(|_| None)
        }
        OperationKind::Flush => endpoint.flush().await.map(|_| None),
    };
    endpoint.release_native_handle(native_handle);
    if is_flush {
        endpoint.end_flush();
    }

    let status = match &result {
        Ok(_) => CompletionStatus::Success,
        Err(err) => {
            if err.is_fatal() {
                warn!(sub_request = %sub_request.id(), error = %err, "fatal I/O error");
            }
            CompletionStatus::from(err)
        }
    };
    let migrate = matches!(&result, Err(err) if err.is_recoverable() && !err.is_fatal());

    if let Some(telemetry) = telemetry {
        telemetry.record_completion(endpoint.stat_id(), task.elapsed(), sub_request.range().len());
    }

    if let Some(final_status) = task.complete_sub_request(sub_request.range().len(), Some(status)) {
        debug!(task = %task.id(), status = ?final_status, "task completed");
        if let Some(template) = &template {
            template.fire(task.user_data().cloned(), final_status);
            template.release();
        }
    }

    if let Some(tx) = result_tx {
        let _ = tx.send(result);
    }

    if migrate {
        Outcome::Migrate
    } else {
        Outcome::Done
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_completion_domain::value_objects::{BackendKind, ByteRange, OpenFlags, TransferKind};
    use async_completion_domain::{SubRequest, Task};
    use tempfile::NamedTempFile;

    use super::*;
    use crate::infrastructure::endpoint::Endpoint;

    #[tokio::test]
    async fn flush_completes_the_task_and_records_telemetry() {
        let tmp = NamedTempFile::new().unwrap();
        let endpoint = Arc::new(Endpoint::new(tmp.path().to_path_buf(), BackendKind::Buffered, "disk.img".into(), OpenFlags::read_write()));
        endpoint.open().await.unwrap();

        let task = Arc::new(Task::new(endpoint.id(), async_completion_domain::value_objects::TemplateId::next(), 1, None));
        let sub_request = SubRequest::new(task.id(), TransferKind::Flush, ByteRange::new(0, 1).unwrap());
        let op = Operation { sub_request, task: task.clone(), endpoint, template: None, kind: OperationKind::Flush, result_tx: None };

        let telemetry = Telemetry::new().unwrap();
        let outcome = run_operation(op, Some(&telemetry)).await;
        assert!(matches!(outcome, Outcome::Done));
        assert!(task.is_completed());
        assert!(telemetry.render().unwrap().contains("async_completion_operations_total"));
    }
}
