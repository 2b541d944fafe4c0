// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Task Supervision Utilities
//!
//! Wraps `tokio::spawn` so every background task's outcome is logged and
//! propagated rather than silently dropped. Used for the consumer-facing
//! async entry points (`read`/`write`/`flush` futures); the manager loops
//! themselves run on dedicated `std::thread`s, not as
//! tokio tasks, so they are supervised separately (see
//! `infrastructure::manager`).

use async_completion_domain::CompletionError;
use tokio::task::JoinHandle;
use tracing::{debug, error};

pub type AppResult<T> = Result<T, CompletionError>;

/// Spawns a supervised task with automatic error logging and lifecycle
/// tracking.
pub fn spawn_supervised<F, T>(name: &'static str, fut: F) -> JoinHandle<AppResult<T>>
where
    F: std::future::Future<Output = AppResult<T>> + Send + 'static,
    T: Send + 'static,
{
    debug!(task = name, "task starting");

    tokio::spawn(async move {
        let result = fut.await;

        match &result {
            Ok(_) => debug!(task = name, "task completed successfully"),
            Err(e) => error!(task = name, error = ?e, "task failed"),
        }

        result
    })
}

/// Awaits a supervised task handle, converting a panic or cancellation into
/// a [`CompletionError::Internal`].
pub async fn join_supervised<T>(handle: JoinHandle<AppResult<T>>) -> AppResult<T> {
    match handle.await {
        Ok(task_result) => task_result,
        Err(e) if e.is_panic() => Err(CompletionError::internal(format!("task panicked: {e}"))),
        Err(e) => Err(CompletionError::internal(format!("task join failed: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn supervised_success_round_trips() {
        let handle = spawn_supervised("test-success", async { Ok::<i32, CompletionError>(42) });
        let result = join_supervised(handle).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn supervised_error_propagates() {
        let handle =
            spawn_supervised("test-error", async { Err::<(), _>(CompletionError::bad_argument("bad")) });
        assert!(join_supervised(handle).await.is_err());
    }

    #[tokio::test]
    async fn panic_is_converted_to_internal_error() {
        let handle: JoinHandle<AppResult<()>> = tokio::spawn(async {
            panic!("boom");
        });
        let result = join_supervised(handle).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("panicked"));
    }
}
