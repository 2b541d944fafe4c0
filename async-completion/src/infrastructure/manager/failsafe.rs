// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Failsafe Manager
//!
//! The degraded fallback manager: endpoints land
//! here after the normal manager gives up on them following a recoverable
//! I/O error. Processes one endpoint's queued operations at a time,
//! strictly sequentially — no concurrent in-flight requests, no further
//! migration on failure (there is nowhere lower to degrade to).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_completion_domain::value_objects::EndpointId;
use parking_lot::Mutex;
use tracing::info;

use crate::infrastructure::completion::run_operation;
use crate::infrastructure::endpoint::{Endpoint, NewTaskQueue};
use crate::infrastructure::telemetry::Telemetry;

use super::blocking_event::{EventMailbox, ManagerEvent, ManagerMailbox};
use super::operation::{Operation, OperationKind};

const IDLE_SLEEP: Duration = Duration::from_millis(10);

pub struct FailsafeManager {
    endpoints: Mutex<HashMap<EndpointId, Arc<Endpoint>>>,
    queue: Arc<NewTaskQueue<Operation>>,
    mailbox: EventMailbox,
    shutting_down: AtomicBool,
    telemetry: Option<Arc<Telemetry>>,
}

impl FailsafeManager {
    pub fn new(queue: Arc<NewTaskQueue<Operation>>, telemetry: Option<Arc<Telemetry>>) -> Self {
        Self {
            endpoints: Mutex::new(HashMap::new()),
            queue,
            mailbox: EventMailbox::new(),
            shutting_down: AtomicBool::new(false),
            telemetry,
        }
    }

    pub fn mailbox(&self) -> ManagerMailbox {
        self.mailbox.mailbox()
    }

    pub fn queue(&self) -> Arc<NewTaskQueue<Operation>> {
        self.queue.clone()
    }

    pub fn endpoint_count(&self) -> usize {
        self.endpoints.lock().len()
    }

    pub fn owns(&self, id: EndpointId) -> bool {
        self.endpoints.lock().contains_key(&id)
    }

    fn handle_events(&self) {
        while let Some((event, ack)) = self.mailbox.try_recv() {
            match event {
                ManagerEvent::AddEndpoint(endpoint) => {
                    info!(endpoint = %endpoint.id(), "endpoint migrated to failsafe manager");
                    endpoint.set_moving(false);
                    self.endpoints.lock().insert(endpoint.id(), endpoint);
                }
                ManagerEvent::RemoveEndpoint(id) | ManagerEvent::CloseEndpoint(id) => {
                    self.endpoints.lock().remove(&id);
                }
                ManagerEvent::Shutdown => self.shutting_down.store(true, Ordering::Release),
                ManagerEvent::Suspend | ManagerEvent::Resume => {}
            }
            if let Some(ack) = ack {
                let _ = ack.send(());
            }
        }
    }

    pub fn spawn(self: Arc<Self>) -> std::thread::JoinHandle<()> {
        std::thread::Builder::new()
            .name("async-completion-failsafe".into())
            .spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_time()
                    .build()
                    .expect("failed to build failsafe manager runtime");
                runtime.block_on(self.run_loop());
            })
            .expect("failed to spawn failsafe manager thread")
    }

    async fn run_loop(self: Arc<Self>) {
        loop {
            self.handle_events();
            if self.shutting_down.load(Ordering::Acquire) {
                return;
            }

            let batch = self.queue.drain();
            if batch.is_empty() {
                tokio::time::sleep(IDLE_SLEEP).await;
                continue;
            }

            // One endpoint's worth of I/O in flight at a time.
            for op in batch {
                if matches!(op.kind, OperationKind::Flush) && !op.endpoint.try_begin_flush() {
                    // A flush from this endpoint's prior manager is still
                    // draining; requeue and retry next wake-up.
                    self.queue.push(op);
                    continue;
                }
                let _ = run_operation(op, self.telemetry.as_deref()).await;
            }
        }
    }
}
