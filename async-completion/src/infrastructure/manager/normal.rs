// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Normal (Async) Manager
//!
//! The default manager: one dedicated OS thread
//! running a small current-thread async runtime, draining queued operations
//! and running them concurrently, up to `cRequestsActiveMax` at a time.
//! Operations whose endpoint is mid-migration are parked on a local
//! [`PendingQueue`] and retried on the next wake-up. A sub-request that
//! fails with a recoverable, non-fatal error causes its endpoint to be
//! handed off to the [`super::failsafe::FailsafeManager`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_completion_domain::value_objects::EndpointId;
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::infrastructure::completion::{run_operation, Outcome};
use crate::infrastructure::endpoint::{Endpoint, NewTaskQueue, PendingQueue};
use crate::infrastructure::runtime::{join_supervised, spawn_supervised};
use crate::infrastructure::telemetry::Telemetry;

use super::blocking_event::{EventMailbox, ManagerEvent, ManagerMailbox};
use super::operation::{Operation, OperationKind};

const IDLE_SLEEP: Duration = Duration::from_millis(5);

/// Initial `cRequestsActiveMax`: how many operations this manager runs
/// concurrently before it must drain and grow.
const DEFAULT_ACTIVE_MAX: u64 = 64;

/// The async I/O manager: owns a set of endpoints and the queue of
/// operations submitted against them.
pub struct NormalManager {
    endpoints: Arc<Mutex<HashMap<EndpointId, Arc<Endpoint>>>>,
    queue: Arc<NewTaskQueue<Operation>>,
    mailbox: EventMailbox,
    suspended: AtomicBool,
    shutting_down: AtomicBool,
    /// `cRequestsActiveMax`: the concurrency cap this wake-up cycle may not
    /// exceed without first transitioning to GROWING.
    active_max: AtomicU64,
    /// Set once a wake-up cycle saturates `active_max` with work still
    /// pending; cleared once `grow()` doubles the cap.
    growing: AtomicBool,
    /// Where a non-fatal, recoverable error sends the owning endpoint.
    migrate_to: ManagerMailbox,
    telemetry: Option<Arc<Telemetry>>,
}

impl NormalManager {
    pub fn new(queue: Arc<NewTaskQueue<Operation>>, migrate_to: ManagerMailbox, telemetry: Option<Arc<Telemetry>>) -> Self {
        Self {
            endpoints: Arc::new(Mutex::new(HashMap::new())),
            queue,
            mailbox: EventMailbox::new(),
            suspended: AtomicBool::new(false),
            shutting_down: AtomicBool::new(false),
            active_max: AtomicU64::new(DEFAULT_ACTIVE_MAX),
            growing: AtomicBool::new(false),
            migrate_to,
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

    /// `cRequestsActiveMax` as of the last completed `grow()`.
    pub fn active_max(&self) -> u64 {
        self.active_max.load(Ordering::Acquire)
    }

    fn handle_events(&self) {
        while let Some((event, ack)) = self.mailbox.try_recv() {
            match event {
                ManagerEvent::AddEndpoint(endpoint) => {
                    info!(endpoint = %endpoint.id(), "endpoint added to normal manager");
                    endpoint.set_moving(false);
                    self.endpoints.lock().insert(endpoint.id(), endpoint);
                }
                ManagerEvent::RemoveEndpoint(id) | ManagerEvent::CloseEndpoint(id) => {
                    self.endpoints.lock().remove(&id);
                }
                ManagerEvent::Suspend => self.suspended.store(true, Ordering::Release),
                ManagerEvent::Resume => self.suspended.store(false, Ordering::Release),
                ManagerEvent::Shutdown => self.shutting_down.store(true, Ordering::Release),
            }
            // By construction every op spawned last cycle has already been
            // joined before we get back here, so `cRequestsActive == 0` and
            // it's safe to acknowledge REMOVE/CLOSE immediately.
            if let Some(ack) = ack {
                let _ = ack.send(());
            }
        }
    }

    /// Doubles the concurrency cap. Precondition: no operations are
    /// currently in flight (enforced by the caller, which only invokes this
    /// between fully-joined batches).
    fn grow(&self) {
        let old = self.active_max.load(Ordering::Acquire);
        let new = old.saturating_mul(2);
        self.active_max.store(new, Ordering::Release);
        self.growing.store(false, Ordering::Release);
        info!(old_max = old, new_max = new, "normal manager capacity grown");
    }

    /// Spawns the manager's dedicated OS thread. The returned handle should
    /// be joined at shutdown.
    pub fn spawn(self: Arc<Self>) -> std::thread::JoinHandle<()> {
        std::thread::Builder::new()
            .name("async-completion-normal".into())
            .spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_time()
                    .build()
                    .expect("failed to build normal manager runtime");
                runtime.block_on(self.run_loop());
            })
            .expect("failed to spawn normal manager thread")
    }

    async fn run_loop(self: Arc<Self>) {
        let mut pending: PendingQueue<Operation> = PendingQueue::new();
        loop {
            self.handle_events();
            if self.shutting_down.load(Ordering::Acquire) {
                return;
            }
            if self.suspended.load(Ordering::Acquire) {
                tokio::time::sleep(IDLE_SLEEP).await;
                continue;
            }

            let mut batch = pending.drain_all();
            batch.extend(self.queue.drain());
            if batch.is_empty() {
                tokio::time::sleep(IDLE_SLEEP).await;
                continue;
            }

            // `cRequestsActive` is always 0 entering this point: the
            // previous cycle joined every handle it spawned before looping,
            // so the whole of `active_max` is free capacity this cycle.
            let capacity = self.active_max.load(Ordering::Acquire) as usize;
            let mut handles = Vec::with_capacity(batch.len().min(capacity));
            let mut saturated = false;
            for op in batch {
                if op.endpoint.is_moving() {
                    pending.push_back(op);
                    continue;
                }
                if matches!(op.kind, OperationKind::Flush) {
                    if !op.endpoint.try_begin_flush() {
                        pending.push_back(op);
                        continue;
                    }
                } else if op.endpoint.has_outstanding_flush() {
                    pending.push_back(op);
                    continue;
                }
                if handles.len() >= capacity {
                    saturated = true;
                    pending.push_back(op);
                    continue;
                }

                let migrate_to = self.migrate_to.clone();
                let endpoints = self.endpoints.clone();
                let telemetry = self.telemetry.clone();
                handles.push(spawn_supervised("normal-manager-operation", async move {
                    let endpoint = op.endpoint.clone();
                    if let Outcome::Migrate = run_operation(op, telemetry.as_deref()).await {
                        warn!(endpoint = %endpoint.id(), "recoverable error, migrating endpoint to failsafe manager");
                        endpoint.set_moving(true);
                        endpoints.lock().remove(&endpoint.id());
                        migrate_to.send_and_wait(ManagerEvent::AddEndpoint(endpoint)).await;
                    }
                    Ok(())
                }));
            }
            if saturated && !pending.is_empty() {
                self.growing.store(true, Ordering::Release);
            }
            for handle in handles {
                let _ = join_supervised(handle).await;
            }

            if self.growing.load(Ordering::Acquire) {
                self.grow();
            }
        }
    }
}
