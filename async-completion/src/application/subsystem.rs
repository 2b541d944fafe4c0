// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Subsystem
//!
//! The single composition root a consumer constructs explicitly — no
//! process-wide singletons. Owns the template and bandwidth registries, the
//! endpoint class, and the normal/failsafe manager pair, and is the one
//! place `endpoint.read/write/flush`, `endpoint.createForFile`, and the rest
//! of the consumer API are exposed from.

use std::any::Any;
use std::sync::Arc;

use async_completion_domain::entities::{CompletionCallback, UserData};
use async_completion_domain::value_objects::{
    BackendKind, ByteRange, EndpointId, OpenFlags, TemplateId, TransferKind,
};
use async_completion_domain::{CompletionError, SubRequest, Task};
use tokio::sync::oneshot;
use tracing::info;

use crate::infrastructure::config::Settings;
use crate::infrastructure::endpoint::{Endpoint, NewTaskQueue};
use crate::infrastructure::manager::{FailsafeManager, ManagerEvent, NormalManager, Operation, OperationKind};
use crate::infrastructure::{BandwidthRegistry, EndpointClass, Telemetry, TemplateRegistry};

/// What `read`/`write`/`flush` hand back: the consumer-visible [`Task`] plus
/// a receiver for the sub-request's own result, delivered once the manager
/// thread finishes it.
pub type Completion = oneshot::Receiver<Result<Option<Vec<u8>>, CompletionError>>;

pub struct Subsystem {
    settings: Settings,
    templates: Arc<TemplateRegistry>,
    bandwidth: Arc<BandwidthRegistry>,
    endpoint_class: Arc<EndpointClass>,
    normal: Arc<NormalManager>,
    failsafe: Arc<FailsafeManager>,
    telemetry: Arc<Telemetry>,
    normal_thread: Option<std::thread::JoinHandle<()>>,
    failsafe_thread: Option<std::thread::JoinHandle<()>>,
}

impl Subsystem {
    /// `class.initialize`: builds every registry, the
    /// bandwidth groups declared in configuration, and spawns both manager
    /// threads. In `"simple"` mode, new endpoints are registered directly
    /// with the failsafe/simple manager and the normal manager's thread
    /// simply never receives any work.
    pub fn new(settings: Settings) -> Result<Self, CompletionError> {
        let telemetry = Arc::new(Telemetry::new()?);

        let bandwidth = Arc::new(BandwidthRegistry::new());
        for (name, group) in &settings.bw_groups {
            bandwidth.register(name.clone(), group.max, group.start_or_default(), group.step_or_default());
        }

        let failsafe = Arc::new(FailsafeManager::new(Arc::new(NewTaskQueue::new()), Some(telemetry.clone())));
        let failsafe_thread = failsafe.clone().spawn();

        let normal = Arc::new(NormalManager::new(
            Arc::new(NewTaskQueue::new()),
            failsafe.mailbox(),
            Some(telemetry.clone()),
        ));
        let normal_thread = normal.clone().spawn();

        let initial_mailbox = match settings.io_mgr {
            crate::infrastructure::config::ManagerSetting::Async => normal.mailbox(),
            crate::infrastructure::config::ManagerSetting::Simple => failsafe.mailbox(),
        };
        let endpoint_class = Arc::new(EndpointClass::new(bandwidth.clone(), initial_mailbox));

        info!(?settings.io_mgr, ?settings.file_backend, "async completion subsystem initialized");

        Ok(Self {
            settings,
            templates: Arc::new(TemplateRegistry::new()),
            bandwidth,
            endpoint_class,
            normal,
            failsafe,
            telemetry,
            normal_thread: Some(normal_thread),
            failsafe_thread: Some(failsafe_thread),
        })
    }

    pub fn telemetry(&self) -> Arc<Telemetry> {
        self.telemetry.clone()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // -- Template API (`template.create*`/`template.destroy`) --

    pub fn create_device_template(&self, owner: u64, callback: CompletionCallback) -> TemplateId {
        self.templates.create_device(owner, callback).id()
    }

    pub fn create_driver_template(&self, owner: u64, callback: CompletionCallback, argument: Arc<dyn Any + Send + Sync>) -> TemplateId {
        self.templates.create_driver(owner, callback, argument).id()
    }

    pub fn create_usb_template(&self, owner: u64, callback: CompletionCallback) -> TemplateId {
        self.templates.create_usb(owner, callback).id()
    }

    pub fn destroy_template(&self, id: TemplateId) -> Result<(), CompletionError> {
        self.templates.destroy(id)
    }

    // -- Endpoint API (`endpoint.createForFile`/`close`/`getSize`/`setSize`/`setBandwidthManager`) --

    pub async fn create_endpoint_for_file(
        &self,
        uri: impl Into<std::path::PathBuf>,
        backend: BackendKind,
        flags: OpenFlags,
    ) -> Result<Arc<Endpoint>, CompletionError> {
        self.endpoint_class.create_for_file(uri, backend, flags).await
    }

    pub async fn close_endpoint(&self, id: EndpointId) -> Result<(), CompletionError> {
        self.endpoint_class.destroy(id).await
    }

    pub fn set_bandwidth_manager(&self, endpoint: &Endpoint, group: &str) -> Result<(), CompletionError> {
        let manager = self.bandwidth.get(group).ok_or_else(|| CompletionError::not_found(format!("bandwidth group '{group}'")))?;
        endpoint.set_bandwidth_manager(Some(manager));
        Ok(())
    }

    pub fn set_bandwidth_max(&self, group: &str, new_max: u64) -> Result<(), CompletionError> {
        self.endpoint_class.set_bandwidth_max(group, new_max)
    }

    /// Basename-only endpoint lookup, used by the debug CLI's
    /// `injecterror`/`injectdelay` subcommands.
    pub fn find_endpoint_by_filename(&self, name: &str) -> Option<Arc<Endpoint>> {
        self.endpoint_class.find_by_filename(name)
    }

    /// `true` once `id` has migrated to (or started in) the failsafe
    /// manager. Exposed for diagnostics and for exercising the migration
    /// path in tests.
    pub fn is_on_failsafe_manager(&self, id: EndpointId) -> bool {
        self.failsafe.owns(id)
    }

    /// `cRequestsActiveMax` of the normal manager as of its last completed
    /// grow. Exposed for exercising the grow-on-saturation path in tests.
    pub fn normal_manager_active_max(&self) -> u64 {
        self.normal.active_max()
    }

    /// SUSPEND: blocks until the addressed manager acknowledges it has
    /// stopped accepting new work.
    pub async fn suspend(&self) {
        self.normal.mailbox().send_and_wait(ManagerEvent::Suspend).await;
        self.failsafe.mailbox().send_and_wait(ManagerEvent::Suspend).await;
    }

    /// RESUME: blocks until the addressed manager acknowledges it is
    /// draining again.
    pub async fn resume(&self) {
        self.normal.mailbox().send_and_wait(ManagerEvent::Resume).await;
        self.failsafe.mailbox().send_and_wait(ManagerEvent::Resume).await;
    }

    // -- Task submission API (`endpoint.read/write/flush`) --

    pub fn read(
        &self,
        endpoint: Arc<Endpoint>,
        template: TemplateId,
        offset: u64,
        length: u64,
        user_data: Option<UserData>,
    ) -> Result<(Arc<Task>, Completion), CompletionError> {
        let range = ByteRange::new(offset, length)?;
        self.submit(endpoint, template, OperationKind::Read { length }, TransferKind::Read, range, user_data)
    }

    pub fn write(
        &self,
        endpoint: Arc<Endpoint>,
        template: TemplateId,
        offset: u64,
        data: Vec<u8>,
        user_data: Option<UserData>,
    ) -> Result<(Arc<Task>, Completion), CompletionError> {
        let range = ByteRange::new(offset, data.len() as u64)?;
        self.submit(endpoint, template, OperationKind::Write { data }, TransferKind::Write, range, user_data)
    }

    pub fn flush(&self, endpoint: Arc<Endpoint>, template: TemplateId, user_data: Option<UserData>) -> Result<(Arc<Task>, Completion), CompletionError> {
        let range = ByteRange::new(0, 1)?;
        self.submit(endpoint, template, OperationKind::Flush, TransferKind::Flush, range, user_data)
    }

    /// `task.cancel` — always `NotImplemented`.
    pub fn cancel_task(&self, _task: &Task) -> Result<(), CompletionError> {
        Err(CompletionError::NotImplemented("task cancellation is not supported".into()))
    }

    fn submit(
        &self,
        endpoint: Arc<Endpoint>,
        template_id: TemplateId,
        kind: OperationKind,
        transfer_kind: TransferKind,
        range: ByteRange,
        user_data: Option<UserData>,
    ) -> Result<(Arc<Task>, Completion), CompletionError> {
        let template = self.templates.get(template_id).ok_or_else(|| CompletionError::not_found(format!("template {template_id}")))?;
        template.acquire();

        let task = Arc::new(Task::new(endpoint.id(), template_id, range.len(), user_data));
        let sub_request = SubRequest::new(task.id(), transfer_kind, range);
        let (result_tx, result_rx) = oneshot::channel();

        let op = Operation { sub_request, task: task.clone(), endpoint: endpoint.clone(), template: Some(template), kind, result_tx: Some(result_tx) };

        let queue = if self.failsafe.owns(endpoint.id()) { self.failsafe.queue() } else { self.normal.queue() };
        queue.push(op);

        Ok((task, result_rx))
    }

    /// Orderly shutdown: tells both managers to stop, then joins their
    /// threads. Endpoints are left exactly as they are — callers should
    /// `close_endpoint` anything that needs a clean flush first.
    pub fn shutdown(&mut self) {
        self.normal.mailbox().send(ManagerEvent::Shutdown);
        self.failsafe.mailbox().send(ManagerEvent::Shutdown);
        if let Some(handle) = self.normal_thread.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.failsafe_thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Subsystem {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_completion_domain::entities::CompletionEvent;
    use tempfile::NamedTempFile;

    fn noop_callback() -> CompletionCallback {
        Arc::new(|_event: CompletionEvent| {})
    }

    #[tokio::test]
    async fn write_then_read_round_trips_through_the_subsystem() {
        let mut subsystem = Subsystem::new(Settings::default()).unwrap();
        let tmp = NamedTempFile::new().unwrap();
        let endpoint = subsystem.create_endpoint_for_file(tmp.path(), BackendKind::Buffered, OpenFlags::read_write()).await.unwrap();
        let template = subsystem.create_device_template(1, noop_callback());

        let (_task, rx) = subsystem.write(endpoint.clone(), template, 0, b"hello".to_vec(), None).unwrap();
        let result = rx.await.unwrap();
        assert!(result.unwrap().is_none());

        let (_task, rx) = subsystem.read(endpoint.clone(), template, 0, 5, None).unwrap();
        let result = rx.await.unwrap().unwrap();
        assert_eq!(result.unwrap(), b"hello".to_vec());

        subsystem.shutdown();
    }

    #[tokio::test]
    async fn cancel_is_never_implemented() {
        let mut subsystem = Subsystem::new(Settings::default()).unwrap();
        let tmp = NamedTempFile::new().unwrap();
        let endpoint = subsystem.create_endpoint_for_file(tmp.path(), BackendKind::Buffered, OpenFlags::read_write()).await.unwrap();
        let template = subsystem.create_device_template(1, noop_callback());
        let (task, _rx) = subsystem.flush(endpoint, template, None).unwrap();
        assert!(subsystem.cancel_task(&task).is_err());
        subsystem.shutdown();
    }
}
