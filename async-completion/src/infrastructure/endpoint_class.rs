// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Endpoint Class
//!
//! The subsystem-wide table of open endpoints.
//! `create_for_file` opens an endpoint and hands it to whichever manager the
//! subsystem wired as its initial mailbox; if the requested backend's open
//! fails, it falls back to the buffered backend once before giving up, for
//! hosts that reject non-buffered/unbuffered opens outright.
//! Disambiguates statistics ids for endpoints sharing a file basename.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_completion_domain::value_objects::{BackendKind, EndpointId, OpenFlags};
use async_completion_domain::CompletionError;
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::infrastructure::bandwidth::BandwidthRegistry;
use crate::infrastructure::endpoint::Endpoint;
use crate::infrastructure::manager::{ManagerEvent, ManagerMailbox};

pub struct EndpointClass {
    endpoints: Mutex<HashMap<EndpointId, Arc<Endpoint>>>,
    stat_ids: Mutex<HashMap<String, u32>>,
    bandwidth: Arc<BandwidthRegistry>,
    /// Where a newly created endpoint is first registered: the normal
    /// manager's mailbox in `"async"` mode, or the failsafe/simple manager's
    /// mailbox directly in `"simple"` mode ("Failsafe/Simple
    /// manager" — same manager serves both roles).
    initial_mailbox: ManagerMailbox,
}

impl EndpointClass {
    pub fn new(bandwidth: Arc<BandwidthRegistry>, initial_mailbox: ManagerMailbox) -> Self {
        Self { endpoints: Mutex::new(HashMap::new()), stat_ids: Mutex::new(HashMap::new()), bandwidth, initial_mailbox }
    }

    /// Disambiguates statistics ids for endpoints sharing a basename:
    /// `foo.img`, `foo.img#2`, `foo.img#3`, ...
    fn stat_id_for(&self, uri: &Path) -> String {
        let basename = uri.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| uri.to_string_lossy().into_owned());
        let mut counters = self.stat_ids.lock();
        let count = counters.entry(basename.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            basename
        } else {
            format!("{basename}#{count}")
        }
    }

    /// Opens `uri`, preferring `backend`, falling back to
    /// [`BackendKind::Buffered`] once if the preferred open fails.
    pub async fn create_for_file(
        &self,
        uri: impl Into<PathBuf>,
        backend: BackendKind,
        flags: OpenFlags,
    ) -> Result<Arc<Endpoint>, CompletionError> {
        let uri = uri.into();
        let stat_id = self.stat_id_for(&uri);

        let endpoint = Arc::new(Endpoint::new(uri.clone(), backend, stat_id.clone(), flags));
        match endpoint.open().await {
            Ok(()) => {}
            Err(err) if backend == BackendKind::NonBuffered => {
                warn!(uri = %uri.display(), error = %err, "non-buffered open failed, falling back to buffered");
                let fallback = Arc::new(Endpoint::new(uri.clone(), BackendKind::Buffered, stat_id, flags));
                fallback.open().await?;
                self.register(fallback.clone()).await;
                return Ok(fallback);
            }
            Err(err) => return Err(err),
        }

        self.register(endpoint.clone()).await;
        Ok(endpoint)
    }

    async fn register(&self, endpoint: Arc<Endpoint>) {
        info!(endpoint = %endpoint.id(), uri = %endpoint.uri().display(), "endpoint created");
        self.endpoints.lock().insert(endpoint.id(), endpoint.clone());
        self.initial_mailbox.send_and_wait(ManagerEvent::AddEndpoint(endpoint)).await;
    }

    pub fn get(&self, id: EndpointId) -> Option<Arc<Endpoint>> {
        self.endpoints.lock().get(&id).cloned()
    }

    pub fn find_by_uri(&self, uri: &Path) -> Option<Arc<Endpoint>> {
        self.endpoints.lock().values().find(|e| e.uri() == uri).cloned()
    }

    /// Matches by basename alone, for the debug CLI:
    /// `injecterror`/`injectdelay` name a file, not a full registered path.
    pub fn find_by_filename(&self, name: &str) -> Option<Arc<Endpoint>> {
        self.endpoints.lock().values().find(|e| e.uri().file_name().map(|n| n.to_string_lossy() == name).unwrap_or(false)).cloned()
    }

    pub async fn destroy(&self, id: EndpointId) -> Result<(), CompletionError> {
        let endpoint = self
            .endpoints
            .lock()
            .remove(&id)
            .ok_or_else(|| CompletionError::not_found(format!("endpoint {id}")))?;
        endpoint.close().await?;
        self.initial_mailbox.send_and_wait(ManagerEvent::CloseEndpoint(id)).await;
        Ok(())
    }

    pub fn set_bandwidth_max(&self, name: &str, new_max: u64) -> Result<(), CompletionError> {
        self.bandwidth.set_max(name, new_max)
    }

    pub fn len(&self) -> usize {
        self.endpoints.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.lock().is_empty()
    }
}
