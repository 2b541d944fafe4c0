// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Endpoint
//!
//! A single open file. Owns the underlying handle, the per-endpoint range
//! lock table, an optional shared bandwidth manager, and the debug
//! error/delay injection tables used by the presentation-layer CLI.
//! `read`/`write` route misaligned requests against a non-buffered backend
//! through a bounce buffer computed by
//! [`async_completion_domain::value_objects`]'s alignment policy.

use std::collections::HashMap;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_completion_domain::entities::LockMode;
use async_completion_domain::services::alignment_policy::{bounce_window, needs_bounce};
use async_completion_domain::services::RangeLockTable;
use async_completion_domain::value_objects::{
    BackendKind, ByteRange, CompletionStatus, OpenFlags, RangeLockId, SubRequestId,
};
use async_completion_domain::{BandwidthManager, CompletionError, ConsumeOutcome};
use parking_lot::Mutex as SyncMutex;
use parking_lot::RwLock;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::{Mutex as AsyncMutex, Notify};
use tracing::{debug, trace, warn};

use async_completion_domain::value_objects::EndpointId;

use super::request_pool::RequestPool;

/// Capacity of each endpoint's native request handle free list.
const REQUEST_POOL_CAPACITY: usize = 64;

/// Which operations a debug delay injection applies to; `None` means "any".
pub type DelayKind = Option<async_completion_domain::value_objects::TransferKind>;

#[derive(Default)]
struct InjectionState {
    errors: HashMap<async_completion_domain::value_objects::TransferKind, CompletionStatus>,
    /// `(delay, jitter, requests remaining)` — `None` remaining means "until cleared".
    delays: HashMap<DelayKind, (Duration, Duration, Option<u32>)>,
    jitter_seed: u64,
}

/// A single open file endpoint.
pub struct Endpoint {
    id: EndpointId,
    uri: PathBuf,
    backend: BackendKind,
    stat_id: String,
    flags: OpenFlags,
    file: AsyncMutex<Option<File>>,
    cached_size: AtomicU64,
    size_known: AtomicBool,
    locks: SyncMutex<RangeLockTable>,
    waiters: SyncMutex<HashMap<SubRequestId, Arc<Notify>>>,
    bandwidth: RwLock<Option<Arc<BandwidthManager>>>,
    moving: AtomicBool,
    flush_in_flight: AtomicBool,
    injection: SyncMutex<InjectionState>,
    request_pool: SyncMutex<RequestPool>,
}

impl Endpoint {
    pub fn new(uri: impl Into<PathBuf>, backend: BackendKind, stat_id: impl Into<String>, flags: OpenFlags) -> Self {
        Self {
            id: EndpointId::next(),
            uri: uri.into(),
            backend,
            stat_id: stat_id.into(),
            flags,
            file: AsyncMutex::new(None),
            cached_size: AtomicU64::new(0),
            size_known: AtomicBool::new(false),
            locks: SyncMutex::new(RangeLockTable::new()),
            waiters: SyncMutex::new(HashMap::new()),
            bandwidth: RwLock::new(None),
            moving: AtomicBool::new(false),
            flush_in_flight: AtomicBool::new(false),
            injection: SyncMutex::new(InjectionState::default()),
            request_pool: SyncMutex::new(RequestPool::new(REQUEST_POOL_CAPACITY)),
        }
    }

    /// Hands out a native request handle, reusing a released one where
    /// possible.
    pub fn acquire_native_handle(&self) -> u64 {
        self.request_pool.lock().acquire()
    }

    /// Returns a native request handle to this endpoint's free list.
    pub fn release_native_handle(&self, handle: u64) {
        self.request_pool.lock().release(handle);
    }

    pub fn id(&self) -> EndpointId {
        self.id
    }

    pub fn uri(&self) -> &Path {
        &self.uri
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    pub fn stat_id(&self) -> &str {
        &self.stat_id
    }

    pub fn is_moving(&self) -> bool {
        self.moving.load(Ordering::Acquire)
    }

    pub fn set_moving(&self, moving: bool) {
        self.moving.store(moving, Ordering::Release);
    }

    pub fn has_outstanding_flush(&self) -> bool {
        self.flush_in_flight.load(Ordering::Acquire)
    }

    /// Claims the at-most-one-outstanding-flush slot; `false` means one is
    /// already in flight and this submission should be deferred.
    pub fn try_begin_flush(&self) -> bool {
        self.flush_in_flight.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_ok()
    }

    pub fn end_flush(&self) {
        self.flush_in_flight.store(false, Ordering::Release);
    }

    /// Opens (or reopens) the backing file. The non-buffered-to-buffered
    /// fallback-retry of `createForFile` lives one level
    /// up, in `EndpointClass`, since it means constructing a second endpoint
    /// with a different backend rather than retrying this open in place.
    pub async fn open(&self) -> Result<(), CompletionError> {
        let mut opts = OpenOptions::new();
        opts.read(true).write(!self.flags.read_only).create(!self.flags.read_only);
        let file = opts.open(&self.uri).await?;
        let metadata = file.metadata().await?;
        self.cached_size.store(metadata.len(), Ordering::Release);
        self.size_known.store(true, Ordering::Release);
        *self.file.lock().await = Some(file);
        debug!(endpoint = %self.id, uri = %self.uri.display(), ?self.backend, "endpoint opened");
        Ok(())
    }

    pub fn set_bandwidth_manager(&self, manager: Option<Arc<BandwidthManager>>) {
        *self.bandwidth.write() = manager;
    }

    pub async fn get_size(&self) -> Result<u64, CompletionError> {
        if self.size_known.load(Ordering::Acquire) {
            return Ok(self.cached_size.load(Ordering::Acquire));
        }
        let guard = self.file.lock().await;
        let file = guard.as_ref().ok_or_else(|| CompletionError::bad_state("endpoint not open"))?;
        let metadata = file.metadata().await?;
        self.cached_size.store(metadata.len(), Ordering::Release);
        self.size_known.store(true, Ordering::Release);
        Ok(metadata.len())
    }

    pub async fn set_size(&self, new_size: u64) -> Result<(), CompletionError> {
        let guard = self.file.lock().await;
        let file = guard.as_ref().ok_or_else(|| CompletionError::bad_state("endpoint not open"))?;
        file.set_len(new_size).await?;
        self.cached_size.store(new_size, Ordering::Release);
        self.size_known.store(true, Ordering::Release);
        Ok(())
    }

    fn record_range_lock_waiter(&self, waiter: SubRequestId) -> Arc<Notify> {
        self.waiters.lock().entry(waiter).or_insert_with(|| Arc::new(Notify::new())).clone()
    }

    /// Serializes overlapping sub-requests against this endpoint's range
    /// lock table, parking on a [`Notify`] while conflicted.
    async fn acquire_range_lock(&self, range: ByteRange, mode: LockMode, waiter: SubRequestId) -> RangeLockId {
        loop {
            let attempt = self.locks.lock().try_lock(range, mode, waiter);
            match attempt {
                async_completion_domain::services::LockAttempt::Granted(id) => return id,
                async_completion_domain::services::LockAttempt::Conflicted(_) => {
                    let notify = self.record_range_lock_waiter(waiter);
                    notify.notified().await;
                }
            }
        }
    }

    fn release_range_lock(&self, id: RangeLockId) {
        if let Some(drained) = self.locks.lock().unlock(id) {
            let mut waiters = self.waiters.lock();
            for sub_request in drained {
                if let Some(notify) = waiters.remove(&sub_request) {
                    notify.notify_one();
                }
            }
        }
    }

    fn injected_error(&self, kind: async_completion_domain::value_objects::TransferKind) -> Option<CompletionStatus> {
        self.injection.lock().errors.get(&kind).copied()
    }

    async fn injected_delay(&self, kind: async_completion_domain::value_objects::TransferKind) -> Option<Duration> {
        let mut state = self.injection.lock();
        let key = if state.delays.contains_key(&Some(kind)) { Some(kind) } else if state.delays.contains_key(&None) { None } else { return None };
        let (base, jitter, remaining) = *state.delays.get(&key).unwrap();

        match remaining {
            Some(0) => {
                state.delays.remove(&key);
                return None;
            }
            Some(n) => {
                state.delays.insert(key, (base, jitter, Some(n - 1)));
            }
            None => {}
        }

        Some(if jitter.is_zero() {
            base
        } else {
            state.jitter_seed = state.jitter_seed.wrapping_mul(6364136223846793005).wrapping_add(1);
            let spread = state.jitter_seed % (jitter.as_millis() as u64 + 1);
            base + Duration::from_millis(spread)
        })
    }

    pub fn inject_error(&self, kind: async_completion_domain::value_objects::TransferKind, status: CompletionStatus) {
        self.injection.lock().errors.insert(kind, status);
    }

    pub fn clear_error_injection(&self) {
        self.injection.lock().errors.clear();
    }

    /// `requests` caps how many matching operations the delay applies to
    /// before auto-clearing; `None` means "until explicitly cleared".
    pub fn inject_delay(&self, kind: DelayKind, delay: Duration, jitter: Duration, requests: Option<u32>) {
        self.injection.lock().delays.insert(kind, (delay, jitter, requests));
    }

    pub fn clear_delay_injection(&self) {
        self.injection.lock().delays.clear();
    }

    /// Reads `length` bytes at `offset`, bouncing through an aligned window
    /// first if this is a non-buffered backend and the request is misaligned.
    pub async fn read(&self, waiter: SubRequestId, offset: u64, length: u64) -> Result<Vec<u8>, CompletionError> {
        use async_completion_domain::value_objects::TransferKind;

        if let Some(delay) = self.injected_delay(TransferKind::Read).await {
            tokio::time::sleep(delay).await;
        }
        if let Some(status) = self.injected_error(TransferKind::Read) {
            return Err(status_to_error(status));
        }

        let (io_range, slice) = if needs_bounce(self.backend, offset, length) {
            let (aligned, slice_offset) = bounce_window(offset, length, BackendKind::ALIGNMENT)?;
            (aligned, Some((slice_offset, length)))
        } else {
            (ByteRange::new(offset, length)?, None)
        };

        let lock_id = self.acquire_range_lock(io_range, LockMode::Read, waiter).await;
        let result = self.read_exact_range(io_range).await;
        self.release_range_lock(lock_id);

        let buf = result?;
        match slice {
            Some((slice_offset, slice_len)) => {
                let start = slice_offset as usize;
                let end = start + slice_len as usize;
                Ok(buf.get(start..end).ok_or_else(|| CompletionError::internal("bounce slice out of range"))?.to_vec())
            }
            None => Ok(buf),
        }
    }

    async fn read_exact_range(&self, range: ByteRange) -> Result<Vec<u8>, CompletionError> {
        let mut guard = self.file.lock().await;
        let file = guard.as_mut().ok_or_else(|| CompletionError::bad_state("endpoint not open"))?;
        file.seek(SeekFrom::Start(range.first())).await?;
        let mut buf = vec![0u8; range.len() as usize];
        file.read_exact(&mut buf).await?;
        Ok(buf)
    }

    /// Writes `data` at `offset`, consuming bandwidth tokens if a manager is
    /// attached, growing the file first if the write extends past EOF, and
    /// bouncing through a read-modify-write of the aligned window if this is
    /// a non-buffered backend and the request is misaligned.
    pub async fn write(&self, waiter: SubRequestId, offset: u64, data: &[u8]) -> Result<(), CompletionError> {
        use async_completion_domain::value_objects::TransferKind;

        if let Some(delay) = self.injected_delay(TransferKind::Write).await {
            tokio::time::sleep(delay).await;
        }
        if let Some(status) = self.injected_error(TransferKind::Write) {
            return Err(status_to_error(status));
        }

        self.throttle(data.len() as u64).await;

        let end = offset
            .checked_add(data.len() as u64)
            .ok_or_else(|| CompletionError::bad_argument("write range overflows u64"))?;
        if end > self.get_size().await? {
            self.set_size(end).await?;
        }

        if needs_bounce(self.backend, offset, data.len() as u64) {
            let (aligned, slice_offset) = bounce_window(offset, data.len() as u64, BackendKind::ALIGNMENT)?;
            let lock_id = self.acquire_range_lock(aligned, LockMode::Write, waiter).await;
            let result = self.bounce_write(aligned, slice_offset as usize, data).await;
            self.release_range_lock(lock_id);
            result
        } else {
            let range = ByteRange::new(offset, data.len() as u64)?;
            let lock_id = self.acquire_range_lock(range, LockMode::Write, waiter).await;
            let result = self.write_exact_range(offset, data).await;
            self.release_range_lock(lock_id);
            result
        }
    }

    async fn bounce_write(&self, aligned: ByteRange, slice_offset: usize, data: &[u8]) -> Result<(), CompletionError> {
        let mut window = self.read_exact_range(aligned).await?;
        window[slice_offset..slice_offset + data.len()].copy_from_slice(data);
        self.write_exact_range(aligned.first(), &window).await
    }

    async fn write_exact_range(&self, offset: u64, data: &[u8]) -> Result<(), CompletionError> {
        let mut guard = self.file.lock().await;
        let file = guard.as_mut().ok_or_else(|| CompletionError::bad_state("endpoint not open"))?;
        file.seek(SeekFrom::Start(offset)).await?;
        file.write_all(data).await?;
        Ok(())
    }

    async fn throttle(&self, n_bytes: u64) {
        loop {
            let manager = match self.bandwidth.read().clone() {
                Some(manager) => manager,
                None => return,
            };
            match manager.try_consume(n_bytes) {
                ConsumeOutcome::Allowed => return,
                ConsumeOutcome::Denied { retry_after_ms } => {
                    trace!(endpoint = %self.id, retry_after_ms, "write throttled");
                    tokio::time::sleep(Duration::from_millis(retry_after_ms)).await;
                }
            }
        }
    }

    pub async fn flush(&self) -> Result<(), CompletionError> {
        use async_completion_domain::value_objects::TransferKind;

        if let Some(delay) = self.injected_delay(TransferKind::Flush).await {
            tokio::time::sleep(delay).await;
        }
        if let Some(status) = self.injected_error(TransferKind::Flush) {
            return Err(status_to_error(status));
        }
        let mut guard = self.file.lock().await;
        let file = guard.as_mut().ok_or_else(|| CompletionError::bad_state("endpoint not open"))?;
        file.flush().await?;
        file.sync_all().await?;
        Ok(())
    }

    pub async fn close(&self) -> Result<(), CompletionError> {
        if !self.locks.lock().is_empty() {
            return Err(CompletionError::busy(format!("endpoint {} still has outstanding range locks", self.id)));
        }
        *self.file.lock().await = None;
        warn!(endpoint = %self.id, "endpoint closed");
        Ok(())
    }
}

fn status_to_error(status: CompletionStatus) -> CompletionError {
    use async_completion_domain::error::FatalIoKind;
    match status {
        CompletionStatus::Success => CompletionError::internal("injected success is not an error"),
        CompletionStatus::Eof => CompletionError::Eof,
        CompletionStatus::NotSupported => CompletionError::not_supported("injected"),
        CompletionStatus::Io => CompletionError::io("injected"),
        CompletionStatus::ResourceExhausted => CompletionError::ResourceExhausted("injected".into()),
        CompletionStatus::Fatal(kind) => CompletionError::fatal(kind, "injected"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_completion_domain::value_objects::TransferKind;
    use tempfile::NamedTempFile;

    fn buffered_endpoint(path: &Path) -> Endpoint {
        Endpoint::new(path, BackendKind::Buffered, "test", OpenFlags::read_write())
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let tmp = NamedTempFile::new().unwrap();
        let endpoint = buffered_endpoint(tmp.path());
        endpoint.open().await.unwrap();
        endpoint.write(SubRequestId::next(), 0, b"hello world").await.unwrap();
        let back = endpoint.read(SubRequestId::next(), 0, 11).await.unwrap();
        assert_eq!(&back, b"hello world");
    }

    #[tokio::test]
    async fn write_past_eof_grows_file() {
        let tmp = NamedTempFile::new().unwrap();
        let endpoint = buffered_endpoint(tmp.path());
        endpoint.open().await.unwrap();
        endpoint.write(SubRequestId::next(), 100, b"tail").await.unwrap();
        assert_eq!(endpoint.get_size().await.unwrap(), 104);
    }

    #[tokio::test]
    async fn injected_error_is_returned_without_touching_the_file() {
        let tmp = NamedTempFile::new().unwrap();
        let endpoint = buffered_endpoint(tmp.path());
        endpoint.open().await.unwrap();
        endpoint.inject_error(TransferKind::Read, CompletionStatus::Io);
        let result = endpoint.read(SubRequestId::next(), 0, 4).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn close_fails_while_range_locks_outstanding() {
        let tmp = NamedTempFile::new().unwrap();
        let endpoint = buffered_endpoint(tmp.path());
        endpoint.open().await.unwrap();
        let id = endpoint.locks.lock().try_lock(
            ByteRange::new(0, 10).unwrap(),
            LockMode::Write,
            SubRequestId::next(),
        );
        assert!(matches!(id, async_completion_domain::services::LockAttempt::Granted(_)));
        assert!(endpoint.close().await.is_err());
    }
}
