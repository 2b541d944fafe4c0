// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Bandwidth Manager
//!
//! A named token bucket shared by every endpoint that references it. Budget
//! refresh is lock-free and bounded to once per second per manager; ramp-up
//! protects start-of-day traffic from bursting past the configured maximum.
//!
//! This is pure, allocation-free arithmetic over atomics and a monotonic
//! clock — no I/O — so it lives in the domain layer and is fully unit
//! testable without a runtime.

use std::sync::atomic::{AtomicI64, AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// The outcome of a [`BandwidthManager::try_consume`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeOutcome {
    Allowed,
    /// Caller should retry after this many milliseconds.
    Denied { retry_after_ms: u64 },
}

/// A named, shared rate limiter.
#[derive(Debug)]
pub struct BandwidthManager {
    name: String,
    max_bytes_per_sec: AtomicU64,
    start_bytes_per_sec: AtomicU64,
    step_bytes_per_sec: AtomicU64,
    available: AtomicI64,
    last_refresh: RelativeClock,
    ref_count: AtomicU32,
}

/// Wraps a monotonic reference point so `last_refresh` can be stored as an
/// atomic millisecond offset rather than a non-atomic `Instant`.
#[derive(Debug)]
struct RelativeClock {
    epoch: Instant,
    millis_since_epoch: AtomicU64,
}

impl RelativeClock {
    fn new() -> Self {
        Self { epoch: Instant::now(), millis_since_epoch: AtomicU64::new(0) }
    }

    fn now_millis(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn load(&self) -> u64 {
        self.millis_since_epoch.load(Ordering::Acquire)
    }

    fn compare_exchange(&self, current: u64, new: u64) -> Result<u64, u64> {
        self.millis_since_epoch
            .compare_exchange(current, new, Ordering::AcqRel, Ordering::Acquire)
    }
}

impl BandwidthManager {
    pub fn new(name: impl Into<String>, max_bytes_per_sec: u64, start_bytes_per_sec: u64, step_bytes_per_sec: u64) -> Self {
        let start = start_bytes_per_sec.min(max_bytes_per_sec);
        Self {
            name: name.into(),
            max_bytes_per_sec: AtomicU64::new(max_bytes_per_sec),
            start_bytes_per_sec: AtomicU64::new(start),
            step_bytes_per_sec: AtomicU64::new(step_bytes_per_sec),
            available: AtomicI64::new(start as i64),
            last_refresh: RelativeClock::new(),
            ref_count: AtomicU32::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn acquire(&self) {
        self.ref_count.fetch_add(1, Ordering::AcqRel);
    }

    /// Returns the ref count after release.
    pub fn release(&self) -> u32 {
        self.ref_count.fetch_sub(1, Ordering::AcqRel) - 1
    }

    pub fn max_bytes_per_sec(&self) -> u64 {
        self.max_bytes_per_sec.load(Ordering::Acquire)
    }

    /// Updates the cap and resets the ramp-up starting value so the new
    /// limit takes effect immediately (`setBandwidthMax`).
    pub fn set_max(&self, new_max: u64) {
        self.max_bytes_per_sec.store(new_max, Ordering::Release);
        self.start_bytes_per_sec.store(new_max, Ordering::Release);
        self.available.store(new_max as i64, Ordering::Release);
    }

    /// Atomically subtract-then-refresh token bucket consumption: a single
    /// atomic subtract fast path, with a lock-free, once-per-second refresh
    /// (ramp-up + credit of any negative remainder) on the slow
    /// path.
    pub fn try_consume(&self, n_bytes: u64) -> ConsumeOutcome {
        let after = self.available.fetch_sub(n_bytes as i64, Ordering::AcqRel) - n_bytes as i64;
        if after >= 0 {
            return ConsumeOutcome::Allowed;
        }

        let now = self.last_refresh.now_millis();
        let last = self.last_refresh.load();
        let elapsed = now.saturating_sub(last);

        if elapsed < 1000 {
            // Revert the speculative subtraction; caller must wait out the
            // remainder of the current second.
            self.available.fetch_add(n_bytes as i64, Ordering::AcqRel);
            return ConsumeOutcome::Denied { retry_after_ms: 1000 - elapsed };
        }

        if self.last_refresh.compare_exchange(last, now).is_err() {
            // Someone else refreshed concurrently; let the caller retry the
            // fast path rather than double-apply ramp-up.
            self.available.fetch_add(n_bytes as i64, Ordering::AcqRel);
            return ConsumeOutcome::Denied { retry_after_ms: 0 };
        }

        let max = self.max_bytes_per_sec.load(Ordering::Acquire);
        let mut start = self.start_bytes_per_sec.load(Ordering::Acquire);
        if start < max {
            start = max.min(start + self.step_bytes_per_sec.load(Ordering::Acquire));
            self.start_bytes_per_sec.store(start, Ordering::Release);
        }

        self.available.store(start as i64 - n_bytes as i64, Ordering::Release);
        ConsumeOutcome::Allowed
    }

    pub fn available(&self) -> i64 {
        self.available.load(Ordering::Acquire)
    }
}

/// A bandwidth manager that is always permissive. Assigning `None` as an
/// endpoint's bandwidth manager means every transfer is allowed
/// immediately.
pub fn unthrottled() -> Option<Duration> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn allows_until_budget_exhausted() {
        let mgr = BandwidthManager::new("grp", 1_000_000, 1_000_000, 0);
        for _ in 0..4 {
            assert_eq!(mgr.try_consume(256 * 1024), ConsumeOutcome::Allowed);
        }
        // fifth 256KB chunk would exceed the 1MB/s budget
        match mgr.try_consume(256 * 1024) {
            ConsumeOutcome::Denied { retry_after_ms } => assert!(retry_after_ms > 0),
            ConsumeOutcome::Allowed => panic!("expected denial once budget is exhausted"),
        }
    }

    #[test]
    fn refreshes_after_one_second() {
        let mgr = BandwidthManager::new("grp", 100, 100, 0);
        assert_eq!(mgr.try_consume(100), ConsumeOutcome::Allowed);
        assert!(matches!(mgr.try_consume(1), ConsumeOutcome::Denied { .. }));
        sleep(Duration::from_millis(1050));
        assert_eq!(mgr.try_consume(50), ConsumeOutcome::Allowed);
    }

    #[test]
    fn ramp_up_increments_start_each_refresh() {
        let mgr = BandwidthManager::new("grp", 1000, 100, 50);
        assert_eq!(mgr.try_consume(100), ConsumeOutcome::Allowed);
        assert!(matches!(mgr.try_consume(1), ConsumeOutcome::Denied { .. }));
        sleep(Duration::from_millis(1050));
        // start ramps from 100 -> 150, so 150 bytes should now be allowed
        assert_eq!(mgr.try_consume(150), ConsumeOutcome::Allowed);
    }

    #[test]
    fn null_manager_is_unthrottled() {
        assert!(unthrottled().is_none());
    }
}
