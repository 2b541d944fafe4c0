// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Statistics Surface
//!
//! Per-endpoint statistics, registered under
//! `/PDM/AsyncCompletion/File/<basename>/<statId>/...` as `prometheus`
//! metrics rather than a bespoke registry: the 41-bucket latency histogram
//! (one decade each of ns/us/ms/s plus an overflow bucket, approximated here
//! as a base-10 exponential histogram so the bucket edges line up with
//! [`async_completion_domain::value_objects::bucket_index`]), a 12-bucket
//! transfer-size histogram, and unaligned-to-512/4K/8K counters. The
//! "rolling 1-second IOPS" figure is exposed as a plain counter, turned into
//! a rate by the scraping side rather than carried as an in-process rolling
//! window.

use std::sync::Arc;
use std::time::Duration;

use async_completion_domain::CompletionError;
use prometheus::{exponential_buckets, HistogramVec, IntCounterVec, Opts, Registry};

const NAMESPACE: &str = "async_completion";

#[derive(Clone)]
pub struct Telemetry {
    registry: Arc<Registry>,
    latency_seconds: HistogramVec,
    transfer_bytes: HistogramVec,
    unaligned_total: IntCounterVec,
    ops_total: IntCounterVec,
}

impl Telemetry {
    pub fn new() -> Result<Self, CompletionError> {
        let registry = Registry::new();
        let metrics_err = |what: &str, e: prometheus::Error| CompletionError::internal(format!("failed to {what}: {e}"));

        let latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new("task_latency_seconds", "End-to-end task completion latency")
                .namespace(NAMESPACE)
                .buckets(exponential_buckets(1e-9, 10.0, 41).map_err(|e| metrics_err("build latency buckets", e))?),
            &["endpoint"],
        )
        .map_err(|e| metrics_err("create task_latency_seconds", e))?;

        let transfer_bytes = HistogramVec::new(
            prometheus::HistogramOpts::new("transfer_size_bytes", "Per-sub-request transfer size")
                .namespace(NAMESPACE)
                .buckets(exponential_buckets(512.0, 2.0, 12).map_err(|e| metrics_err("build transfer-size buckets", e))?),
            &["endpoint"],
        )
        .map_err(|e| metrics_err("create transfer_size_bytes", e))?;

        let unaligned_total = IntCounterVec::new(
            Opts::new("unaligned_requests_total", "Requests misaligned to the given boundary").namespace(NAMESPACE),
            &["endpoint", "boundary"],
        )
        .map_err(|e| metrics_err("create unaligned_requests_total", e))?;

        let ops_total = IntCounterVec::new(
            Opts::new("operations_total", "Completed operations, for rate()-derived IOPS").namespace(NAMESPACE),
            &["endpoint"],
        )
        .map_err(|e| metrics_err("create operations_total", e))?;

        registry.register(Box::new(latency_seconds.clone())).map_err(|e| metrics_err("register task_latency_seconds", e))?;
        registry.register(Box::new(transfer_bytes.clone())).map_err(|e| metrics_err("register transfer_size_bytes", e))?;
        registry.register(Box::new(unaligned_total.clone())).map_err(|e| metrics_err("register unaligned_requests_total", e))?;
        registry.register(Box::new(ops_total.clone())).map_err(|e| metrics_err("register operations_total", e))?;

        Ok(Self { registry: Arc::new(registry), latency_seconds, transfer_bytes, unaligned_total, ops_total })
    }

    pub fn record_completion(&self, endpoint_stat_id: &str, elapsed: Duration, bytes_transferred: u64) {
        self.latency_seconds.with_label_values(&[endpoint_stat_id]).observe(elapsed.as_secs_f64());
        self.transfer_bytes.with_label_values(&[endpoint_stat_id]).observe(bytes_transferred as f64);
        self.ops_total.with_label_values(&[endpoint_stat_id]).inc();

        for (boundary, label) in [(512u64, "512"), (4096, "4k"), (8192, "8k")] {
            if bytes_transferred % boundary != 0 {
                self.unaligned_total.with_label_values(&[endpoint_stat_id, label]).inc();
            }
        }
    }

    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn render(&self) -> Result<String, CompletionError> {
        let encoder = prometheus::TextEncoder::new();
        encoder
            .encode_to_string(&self.registry.gather())
            .map_err(|e| CompletionError::internal(format!("failed to encode metrics: {e}")))
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new().expect("failed to build default Telemetry")
    }
}
