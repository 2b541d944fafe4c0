//! End-to-end scenarios run against a real `Subsystem` over a temp-file
//! backed endpoint.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_completion::infrastructure::config::BandwidthGroupSettings;
use async_completion::infrastructure::Settings;
use async_completion::Subsystem;
use async_completion_domain::entities::CompletionEvent;
use async_completion_domain::value_objects::{BackendKind, CompletionStatus, OpenFlags, TransferKind};
use tempfile::NamedTempFile;

fn noop_callback() -> Arc<dyn Fn(CompletionEvent) + Send + Sync> {
    Arc::new(|_event: CompletionEvent| {})
}

/// Manager registration is processed asynchronously off the submitting
/// thread; give the mailbox a moment to drain before asserting on it.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::test]
async fn aligned_single_segment_write_round_trips() {
    let mut subsystem = Subsystem::new(Settings::default()).unwrap();
    let tmp = NamedTempFile::new().unwrap();
    let endpoint = subsystem.create_endpoint_for_file(tmp.path(), BackendKind::Buffered, OpenFlags::read_write()).await.unwrap();
    let template = subsystem.create_device_template(1, noop_callback());

    let (_task, rx) = subsystem.write(endpoint.clone(), template, 0, b"0123456789".to_vec(), None).unwrap();
    rx.await.unwrap().unwrap();

    let (_task, rx) = subsystem.read(endpoint.clone(), template, 0, 10, None).unwrap();
    let data = rx.await.unwrap().unwrap().unwrap();
    assert_eq!(data, b"0123456789".to_vec());

    subsystem.shutdown();
}

#[tokio::test]
async fn misaligned_small_write_bounces_through_an_aligned_window() {
    let mut subsystem = Subsystem::new(Settings::default()).unwrap();
    let tmp = NamedTempFile::new().unwrap();
    let endpoint = subsystem.create_endpoint_for_file(tmp.path(), BackendKind::NonBuffered, OpenFlags::read_write()).await.unwrap();
    let template = subsystem.create_device_template(1, noop_callback());

    // Neither offset (100) nor length (50) is a multiple of the 512-byte
    // alignment this backend requires, forcing a bounce-buffered write.
    let (_task, rx) = subsystem.write(endpoint.clone(), template, 100, vec![0xAB; 50], None).unwrap();
    rx.await.unwrap().unwrap();

    let (_task, rx) = subsystem.read(endpoint.clone(), template, 100, 50, None).unwrap();
    let data = rx.await.unwrap().unwrap().unwrap();
    assert_eq!(data, vec![0xAB; 50]);

    subsystem.shutdown();
}

#[tokio::test]
async fn overlapping_writes_are_serialized_not_corrupted() {
    let mut subsystem = Subsystem::new(Settings::default()).unwrap();
    let tmp = NamedTempFile::new().unwrap();
    let endpoint = subsystem.create_endpoint_for_file(tmp.path(), BackendKind::Buffered, OpenFlags::read_write()).await.unwrap();
    let template = subsystem.create_device_template(1, noop_callback());

    // Two writers targeting the same 16-byte range with different fill
    // bytes: whichever runs last must win cleanly, never an interleaved mix.
    let (_task_a, rx_a) = subsystem.write(endpoint.clone(), template, 0, vec![0xAA; 16], None).unwrap();
    let (_task_b, rx_b) = subsystem.write(endpoint.clone(), template, 0, vec![0xBB; 16], None).unwrap();
    rx_a.await.unwrap().unwrap();
    rx_b.await.unwrap().unwrap();

    let (_task, rx) = subsystem.read(endpoint.clone(), template, 0, 16, None).unwrap();
    let data = rx.await.unwrap().unwrap().unwrap();
    assert!(data == vec![0xAA; 16] || data == vec![0xBB; 16], "write must not interleave: {data:?}");

    subsystem.shutdown();
}

#[tokio::test]
async fn bandwidth_throttle_ramps_up_from_a_lower_start() {
    let mut bw_groups = HashMap::new();
    bw_groups.insert("throttled".to_string(), BandwidthGroupSettings { max: 1_000_000, start: Some(4_096), step: Some(100_000) });
    let settings = Settings { bw_groups, ..Settings::default() };

    let mut subsystem = Subsystem::new(settings).unwrap();
    let tmp = NamedTempFile::new().unwrap();
    let endpoint = subsystem.create_endpoint_for_file(tmp.path(), BackendKind::Buffered, OpenFlags::read_write()).await.unwrap();
    let template = subsystem.create_device_template(1, noop_callback());
    subsystem.set_bandwidth_manager(&endpoint, "throttled").unwrap();

    // Larger than the 4096 byte/sec ramp-up start: must throttle and retry
    // rather than fail, eventually completing once the bucket refreshes.
    let (_task, rx) = subsystem.write(endpoint.clone(), template, 0, vec![0u8; 8_192], None).unwrap();
    rx.await.unwrap().unwrap();

    subsystem.shutdown();
}

#[tokio::test]
async fn non_fatal_error_migrates_the_endpoint_to_the_failsafe_manager() {
    let mut subsystem = Subsystem::new(Settings::default()).unwrap();
    let tmp = NamedTempFile::new().unwrap();
    let endpoint = subsystem.create_endpoint_for_file(tmp.path(), BackendKind::Buffered, OpenFlags::read_write()).await.unwrap();
    let template = subsystem.create_device_template(1, noop_callback());
    settle().await;
    assert!(!subsystem.is_on_failsafe_manager(endpoint.id()));

    endpoint.inject_error(TransferKind::Write, CompletionStatus::Io);
    let (_task, rx) = subsystem.write(endpoint.clone(), template, 0, b"retry me".to_vec(), None).unwrap();
    assert!(rx.await.unwrap().is_err());
    settle().await;

    assert!(subsystem.is_on_failsafe_manager(endpoint.id()));

    // Once migrated, a clean write submitted through the failsafe queue
    // still completes.
    endpoint.clear_error_injection();
    let (_task, rx) = subsystem.write(endpoint.clone(), template, 0, b"recovered".to_vec(), None).unwrap();
    rx.await.unwrap().unwrap();

    subsystem.shutdown();
}

#[tokio::test]
async fn native_handle_pool_grows_past_its_cache_cap_under_saturation() {
    let mut subsystem = Subsystem::new(Settings::default()).unwrap();
    let tmp = NamedTempFile::new().unwrap();
    let endpoint = subsystem.create_endpoint_for_file(tmp.path(), BackendKind::Buffered, OpenFlags::read_write()).await.unwrap();
    let template = subsystem.create_device_template(1, noop_callback());

    // More concurrent writes than the endpoint's 64-entry native handle free
    // list: saturation mints fresh handles instead of blocking.
    let mut receivers = Vec::new();
    for i in 0..100u64 {
        let (_task, rx) = subsystem.write(endpoint.clone(), template, i * 4096, vec![i as u8; 4096], None).unwrap();
        receivers.push(rx);
    }
    for rx in receivers {
        rx.await.unwrap().unwrap();
    }

    subsystem.shutdown();
}

#[tokio::test]
async fn normal_manager_grows_its_concurrency_cap_under_saturation() {
    let mut subsystem = Subsystem::new(Settings::default()).unwrap();
    let tmp = NamedTempFile::new().unwrap();
    let endpoint = subsystem.create_endpoint_for_file(tmp.path(), BackendKind::Buffered, OpenFlags::read_write()).await.unwrap();
    let template = subsystem.create_device_template(1, noop_callback());

    let initial_max = subsystem.normal_manager_active_max();
    assert_eq!(initial_max, 64);

    // Twice cRequestsActiveMax worth of independent writes: the first batch
    // saturates the cap and forces a GROWING transition before the second
    // batch can even be accepted, so every one of them must still complete.
    let mut receivers = Vec::new();
    for i in 0..(initial_max * 2) {
        let (_task, rx) = subsystem.write(endpoint.clone(), template, i * 4096, vec![i as u8; 4096], None).unwrap();
        receivers.push(rx);
    }
    for rx in receivers {
        rx.await.unwrap().unwrap();
    }

    assert!(subsystem.normal_manager_active_max() > initial_max, "cap must have doubled under saturation");

    subsystem.shutdown();
}

#[tokio::test]
async fn set_size_and_get_size_round_trip() {
    let mut subsystem = Subsystem::new(Settings::default()).unwrap();
    let tmp = NamedTempFile::new().unwrap();
    let endpoint = subsystem.create_endpoint_for_file(tmp.path(), BackendKind::Buffered, OpenFlags::read_write()).await.unwrap();

    endpoint.set_size(4096).await.unwrap();
    assert_eq!(endpoint.get_size().await.unwrap(), 4096);

    subsystem.shutdown();
}

#[tokio::test]
async fn close_then_reopen_recovers_the_known_size() {
    let mut subsystem = Subsystem::new(Settings::default()).unwrap();
    let tmp = NamedTempFile::new().unwrap();
    let endpoint = subsystem.create_endpoint_for_file(tmp.path(), BackendKind::Buffered, OpenFlags::read_write()).await.unwrap();
    endpoint.set_size(2048).await.unwrap();

    subsystem.close_endpoint(endpoint.id()).await.unwrap();
    let reopened = subsystem.create_endpoint_for_file(tmp.path(), BackendKind::Buffered, OpenFlags::read_write()).await.unwrap();
    assert_eq!(reopened.get_size().await.unwrap(), 2048);

    subsystem.shutdown();
}
