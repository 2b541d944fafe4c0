//! Property tests over the crate's pure arithmetic: byte-range overlap,
//! bandwidth ramp-up clamping, latency bucketing, and bounce-window
//! computation.

use async_completion_domain::entities::BandwidthManager;
use async_completion_domain::services::alignment_policy::bounce_window;
use async_completion_domain::value_objects::{bucket_index, ByteRange, LATENCY_BUCKET_COUNT};
use proptest::prelude::*;

proptest! {
    #[test]
    fn byte_range_overlaps_itself(offset in 0u64..1_000_000, length in 1u64..65_536) {
        let range = ByteRange::new(offset, length).unwrap();
        prop_assert!(range.overlaps(&range));
    }

    #[test]
    fn byte_range_overlap_is_symmetric(
        a_offset in 0u64..1_000_000, a_length in 1u64..65_536,
        b_offset in 0u64..1_000_000, b_length in 1u64..65_536,
    ) {
        let a = ByteRange::new(a_offset, a_length).unwrap();
        let b = ByteRange::new(b_offset, b_length).unwrap();
        prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
    }

    #[test]
    fn byte_range_disjoint_ranges_never_overlap(offset in 0u64..1_000_000, length in 1u64..65_536, gap in 1u64..65_536) {
        let a = ByteRange::new(offset, length).unwrap();
        let b = ByteRange::new(offset + length - 1 + gap, length).unwrap();
        prop_assert!(!a.overlaps(&b));
    }

    #[test]
    fn latency_bucket_index_is_always_in_range(nanos in 0u64..200_000_000_000u64) {
        let idx = bucket_index(std::time::Duration::from_nanos(nanos));
        prop_assert!(idx < LATENCY_BUCKET_COUNT);
    }

    #[test]
    fn latency_bucket_index_is_monotonic_non_decreasing(a_nanos in 0u64..200_000_000_000u64, delta in 0u64..200_000_000_000u64) {
        let b_nanos = a_nanos.saturating_add(delta);
        let a_idx = bucket_index(std::time::Duration::from_nanos(a_nanos));
        let b_idx = bucket_index(std::time::Duration::from_nanos(b_nanos));
        prop_assert!(b_idx >= a_idx);
    }

    #[test]
    fn bandwidth_ramp_up_start_never_exceeds_max(max in 1u64..10_000_000, start in 0u64..10_000_000, step in 0u64..1_000_000) {
        let mgr = BandwidthManager::new("grp", max, start, step);
        prop_assert!(mgr.available() <= max as i64);
        prop_assert!(mgr.available() >= 0);
    }

    #[test]
    fn bandwidth_full_budget_is_always_consumable_once(max in 1u64..10_000_000, start in 1u64..10_000_000, step in 0u64..1_000_000) {
        let start = start.min(max);
        let mgr = BandwidthManager::new("grp", max, start, step);
        prop_assert_eq!(mgr.try_consume(start), async_completion_domain::entities::ConsumeOutcome::Allowed);
    }

    #[test]
    fn bounce_window_covers_the_requested_range(offset in 0u64..1_000_000, length in 1u64..65_536) {
        let alignment = 512u64;
        let (window, slice_offset) = bounce_window(offset, length, alignment).unwrap();
        prop_assert!(window.first() <= offset);
        prop_assert!(window.last() >= offset + length - 1);
        prop_assert_eq!(slice_offset, offset - window.first());
    }

    #[test]
    fn bounce_window_is_itself_aligned(offset in 0u64..1_000_000, length in 1u64..65_536) {
        let alignment = 512u64;
        let (window, _) = bounce_window(offset, length, alignment).unwrap();
        prop_assert_eq!(window.first() % alignment, 0);
        prop_assert_eq!(window.len() % alignment, 0);
    }
}
