//! Property tests for the curve and bucketing invariants.

mod common;

use common::*;
use marketlens::domain::bucket::PriceBuckets;
use marketlens::domain::concentration::{gini, lorenz, top_share_for_volume};
use marketlens::domain::market::Side;
use marketlens::domain::monte_carlo::percentile;
use proptest::prelude::*;

proptest! {
    #[test]
    fn lorenz_curve_is_monotonic_and_closes(
        volumes in prop::collection::vec(1u32..100_000, 1..200)
    ) {
        let volumes: Vec<f64> = volumes.into_iter().map(f64::from).collect();
        let curve = lorenz(&volumes).unwrap();
        for window in curve.pct_volume.windows(2) {
            prop_assert!(window[1] >= window[0] - 1e-9);
        }
        prop_assert!((curve.pct_volume.last().unwrap() - 100.0).abs() < 1e-6);
        prop_assert!((curve.pct_units.last().unwrap() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn gini_stays_in_unit_interval(
        volumes in prop::collection::vec(1u32..100_000, 1..200)
    ) {
        let volumes: Vec<f64> = volumes.into_iter().map(f64::from).collect();
        let g = gini(&volumes).unwrap();
        prop_assert!((-1e-9..=1.0).contains(&g), "gini {g} out of bounds");
    }

    #[test]
    fn gini_is_zero_for_equal_sizes(size in 1u32..10_000, count in 1usize..100) {
        let volumes = vec![size as f64; count];
        let g = gini(&volumes).unwrap();
        prop_assert!(g.abs() < 1e-9);
    }

    #[test]
    fn top_share_is_a_percentage(
        volumes in prop::collection::vec(1u32..100_000, 1..200),
        target in 1.0f64..100.0
    ) {
        let volumes: Vec<f64> = volumes.into_iter().map(f64::from).collect();
        let curve = lorenz(&volumes).unwrap();
        let share = top_share_for_volume(&curve, target).unwrap();
        prop_assert!((0.0..=100.0).contains(&share));
    }

    #[test]
    fn bucket_counts_cover_every_trade(
        prices in prop::collection::vec(1u8..=99, 1..300),
        width in 1u8..=10
    ) {
        let mut buckets = PriceBuckets::new(width);
        for &price in &prices {
            buckets.observe(&make_trade(price, Side::Taker, None));
        }
        prop_assert_eq!(buckets.total_count(), prices.len() as u64);
    }

    #[test]
    fn percentile_is_bounded_by_extremes(
        values in prop::collection::vec(-1000.0f64..1000.0, 1..100),
        p in 0.0f64..=100.0
    ) {
        let mut sorted = values;
        sorted.sort_by(f64::total_cmp);
        let v = percentile(&sorted, p);
        prop_assert!(v >= sorted[0] - 1e-9);
        prop_assert!(v <= sorted[sorted.len() - 1] + 1e-9);
    }
}
