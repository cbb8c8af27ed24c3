//! Property-based tests for report decoding and world invariants.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use xkarena::device::{
    decode, AxisPolicies, AxisPolicy, AxisTriple, ButtonEdges, ButtonLatch, RawReport,
};
use xkarena::sim::{Arena, EntityTag, EntityWorld, TickInput, Variant, WorldSettings};

fn column_bytes() -> impl Strategy<Value = [u8; 4]> {
    prop::array::uniform4(any::<u8>())
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(500))]

    /// Any read of at least 9 bytes becomes a report.
    #[test]
    fn prop_sufficient_reads_parse(data in proptest::collection::vec(any::<u8>(), 9..=64)) {
        prop_assert!(RawReport::from_bytes(&data).is_some());
    }

    /// Reads shorter than 9 bytes are rejected.
    #[test]
    fn prop_short_reads_rejected(data in proptest::collection::vec(any::<u8>(), 0..9usize)) {
        prop_assert!(RawReport::from_bytes(&data).is_none());
    }

    /// Decoding the same report twice never yields an edge the second time.
    #[test]
    fn prop_held_buttons_edge_once(columns in column_bytes(), axes in prop::array::uniform3(any::<u8>())) {
        let report = RawReport::from_parts(columns, axes);
        let mut latch = ButtonLatch::new();
        let policies = AxisPolicies::default();

        let first = decode(&report, &mut latch, &policies);
        let second = decode(&report, &mut latch, &policies);

        let set_bits: u32 = columns.iter().map(|c| (c & 0b111).count_ones()).sum();
        prop_assert_eq!(first.pressed.len() as u32, set_bits);
        prop_assert!(second.pressed.is_empty());
    }

    /// Edges are exactly the buttons down now and up in the previous report.
    #[test]
    fn prop_edges_are_new_presses(before in column_bytes(), after in column_bytes()) {
        let mut latch = ButtonLatch::new();
        let policies = AxisPolicies::default();
        let down_before = decode(&RawReport::from_parts(before, [0; 3]), &mut latch, &policies).pressed;
        let edges = decode(&RawReport::from_parts(after, [0; 3]), &mut latch, &policies).pressed;

        let mut all_after = ButtonLatch::new();
        let down_after = decode(&RawReport::from_parts(after, [0; 3]), &mut all_after, &policies).pressed;

        for button in edges.iter() {
            prop_assert!(down_after.contains(button));
            prop_assert!(!down_before.contains(button));
        }
        for button in down_after.iter() {
            prop_assert_eq!(edges.contains(button), !down_before.contains(button));
        }
    }

    /// Midpoint stays in range and never decreases with the raw value.
    #[test]
    fn prop_midpoint_monotonic(a: u8, b: u8) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let policy = AxisPolicy::Midpoint;
        prop_assert!(policy.normalize(lo) <= policy.normalize(hi));
        prop_assert!((-1.0..=1.0).contains(&policy.normalize(a)));
    }

    /// The directional policy stays within [-1, 1].
    #[test]
    fn prop_directional_in_range(raw: u8) {
        let value = AxisPolicy::Directional.normalize(raw);
        prop_assert!((-1.0..=1.0).contains(&value));
    }
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(24))]

    /// Population bounds and one-way conversion hold under arbitrary steering.
    #[test]
    fn prop_arcade_invariants(
        seed: u64,
        steering in proptest::collection::vec((-1.0f32..=1.0, -1.0f32..=1.0), 50..200),
    ) {
        let mut world = EntityWorld::new(
            Variant::Arcade,
            Arena::default(),
            WorldSettings::default(),
            StdRng::seed_from_u64(seed),
        );
        let mut converted = HashSet::new();

        for (x, y) in steering {
            world.tick(&TickInput {
                axes: AxisTriple::new(x, y, 0.0),
                pressed: ButtonEdges::empty(),
            });

            prop_assert!(world.count(EntityTag::Food) <= world.settings().food_cap);
            prop_assert!(world.unconverted_enemy_count() >= world.settings().enemy_floor);

            for entity in world.entities() {
                if converted.contains(&entity.id) {
                    prop_assert!(entity.is_converted());
                }
                if entity.is_converted() {
                    converted.insert(entity.id);
                }
            }
        }
    }
}
