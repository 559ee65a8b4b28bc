//! # Liquidity Book Properties
//!
//! Property tests over bin indexing, liquidity discovery and share accounting.

use std::collections::BTreeSet;

use lb_core::bin_math::{array_index_of, bin_range_of, within_array_offset};
use lb_core::bitmap::is_overflow_default_bin_array_bitmap;
use lb_core::book::{BinLiquidityDistribution, LiquidityBook};
use lb_core::position_liquidity::owned_amounts_at;
use lb_core::{BinArrayBitmapExtension, LbPairState, MAX_BIN_ARRAY_INDEX, MIN_BIN_ARRAY_INDEX};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn bin_array_index() -> impl Strategy<Value = i64> {
    MIN_BIN_ARRAY_INDEX..=MAX_BIN_ARRAY_INDEX
}

fn overflow_index() -> impl Strategy<Value = i64> {
    prop_oneof![
        MIN_BIN_ARRAY_INDEX..=-513i64,
        512i64..=MAX_BIN_ARRAY_INDEX,
    ]
}

fn mark_all(indexes: &BTreeSet<i64>) -> (LbPairState, BinArrayBitmapExtension) {
    let mut pair = LbPairState::new(0, 10);
    let mut extension = BinArrayBitmapExtension::new([0; 32]);
    for &index in indexes {
        if is_overflow_default_bin_array_bitmap(index) {
            extension.set_bit(index).unwrap();
        } else {
            pair.mark_bin_array(index).unwrap();
        }
    }
    (pair, extension)
}

// ============================================================================
// Indexing
// ============================================================================

proptest! {
    #[test]
    fn prop_bin_falls_inside_its_array(
        bin_id in -1_000_000i64..=1_000_000,
        array_size in 1i64..=1_000,
    ) {
        let index = array_index_of(bin_id, array_size).unwrap();
        let (lower, upper) = bin_range_of(index, array_size).unwrap();
        prop_assert!(lower <= bin_id && bin_id <= upper);
        prop_assert_eq!(upper - lower + 1, array_size);
        prop_assert_eq!(within_array_offset(bin_id, array_size).unwrap() as i64, bin_id - lower);
    }

    #[test]
    fn prop_zero_splits_arrays(array_size in 1i64..=1_000) {
        prop_assert_eq!(array_index_of(0, array_size).unwrap(), 0);
        prop_assert_eq!(array_index_of(-1, array_size).unwrap(), -1);
        prop_assert_eq!(bin_range_of(-1, array_size).unwrap(), (-array_size, -1));
        prop_assert_eq!(within_array_offset(-1, array_size).unwrap() as i64, array_size - 1);
    }
}

// ============================================================================
// Discovery
// ============================================================================

proptest! {
    /// The scan returns exactly the nearest marked index in its direction
    #[test]
    fn prop_scan_finds_nearest_marked(
        marked in prop::collection::btree_set(bin_array_index(), 0..24),
        start in bin_array_index(),
        swap_for_y in any::<bool>(),
    ) {
        let (pair, extension) = mark_all(&marked);
        let found = pair.next_bin_array_index_with_liquidity(swap_for_y, start, Some(&extension));
        let expected = if swap_for_y {
            marked.range(..=start).next_back().copied()
        } else {
            marked.range(start..).next().copied()
        };
        prop_assert_eq!(found, expected);
    }

    /// Arrays marked only in the extension are reachable from the default range
    #[test]
    fn prop_extension_only_discovery(
        marked in prop::collection::btree_set(overflow_index(), 1..8),
    ) {
        let (pair, extension) = mark_all(&marked);
        prop_assert!(pair.bin_array_bitmap.iter().all(|word| *word == 0));

        let up = pair.next_bin_array_index_with_liquidity(false, 0, Some(&extension));
        prop_assert_eq!(up, marked.range(0..).next().copied());
        let down = pair.next_bin_array_index_with_liquidity(true, 0, Some(&extension));
        prop_assert_eq!(down, marked.range(..0).next_back().copied());

        // Without the extension the scan gives up at the default boundary
        prop_assert_eq!(pair.next_bin_array_index_with_liquidity(false, 0, None), None);
        prop_assert_eq!(pair.next_bin_array_index_with_liquidity(true, 0, None), None);
    }

    #[test]
    fn prop_swap_walk_is_ordered(
        marked in prop::collection::btree_set(bin_array_index(), 0..24),
        active_id in -400_000i32..=400_000,
        swap_for_y in any::<bool>(),
    ) {
        let (mut pair, extension) = mark_all(&marked);
        pair.active_id = active_id;
        let walk = pair.bin_array_indexes_for_swap(swap_for_y, Some(&extension), 4);
        prop_assert!(walk.len() <= 4);
        for pair_of in walk.windows(2) {
            if swap_for_y {
                prop_assert!(pair_of[0] > pair_of[1]);
            } else {
                prop_assert!(pair_of[0] < pair_of[1]);
            }
        }
        prop_assert!(walk.iter().all(|index| marked.contains(index)));
    }
}

// ============================================================================
// Share Accounting
// ============================================================================

const LOWER: i32 = -10;
const UPPER: i32 = 10;

fn distribution(amount: u128) -> Vec<BinLiquidityDistribution> {
    (LOWER..=UPPER)
        .map(|bin_id| BinLiquidityDistribution {
            bin_id,
            amount_x: if bin_id >= 0 { amount } else { 0 },
            amount_y: if bin_id <= 0 { amount } else { 0 },
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Positions never own more than the bin holds, and reserves track every
    /// deposit and withdrawal exactly
    #[test]
    fn prop_positions_never_exceed_reserves(
        deposits in prop::collection::vec(1_000u128..1_000_000_000, 2..5),
        withdrawals in prop::collection::vec(1u16..=10_000, 5),
    ) {
        let mut book = LiquidityBook::new([3; 32], 0, 10);
        book.initialize_bin_arrays_for_range(LOWER, UPPER).unwrap();

        let mut positions = Vec::new();
        let mut in_x = 0u128;
        let mut in_y = 0u128;
        for (i, amount) in deposits.iter().enumerate() {
            let mut position = book
                .open_position([i as u8; 32], LOWER, (UPPER - LOWER + 1) as usize)
                .unwrap();
            let (x, y) = book.add_liquidity(&mut position, &distribution(*amount)).unwrap();
            in_x += x;
            in_y += y;
            positions.push(position);
        }

        let mut out_x = 0u128;
        let mut out_y = 0u128;
        for (position, bps) in positions.iter_mut().zip(withdrawals.iter()) {
            let (x, y) = book.remove_liquidity_by_bps(position, LOWER, UPPER, *bps).unwrap();
            out_x += x;
            out_y += y;
        }

        prop_assert_eq!(book.total_reserves().unwrap(), (in_x - out_x, in_y - out_y));

        for bin_id in LOWER..=UPPER {
            let mut owned_x = 0u128;
            let mut owned_y = 0u128;
            for position in &positions {
                let (x, y) = owned_amounts_at(position, &book.bin_arrays, bin_id).unwrap().unwrap();
                owned_x += x;
                owned_y += y;
            }
            let index = lb_core::bin_math::bin_id_to_bin_array_index(bin_id);
            let bin = book.bin_arrays[&index].get_bin(bin_id).unwrap();
            prop_assert!(owned_x <= bin.reserve_x);
            prop_assert!(owned_y <= bin.reserve_y);
        }
    }
}
