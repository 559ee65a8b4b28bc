//! # Position Liquidity
//!
//! Values a position bin by bin. A position owns `share / supply` of each
//! bin's reserves, rounded down so a position is never overpaid; the owned
//! reserves are folded into one number with the bin price:
//! `(owned_x * price + (owned_y << 64)) >> 64`.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use crate::bin_math::{bin_array_indexes_for_range, bin_id_to_bin_array_index};
use crate::errors::{CoreResult, LbCoreError};
use crate::math::price_math::{get_liquidity, get_price_from_id};
use crate::math::safe_math::safe_add_u128;
use crate::state::{Bin, BinArray, DynamicPosition};

/// Anything that can hand out bin arrays by index
pub trait BinArrayLookup {
    fn find_bin_array(&self, index: i64) -> Option<&BinArray>;
}

impl BinArrayLookup for [BinArray] {
    fn find_bin_array(&self, index: i64) -> Option<&BinArray> {
        self.iter().find(|array| array.index == index)
    }
}

impl BinArrayLookup for Vec<BinArray> {
    fn find_bin_array(&self, index: i64) -> Option<&BinArray> {
        self.as_slice().find_bin_array(index)
    }
}

impl BinArrayLookup for BTreeMap<i64, Box<BinArray>> {
    fn find_bin_array(&self, index: i64) -> Option<&BinArray> {
        self.get(&index).map(|array| array.as_ref())
    }
}

/// Valuation of one position bin
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BinLiquidity {
    pub bin_id: i32,
    pub liquidity_share: u128,
    pub amount_x: u128,
    pub amount_y: u128,
    pub liquidity: u128,
}

/// Bin array indices a position touches
pub fn covering_bin_array_indexes(position: &DynamicPosition) -> CoreResult<RangeInclusive<i64>> {
    bin_array_indexes_for_range(position.lower_bin_id(), position.upper_bin_id())
}

fn find_bin<'a, L>(bin_arrays: &'a L, bin_id: i32) -> CoreResult<&'a Bin>
where
    L: BinArrayLookup + ?Sized,
{
    let index = bin_id_to_bin_array_index(bin_id);
    bin_arrays
        .find_bin_array(index)
        .ok_or(LbCoreError::BinArrayNotFound(index))?
        .get_bin(bin_id)
}

/// Reserves owned by the position in `bin_id`, `None` outside its range
pub fn owned_amounts_at<L>(
    position: &DynamicPosition,
    bin_arrays: &L,
    bin_id: i32,
) -> CoreResult<Option<(u128, u128)>>
where
    L: BinArrayLookup + ?Sized,
{
    let Some(share) = position.liquidity_share(bin_id) else {
        return Ok(None);
    };
    let bin = find_bin(bin_arrays, bin_id)?;
    Ok(Some(bin.amounts_for_share(share)?))
}

/// Liquidity the position holds in `bin_id`, `None` outside its range.
///
/// An unbacked bin (zero supply) values the position at its raw share.
pub fn liquidity_at<L>(
    position: &DynamicPosition,
    bin_arrays: &L,
    bin_id: i32,
    bin_step: u16,
) -> CoreResult<Option<u128>>
where
    L: BinArrayLookup + ?Sized,
{
    Ok(bin_liquidity_at(position, bin_arrays, bin_id, bin_step)?.map(|bin| bin.liquidity))
}

fn bin_liquidity_at<L>(
    position: &DynamicPosition,
    bin_arrays: &L,
    bin_id: i32,
    bin_step: u16,
) -> CoreResult<Option<BinLiquidity>>
where
    L: BinArrayLookup + ?Sized,
{
    let Some(share) = position.liquidity_share(bin_id) else {
        return Ok(None);
    };
    let bin = find_bin(bin_arrays, bin_id)?;

    if bin.liquidity_supply == 0 {
        return Ok(Some(BinLiquidity {
            bin_id,
            liquidity_share: share,
            liquidity: share,
            ..Default::default()
        }));
    }

    let (amount_x, amount_y) = bin.amounts_for_share(share)?;
    let price = get_price_from_id(bin_id, bin_step)?;
    Ok(Some(BinLiquidity {
        bin_id,
        liquidity_share: share,
        amount_x,
        amount_y,
        liquidity: get_liquidity(amount_x, amount_y, price)?,
    }))
}

/// Valuation of every bin in the position, lower to upper
pub fn position_liquidity<L>(
    position: &DynamicPosition,
    bin_arrays: &L,
    bin_step: u16,
) -> CoreResult<Vec<BinLiquidity>>
where
    L: BinArrayLookup + ?Sized,
{
    (position.lower_bin_id()..=position.upper_bin_id())
        .map(|bin_id| {
            bin_liquidity_at(position, bin_arrays, bin_id, bin_step)?
                .ok_or(LbCoreError::BinIdOutOfPositionRange(bin_id))
        })
        .collect()
}

/// Sum of `liquidity_at` across the position range
pub fn total_liquidity<L>(position: &DynamicPosition, bin_arrays: &L, bin_step: u16) -> CoreResult<u128>
where
    L: BinArrayLookup + ?Sized,
{
    position_liquidity(position, bin_arrays, bin_step)?
        .iter()
        .try_fold(0u128, |total, bin| safe_add_u128(total, bin.liquidity))
}
