//! # Liquidity Book
//!
//! Deterministic in-memory book over the account layouts. It owns one pair,
//! its initialized bin arrays and the optional bitmap extension, and keeps the
//! liquidity bitmaps in step with bin reserves: an array is marked once any of
//! its bins holds liquidity and unmarked when the last bin empties.
//!
//! Every mutating operation works on staged copies and commits only when the
//! whole batch succeeds.

use std::collections::BTreeMap;

use crate::bin_math::{bin_array_indexes_for_range, bin_id_to_bin_array_index};
use crate::bitmap::is_overflow_default_bin_array_bitmap;
use crate::constants::BASIS_POINT_MAX;
use crate::errors::{CoreResult, LbCoreError};
use crate::math::price_math::{get_price_from_id, require_priced_bin};
use crate::math::safe_math::{safe_add_u128, safe_calculate_bps, safe_sub_u128};
use crate::position_liquidity::{self, BinLiquidity};
use crate::state::{BinArray, BinArrayBitmapExtension, DynamicPosition, LbPairState};
use crate::strategy::RebalancingParams;

/// Amounts to deposit into one bin
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BinLiquidityDistribution {
    pub bin_id: i32,
    pub amount_x: u128,
    pub amount_y: u128,
}

#[derive(Clone, Debug)]
pub struct LiquidityBook {
    pub key: [u8; 32],
    pub pair: LbPairState,
    pub bin_arrays: BTreeMap<i64, Box<BinArray>>,
    pub extension: Option<Box<BinArrayBitmapExtension>>,
}

/// Copy-on-write view used while a batch is applied
struct Staged {
    pair: LbPairState,
    bin_arrays: BTreeMap<i64, Box<BinArray>>,
    extension: Option<Box<BinArrayBitmapExtension>>,
}

impl Staged {
    fn new(book: &LiquidityBook) -> Self {
        Self {
            pair: book.pair,
            bin_arrays: BTreeMap::new(),
            extension: book.extension.clone(),
        }
    }

    fn bin_array_mut(&mut self, committed: &BTreeMap<i64, Box<BinArray>>, index: i64) -> CoreResult<&mut BinArray> {
        if !self.bin_arrays.contains_key(&index) {
            let array = committed
                .get(&index)
                .ok_or(LbCoreError::BinArrayNotFound(index))?;
            self.bin_arrays.insert(index, array.clone());
        }
        self.bin_arrays
            .get_mut(&index)
            .map(|array| array.as_mut())
            .ok_or(LbCoreError::BinArrayNotFound(index))
    }

    /// Set or clear the liquidity bit of `index` to match its reserves
    fn sync_bitmap(&mut self, index: i64) -> CoreResult<()> {
        let liquid = match self.bin_arrays.get(&index) {
            Some(array) => !array.is_empty(),
            None => return Ok(()),
        };

        if is_overflow_default_bin_array_bitmap(index) {
            let extension = self
                .extension
                .as_mut()
                .ok_or(LbCoreError::BitmapExtensionRequired(index))?;
            if liquid {
                extension.set_bit(index)
            } else {
                extension.clear_bit(index)
            }
        } else if liquid {
            self.pair.mark_bin_array(index)
        } else {
            self.pair.unmark_bin_array(index)
        }
    }

    fn commit(self, book: &mut LiquidityBook) {
        let Staged { pair, bin_arrays, extension } = self;
        book.pair = pair;
        book.extension = extension;
        book.bin_arrays.extend(bin_arrays);
    }
}

impl LiquidityBook {
    pub fn new(key: [u8; 32], active_id: i32, bin_step: u16) -> Self {
        Self {
            key,
            pair: LbPairState::new(active_id, bin_step),
            bin_arrays: BTreeMap::new(),
            extension: None,
        }
    }

    pub fn active_id(&self) -> i32 {
        self.pair.active_id
    }

    pub fn bin_step(&self) -> u16 {
        self.pair.bin_step
    }

    pub fn initialize_bitmap_extension(&mut self) -> CoreResult<()> {
        if self.extension.is_some() {
            return Err(LbCoreError::BitmapExtensionAlreadyInitialized);
        }
        self.extension = Some(Box::new(BinArrayBitmapExtension::new(self.key)));
        Ok(())
    }

    pub fn initialize_bin_array(&mut self, index: i64) -> CoreResult<()> {
        if self.bin_arrays.contains_key(&index) {
            return Err(LbCoreError::BinArrayAlreadyInitialized(index));
        }
        let array = BinArray::new(self.key, index)?;
        let (lower_bin_id, upper_bin_id) = array.bounds()?;
        self.require_priced_range(lower_bin_id, upper_bin_id)?;
        self.bin_arrays.insert(index, Box::new(array));
        Ok(())
    }

    /// Initialize every missing array covering `[lower_bin_id, upper_bin_id]`.
    /// Returns the indices that were created.
    pub fn initialize_bin_arrays_for_range(&mut self, lower_bin_id: i32, upper_bin_id: i32) -> CoreResult<Vec<i64>> {
        let mut created = Vec::new();
        for index in bin_array_indexes_for_range(lower_bin_id, upper_bin_id)? {
            if !self.bin_arrays.contains_key(&index) {
                self.initialize_bin_array(index)?;
                created.push(index);
            }
        }
        Ok(created)
    }

    pub fn open_position(&self, owner: [u8; 32], lower_bin_id: i32, width: usize) -> CoreResult<DynamicPosition> {
        let position = DynamicPosition::new(self.key, owner, lower_bin_id, width)?;
        self.require_priced_range(position.lower_bin_id(), position.upper_bin_id())?;
        Ok(position)
    }

    fn require_priced_range(&self, lower_bin_id: i32, upper_bin_id: i32) -> CoreResult<()> {
        require_priced_bin(lower_bin_id, self.pair.bin_step)?;
        require_priced_bin(upper_bin_id, self.pair.bin_step)
    }

    fn check_position(&self, position: &DynamicPosition) -> CoreResult<()> {
        if position.state.lb_pair != self.key {
            return Err(LbCoreError::PairMismatch);
        }
        Ok(())
    }

    /// Deposit each distribution into its bin and credit the minted shares to
    /// `position`. Bins below the active bin take only Y, bins above it only
    /// X. Returns the total `(x, y)` deposited.
    pub fn add_liquidity(
        &mut self,
        position: &mut DynamicPosition,
        distributions: &[BinLiquidityDistribution],
    ) -> CoreResult<(u128, u128)> {
        self.check_position(position)?;
        let active_id = self.pair.active_id;
        let bin_step = self.pair.bin_step;

        let mut staged = Staged::new(self);
        let mut staged_position = position.clone();
        let mut total_x = 0u128;
        let mut total_y = 0u128;

        for distribution in distributions {
            let bin_id = distribution.bin_id;
            if distribution.amount_x == 0 && distribution.amount_y == 0 {
                continue;
            }
            if (bin_id < active_id && distribution.amount_x > 0) || (bin_id > active_id && distribution.amount_y > 0) {
                return Err(LbCoreError::InvalidLiquidityDistribution(bin_id));
            }

            let position_bin = staged_position.bin_for_id_mut(bin_id)?;
            let index = bin_id_to_bin_array_index(bin_id);
            let bin = staged.bin_array_mut(&self.bin_arrays, index)?.get_bin_mut(bin_id)?;
            if bin.price == 0 {
                bin.price = get_price_from_id(bin_id, bin_step)?;
            }
            let price = bin.price;
            let minted = bin.deposit(distribution.amount_x, distribution.amount_y, price)?;
            position_bin.liquidity_share = safe_add_u128(position_bin.liquidity_share, minted)?;

            staged.sync_bitmap(index)?;
            total_x = safe_add_u128(total_x, distribution.amount_x)?;
            total_y = safe_add_u128(total_y, distribution.amount_y)?;
        }

        staged.commit(self);
        *position = staged_position;
        Ok((total_x, total_y))
    }

    /// Deposit a strategy-shaped amount around the current active bin
    pub fn add_liquidity_by_strategy(
        &mut self,
        position: &mut DynamicPosition,
        params: &RebalancingParams,
    ) -> CoreResult<(u128, u128)> {
        if params.active_id != self.pair.active_id || params.bin_step != self.pair.bin_step {
            return Err(LbCoreError::InvalidStrategyParameters);
        }
        let distributions: Vec<BinLiquidityDistribution> = params
            .amounts_in_bins()?
            .into_iter()
            .map(|amount| BinLiquidityDistribution {
                bin_id: amount.bin_id,
                amount_x: amount.amount_x.into(),
                amount_y: amount.amount_y.into(),
            })
            .collect();
        self.add_liquidity(position, &distributions)
    }

    /// Burn `bps / 10000` of the position's share in every bin of
    /// `[lower_bin_id, upper_bin_id]`. Returns the total `(x, y)` released.
    pub fn remove_liquidity_by_bps(
        &mut self,
        position: &mut DynamicPosition,
        lower_bin_id: i32,
        upper_bin_id: i32,
        bps: u16,
    ) -> CoreResult<(u128, u128)> {
        self.check_position(position)?;
        if bps == 0 || i32::from(bps) > BASIS_POINT_MAX {
            return Err(LbCoreError::InvalidBps);
        }
        if lower_bin_id > upper_bin_id {
            return Err(LbCoreError::InvalidPositionWidth);
        }
        for bin_id in [lower_bin_id, upper_bin_id] {
            if !position.contains(bin_id) {
                return Err(LbCoreError::BinIdOutOfPositionRange(bin_id));
            }
        }

        let mut staged = Staged::new(self);
        let mut staged_position = position.clone();
        let mut total_x = 0u128;
        let mut total_y = 0u128;

        for bin_id in lower_bin_id..=upper_bin_id {
            let position_bin = staged_position.bin_for_id_mut(bin_id)?;
            let share = safe_calculate_bps(position_bin.liquidity_share, bps)?;
            if share == 0 {
                continue;
            }

            let index = bin_id_to_bin_array_index(bin_id);
            let (amount_x, amount_y) = staged
                .bin_array_mut(&self.bin_arrays, index)?
                .get_bin_mut(bin_id)?
                .withdraw(share)?;
            position_bin.liquidity_share = safe_sub_u128(position_bin.liquidity_share, share)?;

            staged.sync_bitmap(index)?;
            total_x = safe_add_u128(total_x, amount_x)?;
            total_y = safe_add_u128(total_y, amount_y)?;
        }

        staged.commit(self);
        *position = staged_position;
        Ok((total_x, total_y))
    }

    pub fn position_liquidity(&self, position: &DynamicPosition) -> CoreResult<Vec<BinLiquidity>> {
        position_liquidity::position_liquidity(position, &self.bin_arrays, self.pair.bin_step)
    }

    pub fn liquidity_at(&self, position: &DynamicPosition, bin_id: i32) -> CoreResult<Option<u128>> {
        position_liquidity::liquidity_at(position, &self.bin_arrays, bin_id, self.pair.bin_step)
    }

    pub fn bin_array_indexes_for_swap(&self, swap_for_y: bool, count: usize) -> Vec<i64> {
        self.pair
            .bin_array_indexes_for_swap(swap_for_y, self.extension.as_deref(), count)
    }

    pub fn is_bin_array_marked(&self, index: i64) -> CoreResult<bool> {
        self.pair.is_bin_array_marked(index, self.extension.as_deref())
    }

    /// Sum of reserves across every initialized bin
    pub fn total_reserves(&self) -> CoreResult<(u128, u128)> {
        self.bin_arrays
            .values()
            .flat_map(|array| array.bins.iter())
            .try_fold((0u128, 0u128), |(x, y), bin| {
                Ok((safe_add_u128(x, bin.reserve_x)?, safe_add_u128(y, bin.reserve_y)?))
            })
    }
}
