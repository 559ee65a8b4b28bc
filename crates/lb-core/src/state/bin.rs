//! Bin and bin array layouts
//!
//! A bin array is a fixed page of `MAX_BIN_PER_ARRAY` consecutive bins.
//! Bins are never stored on their own.

use bytemuck::{Pod, Zeroable};

use crate::bin_math::{bin_array_bounds, bin_id_to_bin_array_index, bin_offset_in_array, is_valid_bin_array_index};
use crate::constants::{MAX_BIN_PER_ARRAY, NUM_REWARDS};
use crate::errors::{CoreResult, LbCoreError};
use crate::math::price_math::get_liquidity;
use crate::math::safe_math::{safe_add_u128, safe_mul_div_u128, safe_sub_u128};
use crate::state::AccountLayout;

/// Smallest price unit of the book
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct Bin {
    /// Pooled token X
    pub reserve_x: u128,
    /// Pooled token Y
    pub reserve_y: u128,
    /// Liquidity shares issued against this bin
    pub liquidity_supply: u128,
    /// Cached Q64.64 price, zero until the bin first receives liquidity
    pub price: u128,
    pub fee_amount_x_per_token_stored: u128,
    pub fee_amount_y_per_token_stored: u128,
    pub reward_per_token_stored: [u128; NUM_REWARDS],
}

impl Bin {
    pub fn is_empty(&self) -> bool {
        self.liquidity_supply == 0
    }

    /// Reserves owned by `share`, rounded down
    pub fn amounts_for_share(&self, share: u128) -> CoreResult<(u128, u128)> {
        if self.liquidity_supply == 0 {
            return Ok((0, 0));
        }
        let amount_x = safe_mul_div_u128(share, self.reserve_x, self.liquidity_supply)?;
        let amount_y = safe_mul_div_u128(share, self.reserve_y, self.liquidity_supply)?;
        Ok((amount_x, amount_y))
    }

    /// Add reserves and return the shares minted for them
    pub fn deposit(&mut self, amount_x: u128, amount_y: u128, price: u128) -> CoreResult<u128> {
        let in_liquidity = get_liquidity(amount_x, amount_y, price)?;
        let minted = if self.liquidity_supply == 0 {
            in_liquidity
        } else {
            let bin_liquidity = get_liquidity(self.reserve_x, self.reserve_y, price)?;
            safe_mul_div_u128(in_liquidity, self.liquidity_supply, bin_liquidity)?
        };
        // Reserves without supply would break the empty-bin invariant
        if minted == 0 {
            return Err(LbCoreError::InsufficientLiquidity);
        }

        self.reserve_x = safe_add_u128(self.reserve_x, amount_x)?;
        self.reserve_y = safe_add_u128(self.reserve_y, amount_y)?;
        self.liquidity_supply = safe_add_u128(self.liquidity_supply, minted)?;
        Ok(minted)
    }

    /// Burn `share` and return the reserves released for it
    pub fn withdraw(&mut self, share: u128) -> CoreResult<(u128, u128)> {
        if share > self.liquidity_supply {
            return Err(LbCoreError::InsufficientLiquidity);
        }
        let (amount_x, amount_y) = if share == self.liquidity_supply {
            (self.reserve_x, self.reserve_y)
        } else {
            self.amounts_for_share(share)?
        };

        self.reserve_x = safe_sub_u128(self.reserve_x, amount_x)?;
        self.reserve_y = safe_sub_u128(self.reserve_y, amount_y)?;
        self.liquidity_supply = safe_sub_u128(self.liquidity_supply, share)?;
        Ok((amount_x, amount_y))
    }
}

/// Fixed page of consecutive bins owned by one pair
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct BinArray {
    pub lb_pair: [u8; 32],
    pub index: i64,
    pub version: u8,
    pub _padding: [u8; 7],
    pub bins: [Bin; MAX_BIN_PER_ARRAY],
}

impl AccountLayout for BinArray {
    const DISCRIMINATOR: [u8; 8] = [92, 142, 92, 220, 5, 148, 70, 181];
}

impl BinArray {
    pub fn new(lb_pair: [u8; 32], index: i64) -> CoreResult<Self> {
        if !is_valid_bin_array_index(index) {
            return Err(LbCoreError::BinArrayIndexOutOfBounds(index));
        }
        let mut array = Self::zeroed();
        array.lb_pair = lb_pair;
        array.index = index;
        array.version = 1;
        Ok(array)
    }

    /// Inclusive bin id bounds of this array
    pub fn bounds(&self) -> CoreResult<(i32, i32)> {
        bin_array_bounds(self.index)
    }

    pub fn contains_bin(&self, bin_id: i32) -> bool {
        bin_id_to_bin_array_index(bin_id) == self.index
    }

    pub fn get_bin(&self, bin_id: i32) -> CoreResult<&Bin> {
        if !self.contains_bin(bin_id) {
            return Err(LbCoreError::BinArrayNotFound(bin_id_to_bin_array_index(bin_id)));
        }
        Ok(&self.bins[bin_offset_in_array(bin_id)?])
    }

    pub fn get_bin_mut(&mut self, bin_id: i32) -> CoreResult<&mut Bin> {
        if !self.contains_bin(bin_id) {
            return Err(LbCoreError::BinArrayNotFound(bin_id_to_bin_array_index(bin_id)));
        }
        Ok(&mut self.bins[bin_offset_in_array(bin_id)?])
    }

    /// True when no bin in the array holds liquidity
    pub fn is_empty(&self) -> bool {
        self.bins.iter().all(Bin::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ONE;
    use static_assertions::const_assert_eq;

    const_assert_eq!(std::mem::size_of::<Bin>(), 128);
    const_assert_eq!(std::mem::size_of::<BinArray>(), 48 + 128 * MAX_BIN_PER_ARRAY);

    #[test]
    fn test_bin_lookup() {
        let array = BinArray::new([1; 32], -1).unwrap();
        assert_eq!(array.bounds().unwrap(), (-70, -1));
        assert!(array.get_bin(-70).is_ok());
        assert!(array.get_bin(-1).is_ok());
        assert_eq!(array.get_bin(0), Err(LbCoreError::BinArrayNotFound(0)));
        assert!(BinArray::new([1; 32], 1_000_000).is_err());
    }

    #[test]
    fn test_first_deposit_mints_value() {
        let mut bin = Bin::default();
        let minted = bin.deposit(100, 50, 2 * ONE).unwrap();
        assert_eq!(minted, 250);
        assert_eq!(bin.liquidity_supply, 250);

        // Second deposit mints pro rata
        let minted = bin.deposit(50, 25, 2 * ONE).unwrap();
        assert_eq!(minted, 125);
    }

    #[test]
    fn test_full_withdraw_empties_bin() {
        let mut bin = Bin::default();
        let share = bin.deposit(7, 3, ONE).unwrap();
        let (x, y) = bin.withdraw(share).unwrap();
        assert_eq!((x, y), (7, 3));
        assert_eq!(bin, Bin::default());
        assert_eq!(bin.withdraw(1), Err(LbCoreError::InsufficientLiquidity));
    }

    #[test]
    fn test_dust_deposit_rejected() {
        let mut bin = Bin::default();
        // One unit of X at a price far below 1.0 has no value in Y
        assert_eq!(bin.deposit(1, 0, ONE / 4), Err(LbCoreError::InsufficientLiquidity));
        assert!(bin.is_empty());
    }

    #[test]
    fn test_account_round_trip() {
        let mut array = BinArray::new([9; 32], 81).unwrap();
        array.get_bin_mut(5680).unwrap().deposit(10, 0, ONE).unwrap();
        let data = array.encode();
        assert_eq!(data.len(), BinArray::LEN);
        assert_eq!(BinArray::decode(&data).unwrap(), array);

        let mut corrupted = data.clone();
        corrupted[0] ^= 0xff;
        assert_eq!(BinArray::decode(&corrupted), Err(LbCoreError::InvalidDiscriminator));
        assert_eq!(BinArray::decode(&data[..100]), Err(LbCoreError::InvalidAccountData));
    }
}
