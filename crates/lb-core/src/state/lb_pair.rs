//! Pair state
//!
//! Top-level record of a liquidity book pair. It embeds the base bin array
//! bitmap, so the default range can be scanned without extra accounts.

use bytemuck::{Pod, Zeroable};

use crate::bitmap::{self, clear_base_bit, is_base_bit_set, is_overflow_default_bin_array_bitmap, set_base_bit};
use crate::constants::BASE_BITMAP_WORDS;
use crate::errors::CoreResult;
use crate::math::price_math::get_price_from_id;
use crate::state::{AccountLayout, BinArrayBitmapExtension};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum PairStatus {
    Enabled = 0,
    Disabled = 1,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct LbPairState {
    pub bin_array_bitmap: [u64; BASE_BITMAP_WORDS],
    pub token_x_mint: [u8; 32],
    pub token_y_mint: [u8; 32],
    pub reserve_x: [u8; 32],
    pub reserve_y: [u8; 32],
    pub active_id: i32,
    pub bin_step: u16,
    pub status: u8,
    pub bump: u8,
    pub _reserved: [u8; 56],
}

impl AccountLayout for LbPairState {
    const DISCRIMINATOR: [u8; 8] = [33, 11, 49, 98, 181, 101, 177, 13];
}

impl LbPairState {
    pub fn new(active_id: i32, bin_step: u16) -> Self {
        let mut pair = Self::zeroed();
        pair.active_id = active_id;
        pair.bin_step = bin_step;
        pair.status = PairStatus::Enabled as u8;
        pair
    }

    pub fn is_enabled(&self) -> bool {
        self.status == PairStatus::Enabled as u8
    }

    /// Q64.64 price of the active bin
    pub fn active_price(&self) -> CoreResult<u128> {
        get_price_from_id(self.active_id, self.bin_step)
    }

    pub fn is_overflow_default_bin_array_bitmap(&self, index: i64) -> bool {
        is_overflow_default_bin_array_bitmap(index)
    }

    /// Whether `index` is marked liquid, looking in the extension when needed
    pub fn is_bin_array_marked(
        &self,
        index: i64,
        extension: Option<&BinArrayBitmapExtension>,
    ) -> CoreResult<bool> {
        if is_overflow_default_bin_array_bitmap(index) {
            match extension {
                Some(extension) => extension.bit(index),
                None => Ok(false),
            }
        } else {
            is_base_bit_set(&self.bin_array_bitmap, index)
        }
    }

    /// Mark a default-range bin array as liquid
    pub fn mark_bin_array(&mut self, index: i64) -> CoreResult<()> {
        set_base_bit(&mut self.bin_array_bitmap, index)
    }

    pub fn unmark_bin_array(&mut self, index: i64) -> CoreResult<()> {
        clear_base_bit(&mut self.bin_array_bitmap, index)
    }

    pub fn next_bin_array_index_with_liquidity(
        &self,
        swap_for_y: bool,
        start_index: i64,
        extension: Option<&BinArrayBitmapExtension>,
    ) -> Option<i64> {
        bitmap::next_bin_array_index_with_liquidity(
            swap_for_y,
            start_index,
            &self.bin_array_bitmap,
            extension,
        )
    }

    pub fn bin_array_indexes_for_swap(
        &self,
        swap_for_y: bool,
        extension: Option<&BinArrayBitmapExtension>,
        count: usize,
    ) -> Vec<i64> {
        bitmap::bin_array_indexes_for_swap(
            self.active_id,
            swap_for_y,
            &self.bin_array_bitmap,
            extension,
            count,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ONE;
    use crate::errors::LbCoreError;
    use static_assertions::const_assert_eq;

    const_assert_eq!(std::mem::size_of::<LbPairState>(), 320);

    #[test]
    fn test_marks_in_base_and_extension() {
        let mut pair = LbPairState::new(0, 10);
        let mut extension = BinArrayBitmapExtension::new([0; 32]);

        pair.mark_bin_array(-512).unwrap();
        assert!(pair.is_bin_array_marked(-512, None).unwrap());
        assert_eq!(pair.mark_bin_array(700), Err(LbCoreError::BitmapExtensionRequired(700)));

        extension.set_bit(700).unwrap();
        assert!(!pair.is_bin_array_marked(700, None).unwrap());
        assert!(pair.is_bin_array_marked(700, Some(&extension)).unwrap());

        pair.unmark_bin_array(-512).unwrap();
        assert!(!pair.is_bin_array_marked(-512, None).unwrap());
    }

    #[test]
    fn test_account_round_trip() {
        let mut pair = LbPairState::new(5660, 10);
        pair.mark_bin_array(80).unwrap();
        let decoded = LbPairState::decode(&pair.encode()).unwrap();
        assert_eq!(decoded, pair);
        assert!(decoded.is_enabled());
        assert_eq!(LbPairState::new(0, 25).active_price().unwrap(), ONE);
    }
}
