//! # Bin Array Bitmaps
//!
//! A pair's base bitmap marks liquid bin arrays in the default range
//! `[-BIN_ARRAY_BITMAP_SIZE, BIN_ARRAY_BITMAP_SIZE - 1]`; bit position is
//! `index + BIN_ARRAY_BITMAP_SIZE`. Indices past that range live in the
//! optional [`BinArrayBitmapExtension`]. Scanning is inclusive of the start
//! index and stops at the extension bound.

use crate::bin_math::{bin_id_to_bin_array_index, is_valid_bin_array_index};
use crate::constants::{BASE_BITMAP_WORDS, BIN_ARRAY_BITMAP_SIZE};
use crate::errors::{CoreResult, LbCoreError};
use crate::state::BinArrayBitmapExtension;

/// Number of bits in a u64 word
pub const WORD_BITS: usize = 64;

// ============================================================================
// Multi-Word Bitmap Operations
// ============================================================================

/// Operations on multi-word bitmaps
pub mod multi_word_bitmap {
    use super::*;

    /// Calculate word and bit indices for a given bit position
    #[inline(always)]
    pub fn get_word_and_bit_index(bit_position: usize) -> (usize, usize) {
        (bit_position / WORD_BITS, bit_position % WORD_BITS)
    }

    #[inline(always)]
    pub fn set_bit(bitmap: &mut [u64], bit_position: usize) -> CoreResult<()> {
        let (word_index, bit_index) = get_word_and_bit_index(bit_position);
        let word = bitmap
            .get_mut(word_index)
            .ok_or(LbCoreError::InvalidBinArrayIndex)?;
        *word |= 1u64 << bit_index;
        Ok(())
    }

    #[inline(always)]
    pub fn clear_bit(bitmap: &mut [u64], bit_position: usize) -> CoreResult<()> {
        let (word_index, bit_index) = get_word_and_bit_index(bit_position);
        let word = bitmap
            .get_mut(word_index)
            .ok_or(LbCoreError::InvalidBinArrayIndex)?;
        *word &= !(1u64 << bit_index);
        Ok(())
    }

    #[inline(always)]
    pub fn is_bit_set(bitmap: &[u64], bit_position: usize) -> CoreResult<bool> {
        let (word_index, bit_index) = get_word_and_bit_index(bit_position);
        let word = bitmap
            .get(word_index)
            .ok_or(LbCoreError::InvalidBinArrayIndex)?;
        Ok(word & (1u64 << bit_index) != 0)
    }

    /// First set bit at or after `start_position`
    pub fn next_set_bit(bitmap: &[u64], start_position: usize) -> Option<usize> {
        let (mut word_index, bit_index) = get_word_and_bit_index(start_position);

        if word_index >= bitmap.len() {
            return None;
        }

        let masked = bitmap[word_index] & (u64::MAX << bit_index);
        if masked != 0 {
            return Some(word_index * WORD_BITS + masked.trailing_zeros() as usize);
        }

        word_index += 1;
        while word_index < bitmap.len() {
            if bitmap[word_index] != 0 {
                return Some(word_index * WORD_BITS + bitmap[word_index].trailing_zeros() as usize);
            }
            word_index += 1;
        }

        None
    }

    /// Last set bit strictly before `start_position`
    pub fn prev_set_bit(bitmap: &[u64], start_position: usize) -> Option<usize> {
        if start_position == 0 || bitmap.is_empty() {
            return None;
        }

        let (mut word_index, bit_index) = get_word_and_bit_index(start_position - 1);
        let mut mask = if bit_index == WORD_BITS - 1 {
            u64::MAX
        } else {
            (1u64 << (bit_index + 1)) - 1
        };
        if word_index >= bitmap.len() {
            word_index = bitmap.len() - 1;
            mask = u64::MAX;
        }

        let masked = bitmap[word_index] & mask;
        if masked != 0 {
            return Some(word_index * WORD_BITS + 63 - masked.leading_zeros() as usize);
        }

        while word_index > 0 {
            word_index -= 1;
            if bitmap[word_index] != 0 {
                return Some(word_index * WORD_BITS + 63 - bitmap[word_index].leading_zeros() as usize);
            }
        }

        None
    }
}

// ============================================================================
// Base Bitmap
// ============================================================================

/// Whether `index` falls outside the range covered by the base bitmap
#[inline]
pub fn is_overflow_default_bin_array_bitmap(index: i64) -> bool {
    !(-BIN_ARRAY_BITMAP_SIZE..BIN_ARRAY_BITMAP_SIZE).contains(&index)
}

/// Bit position of `index` in the base bitmap
pub fn bin_array_offset(index: i64) -> CoreResult<usize> {
    if is_overflow_default_bin_array_bitmap(index) {
        return Err(LbCoreError::BitmapExtensionRequired(index));
    }
    Ok((index + BIN_ARRAY_BITMAP_SIZE) as usize)
}

pub fn is_base_bit_set(bitmap: &[u64; BASE_BITMAP_WORDS], index: i64) -> CoreResult<bool> {
    multi_word_bitmap::is_bit_set(bitmap, bin_array_offset(index)?)
}

pub fn set_base_bit(bitmap: &mut [u64; BASE_BITMAP_WORDS], index: i64) -> CoreResult<()> {
    multi_word_bitmap::set_bit(bitmap, bin_array_offset(index)?)
}

pub fn clear_base_bit(bitmap: &mut [u64; BASE_BITMAP_WORDS], index: i64) -> CoreResult<()> {
    multi_word_bitmap::clear_bit(bitmap, bin_array_offset(index)?)
}

// ============================================================================
// Scanning
// ============================================================================

/// Nearest bin array index at or past `start_index` marked as liquid.
///
/// `swap_for_y` scans toward more negative indices. Without an extension the
/// scan stops as soon as it leaves the default range.
pub fn next_bin_array_index_with_liquidity(
    swap_for_y: bool,
    start_index: i64,
    base_bitmap: &[u64; BASE_BITMAP_WORDS],
    extension: Option<&BinArrayBitmapExtension>,
) -> Option<i64> {
    let step: i64 = if swap_for_y { -1 } else { 1 };
    let mut index = start_index;

    loop {
        if !is_valid_bin_array_index(index) {
            return None;
        }

        if is_overflow_default_bin_array_bitmap(index) {
            let extension = extension?;
            if extension.bit(index).ok()? {
                return Some(index);
            }
            index += step;
            continue;
        }

        // Inside the default range whole words are skipped at once
        let position = (index + BIN_ARRAY_BITMAP_SIZE) as usize;
        let found = if swap_for_y {
            multi_word_bitmap::prev_set_bit(base_bitmap, position + 1)
        } else {
            multi_word_bitmap::next_set_bit(base_bitmap, position)
        };
        match found {
            Some(bit) => return Some(bit as i64 - BIN_ARRAY_BITMAP_SIZE),
            None if swap_for_y => index = -BIN_ARRAY_BITMAP_SIZE - 1,
            None => index = BIN_ARRAY_BITMAP_SIZE,
        }
    }
}

/// Liquid bin arrays a swap starting at `active_id` walks through, nearest
/// first. Returns fewer than `count` entries when the bound is reached.
pub fn bin_array_indexes_for_swap(
    active_id: i32,
    swap_for_y: bool,
    base_bitmap: &[u64; BASE_BITMAP_WORDS],
    extension: Option<&BinArrayBitmapExtension>,
    count: usize,
) -> Vec<i64> {
    let mut indexes = Vec::with_capacity(count);
    let mut start_index = bin_id_to_bin_array_index(active_id);

    while indexes.len() < count {
        match next_bin_array_index_with_liquidity(swap_for_y, start_index, base_bitmap, extension) {
            Some(index) => {
                indexes.push(index);
                start_index = if swap_for_y { index - 1 } else { index + 1 };
            }
            None => break,
        }
    }

    indexes
}
