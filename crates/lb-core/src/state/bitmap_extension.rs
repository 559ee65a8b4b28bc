//! Bitmap extension for bin arrays outside the default range
//!
//! Each side (negative, positive) is a list of 512-bit chunks. Both sides
//! count from zero starting at the first index past the default range:
//! index `BIN_ARRAY_BITMAP_SIZE` is bit 0 of the positive side and index
//! `-BIN_ARRAY_BITMAP_SIZE - 1` is bit 0 of the negative side.

use bytemuck::{Pod, Zeroable};

use crate::bin_math::is_valid_bin_array_index;
use crate::bitmap::{is_overflow_default_bin_array_bitmap, multi_word_bitmap};
use crate::constants::{
    BIN_ARRAY_BITMAP_SIZE, EXTENSION_BINARRAY_BITMAP_SIZE, EXTENSION_CHUNK_BITS, EXTENSION_CHUNK_WORDS,
};
use crate::errors::{CoreResult, LbCoreError};
use crate::state::AccountLayout;

/// Position of a bin array index inside the extension
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ExtensionBitPosition {
    pub negative: bool,
    pub chunk: usize,
    pub bit: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct BinArrayBitmapExtension {
    pub lb_pair: [u8; 32],
    pub positive_bin_array_bitmap: [[u64; EXTENSION_CHUNK_WORDS]; EXTENSION_BINARRAY_BITMAP_SIZE],
    pub negative_bin_array_bitmap: [[u64; EXTENSION_CHUNK_WORDS]; EXTENSION_BINARRAY_BITMAP_SIZE],
}

impl AccountLayout for BinArrayBitmapExtension {
    const DISCRIMINATOR: [u8; 8] = [80, 111, 124, 113, 55, 237, 18, 5];
}

impl BinArrayBitmapExtension {
    pub fn new(lb_pair: [u8; 32]) -> Self {
        let mut extension = Self::zeroed();
        extension.lb_pair = lb_pair;
        extension
    }

    /// Map an overflowing bin array index into extension coordinates
    pub fn bit_position(index: i64) -> CoreResult<ExtensionBitPosition> {
        if !is_overflow_default_bin_array_bitmap(index) || !is_valid_bin_array_index(index) {
            return Err(LbCoreError::BinArrayIndexOutOfBounds(index));
        }
        let (negative, offset) = if index > 0 {
            (false, index - BIN_ARRAY_BITMAP_SIZE)
        } else {
            (true, -(index + 1) - BIN_ARRAY_BITMAP_SIZE)
        };
        let offset = offset as usize;
        Ok(ExtensionBitPosition {
            negative,
            chunk: offset / EXTENSION_CHUNK_BITS,
            bit: offset % EXTENSION_CHUNK_BITS,
        })
    }

    fn chunk(&self, position: ExtensionBitPosition) -> &[u64; EXTENSION_CHUNK_WORDS] {
        if position.negative {
            &self.negative_bin_array_bitmap[position.chunk]
        } else {
            &self.positive_bin_array_bitmap[position.chunk]
        }
    }

    fn chunk_mut(&mut self, position: ExtensionBitPosition) -> &mut [u64; EXTENSION_CHUNK_WORDS] {
        if position.negative {
            &mut self.negative_bin_array_bitmap[position.chunk]
        } else {
            &mut self.positive_bin_array_bitmap[position.chunk]
        }
    }

    pub fn bit(&self, index: i64) -> CoreResult<bool> {
        let position = Self::bit_position(index)?;
        multi_word_bitmap::is_bit_set(self.chunk(position), position.bit)
    }

    pub fn set_bit(&mut self, index: i64) -> CoreResult<()> {
        let position = Self::bit_position(index)?;
        multi_word_bitmap::set_bit(self.chunk_mut(position), position.bit)
    }

    pub fn clear_bit(&mut self, index: i64) -> CoreResult<()> {
        let position = Self::bit_position(index)?;
        multi_word_bitmap::clear_bit(self.chunk_mut(position), position.bit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{MAX_BIN_ARRAY_INDEX, MIN_BIN_ARRAY_INDEX};
    use static_assertions::const_assert_eq;
    use std::collections::HashSet;

    const_assert_eq!(std::mem::size_of::<BinArrayBitmapExtension>(), 32 + 2 * 12 * 8 * 8);

    #[test]
    fn test_boundary_positions() {
        let first_positive = BinArrayBitmapExtension::bit_position(512).unwrap();
        assert_eq!(first_positive, ExtensionBitPosition { negative: false, chunk: 0, bit: 0 });

        let first_negative = BinArrayBitmapExtension::bit_position(-513).unwrap();
        assert_eq!(first_negative, ExtensionBitPosition { negative: true, chunk: 0, bit: 0 });

        let last_positive = BinArrayBitmapExtension::bit_position(MAX_BIN_ARRAY_INDEX).unwrap();
        assert_eq!(last_positive, ExtensionBitPosition { negative: false, chunk: 11, bit: 511 });

        let last_negative = BinArrayBitmapExtension::bit_position(MIN_BIN_ARRAY_INDEX).unwrap();
        assert_eq!(last_negative, ExtensionBitPosition { negative: true, chunk: 11, bit: 511 });

        let chunk_edge = BinArrayBitmapExtension::bit_position(512 + 512).unwrap();
        assert_eq!(chunk_edge, ExtensionBitPosition { negative: false, chunk: 1, bit: 0 });
    }

    #[test]
    fn test_rejects_default_and_out_of_bound_indexes() {
        for index in [-512, -1, 0, 511, MAX_BIN_ARRAY_INDEX + 1, MIN_BIN_ARRAY_INDEX - 1] {
            assert_eq!(
                BinArrayBitmapExtension::bit_position(index),
                Err(LbCoreError::BinArrayIndexOutOfBounds(index))
            );
        }
    }

    #[test]
    fn test_mapping_is_injective_over_whole_range() {
        let mut seen = HashSet::new();
        let overflowing = (MIN_BIN_ARRAY_INDEX..-512).chain(512..=MAX_BIN_ARRAY_INDEX);
        for index in overflowing {
            let position = BinArrayBitmapExtension::bit_position(index).unwrap();
            assert!(position.chunk < EXTENSION_BINARRAY_BITMAP_SIZE);
            assert!(position.bit < EXTENSION_CHUNK_BITS);
            assert!(seen.insert(position), "index {} collides", index);
        }
        assert_eq!(seen.len(), 2 * EXTENSION_BINARRAY_BITMAP_SIZE * EXTENSION_CHUNK_BITS);
    }

    #[test]
    fn test_set_and_clear_near_boundary() {
        let mut extension = BinArrayBitmapExtension::new([3; 32]);
        for index in [-515, -514, -513, 512, 513, 514] {
            extension.set_bit(index).unwrap();
            assert!(extension.bit(index).unwrap());
            assert_ne!(extension, BinArrayBitmapExtension::new([3; 32]));
            extension.clear_bit(index).unwrap();
            assert!(!extension.bit(index).unwrap());
        }
        assert_eq!(extension, BinArrayBitmapExtension::new([3; 32]));
    }
}
