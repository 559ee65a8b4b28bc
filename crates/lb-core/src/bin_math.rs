//! # Bin Indexing
//!
//! Maps signed bin ids onto the bin arrays that hold them and back. Division
//! floors toward negative infinity: bin 0 is the first bin of array 0 while
//! bins `-1..=-array_size` form array -1.

use std::ops::RangeInclusive;

use crate::constants::{MAX_BIN_ARRAY_INDEX, MAX_BIN_ID, MAX_BIN_PER_ARRAY, MIN_BIN_ARRAY_INDEX, MIN_BIN_ID};
use crate::errors::{CoreResult, LbCoreError};
use crate::math::safe_math::{safe_add_i64, safe_cast_i64_to_i32, safe_cast_i64_to_usize, safe_mul_i64, safe_sub_i64};

const ARRAY_SIZE: i64 = MAX_BIN_PER_ARRAY as i64;

/// Array index containing `bin_id` for arrays of `array_size` bins
pub fn array_index_of(bin_id: i64, array_size: i64) -> CoreResult<i64> {
    if array_size <= 0 {
        return Err(LbCoreError::InvalidArraySize);
    }
    if bin_id < 0 {
        // (bin_id + 1) never overflows for a negative bin id
        Ok((bin_id + 1) / array_size - 1)
    } else {
        Ok(bin_id / array_size)
    }
}

/// Inclusive bin id range `(lower, upper)` covered by `array_index`
pub fn bin_range_of(array_index: i64, array_size: i64) -> CoreResult<(i64, i64)> {
    if array_size <= 0 {
        return Err(LbCoreError::InvalidArraySize);
    }
    let lower = safe_mul_i64(array_index, array_size)?;
    let upper = safe_add_i64(lower, array_size - 1)?;
    Ok((lower, upper))
}

/// 0-based slot of `bin_id` inside its array
pub fn within_array_offset(bin_id: i64, array_size: i64) -> CoreResult<usize> {
    let array_index = array_index_of(bin_id, array_size)?;
    let (lower, upper) = bin_range_of(array_index, array_size)?;
    let offset = if bin_id >= 0 {
        safe_sub_i64(bin_id, lower)?
    } else {
        array_size - safe_sub_i64(upper, bin_id)? - 1
    };
    safe_cast_i64_to_usize(offset)
}

// ============================================================================
// Protocol-sized helpers
// ============================================================================

/// Bin array index holding `bin_id`
#[inline]
pub fn bin_id_to_bin_array_index(bin_id: i32) -> i64 {
    // i32 ids and a positive compile-time size cannot fail
    let bin_id = bin_id as i64;
    if bin_id < 0 {
        (bin_id + 1) / ARRAY_SIZE - 1
    } else {
        bin_id / ARRAY_SIZE
    }
}

/// Inclusive bin id bounds of the bin array at `index`
pub fn bin_array_bounds(index: i64) -> CoreResult<(i32, i32)> {
    let (lower, upper) = bin_range_of(index, ARRAY_SIZE)?;
    Ok((safe_cast_i64_to_i32(lower)?, safe_cast_i64_to_i32(upper)?))
}

/// Slot of `bin_id` inside a protocol-sized bin array
pub fn bin_offset_in_array(bin_id: i32) -> CoreResult<usize> {
    within_array_offset(bin_id as i64, ARRAY_SIZE)
}

/// Bin array indices covering the inclusive bin range `[lower_bin_id, upper_bin_id]`
pub fn bin_array_indexes_for_range(
    lower_bin_id: i32,
    upper_bin_id: i32,
) -> CoreResult<RangeInclusive<i64>> {
    if lower_bin_id > upper_bin_id {
        return Err(LbCoreError::InvalidPositionWidth);
    }
    Ok(bin_id_to_bin_array_index(lower_bin_id)..=bin_id_to_bin_array_index(upper_bin_id))
}

/// Whether `bin_id` is inside the supported price range
pub fn is_valid_bin_id(bin_id: i32) -> bool {
    (MIN_BIN_ID..=MAX_BIN_ID).contains(&bin_id)
}

/// Whether `index` is addressable by the base bitmap or the extension
pub fn is_valid_bin_array_index(index: i64) -> bool {
    (MIN_BIN_ARRAY_INDEX..=MAX_BIN_ARRAY_INDEX).contains(&index)
}
