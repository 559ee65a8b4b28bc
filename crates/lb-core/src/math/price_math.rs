//! # Price Math
//!
//! Bin prices are `(1 + bin_step / BASIS_POINT_MAX) ^ bin_id` in Q64.64.
//! Exponentiation works on a base below 1.0 so every intermediate square fits
//! in u128; bases at or above 1.0 are inverted first and the result inverted
//! back at the end.

use ethnum::U256;

use crate::bin_math::is_valid_bin_id;
use crate::constants::{BASIS_POINT_MAX, MAX_EXPONENTIAL, ONE, SCALE_OFFSET};
use crate::errors::{CoreResult, LbCoreError};
use crate::math::safe_math::u256_to_u128;

/// `base ^ exp` with `base` in Q64.64. Returns `None` when the exponent is out
/// of range or the result underflows to zero.
pub fn pow(base: u128, exp: i32) -> Option<u128> {
    if exp == 0 {
        return Some(ONE);
    }

    let mut invert = exp.is_negative();
    let exp = exp.unsigned_abs();
    if exp >= MAX_EXPONENTIAL {
        return None;
    }

    let mut squared_base = base;
    let mut result = ONE;

    if squared_base >= result {
        squared_base = u128::MAX.checked_div(squared_base)?;
        invert = !invert;
    }

    // 19 bits cover every exponent below MAX_EXPONENTIAL
    for bit in 0..19u32 {
        if exp & (1 << bit) != 0 {
            result = result.checked_mul(squared_base)? >> SCALE_OFFSET;
        }
        squared_base = squared_base.checked_mul(squared_base)? >> SCALE_OFFSET;
    }

    if result == 0 {
        return None;
    }

    if invert {
        result = u128::MAX.checked_div(result)?;
    }

    Some(result)
}

/// `1 + bin_step / BASIS_POINT_MAX` in Q64.64
pub fn get_price_base_factor(bin_step: u16) -> CoreResult<u128> {
    let bps = (bin_step as u128) << SCALE_OFFSET;
    let fraction = bps / BASIS_POINT_MAX as u128;
    ONE.checked_add(fraction).ok_or(LbCoreError::MathOverflow)
}

/// Price of `bin_id` in Q64.64 (token Y per token X)
pub fn get_price_from_id(bin_id: i32, bin_step: u16) -> CoreResult<u128> {
    let base = get_price_base_factor(bin_step)?;
    pow(base, bin_id).ok_or(LbCoreError::MathOverflow)
}

/// Reject a bin whose price does not fit Q64.64 at `bin_step`. Prices grow
/// away from bin 0 on both sides, so checking a range's endpoints covers it.
pub fn require_priced_bin(bin_id: i32, bin_step: u16) -> CoreResult<()> {
    let base = get_price_base_factor(bin_step)?;
    if !is_valid_bin_id(bin_id) || pow(base, bin_id).is_none() {
        return Err(LbCoreError::BinIdOutOfPriceRange { bin_id, bin_step });
    }
    Ok(())
}

/// Normalised liquidity of an `(x, y)` pair at `price`:
/// `(x * price + (y << 64)) >> 64`, i.e. the pair's value in token Y.
pub fn get_liquidity(amount_x: u128, amount_y: u128, price: u128) -> CoreResult<u128> {
    let x_value = U256::from(amount_x)
        .checked_mul(U256::from(price))
        .ok_or(LbCoreError::MathOverflow)?;
    let y_value = U256::from(amount_y) << SCALE_OFFSET;
    let total = x_value
        .checked_add(y_value)
        .ok_or(LbCoreError::MathOverflow)?;
    u256_to_u128(total >> SCALE_OFFSET)
}
