//! # Safe Math Operations
//!
//! Overflow-checked arithmetic for both on-chain and off-chain use.

use ethnum::U256;

use crate::errors::{CoreResult, LbCoreError};

/// Macro to generate safe arithmetic functions
macro_rules! safe_arith {
    // Keyword arms come first, the generic arm would also match them
    // Division operations with zero check
    (div, $fn_name:ident, $type:ty) => {
        #[inline]
        pub fn $fn_name(a: $type, b: $type) -> CoreResult<$type> {
            if b == 0 {
                return Err(LbCoreError::DivisionByZero);
            }
            a.checked_div(b).ok_or(LbCoreError::MathOverflow)
        }
    };

    // Fallible conversions
    (cast, $fn_name:ident, $from_type:ty, $to_type:ty) => {
        #[inline]
        pub fn $fn_name(value: $from_type) -> CoreResult<$to_type> {
            <$to_type>::try_from(value).map_err(|_| LbCoreError::TypeCastFailed)
        }
    };

    // Binary operations with checked methods
    ($fn_name:ident, $type:ty, $checked_method:ident, $error:expr) => {
        #[inline]
        pub fn $fn_name(a: $type, b: $type) -> CoreResult<$type> {
            a.$checked_method(b).ok_or($error)
        }
    };
}

safe_arith!(safe_add_i32, i32, checked_add, LbCoreError::MathOverflow);
safe_arith!(safe_sub_i32, i32, checked_sub, LbCoreError::MathUnderflow);
safe_arith!(safe_mul_i32, i32, checked_mul, LbCoreError::MathOverflow);

safe_arith!(safe_add_i64, i64, checked_add, LbCoreError::MathOverflow);
safe_arith!(safe_sub_i64, i64, checked_sub, LbCoreError::MathUnderflow);
safe_arith!(safe_mul_i64, i64, checked_mul, LbCoreError::MathOverflow);

safe_arith!(safe_add_u64, u64, checked_add, LbCoreError::MathOverflow);
safe_arith!(safe_sub_u64, u64, checked_sub, LbCoreError::MathUnderflow);

safe_arith!(safe_add_u128, u128, checked_add, LbCoreError::MathOverflow);
safe_arith!(safe_sub_u128, u128, checked_sub, LbCoreError::MathUnderflow);
safe_arith!(safe_mul_u128, u128, checked_mul, LbCoreError::MathOverflow);
safe_arith!(div, safe_div_u128, u128);

safe_arith!(safe_add_i128, i128, checked_add, LbCoreError::MathOverflow);
safe_arith!(safe_sub_i128, i128, checked_sub, LbCoreError::MathUnderflow);
safe_arith!(safe_mul_i128, i128, checked_mul, LbCoreError::MathOverflow);
safe_arith!(div, safe_div_i128, i128);

safe_arith!(cast, safe_cast_i64_to_i32, i64, i32);
safe_arith!(cast, safe_cast_i64_to_usize, i64, usize);
safe_arith!(cast, safe_cast_i128_to_u64, i128, u64);
safe_arith!(cast, safe_cast_u128_to_u64, u128, u64);

/// Narrow a 256-bit intermediate back to u128
#[inline]
pub fn u256_to_u128(value: U256) -> CoreResult<u128> {
    if value > U256::from(u128::MAX) {
        return Err(LbCoreError::MathOverflow);
    }
    Ok(value.as_u128())
}

/// Narrow a 256-bit intermediate to a signed i128
#[inline]
pub fn u256_to_i128(value: U256) -> CoreResult<i128> {
    if value > U256::from(i128::MAX as u128) {
        return Err(LbCoreError::TypeCastFailed);
    }
    Ok(value.as_u128() as i128)
}

/// Widen a non-negative i128 into a 256-bit intermediate
#[inline]
pub fn i128_to_u256(value: i128) -> CoreResult<U256> {
    if value < 0 {
        return Err(LbCoreError::TypeCastFailed);
    }
    Ok(U256::from(value as u128))
}

/// `a * b / denominator` rounded down, with a 256-bit intermediate
pub fn safe_mul_div_u128(a: u128, b: u128, denominator: u128) -> CoreResult<u128> {
    if denominator == 0 {
        return Err(LbCoreError::DivisionByZero);
    }
    let product = U256::from(a)
        .checked_mul(U256::from(b))
        .ok_or(LbCoreError::MathOverflow)?;
    u256_to_u128(product / U256::from(denominator))
}

/// Portion of `value` expressed in basis points, rounded down
pub fn safe_calculate_bps(value: u128, bps: u16) -> CoreResult<u128> {
    safe_mul_div_u128(value, bps as u128, crate::constants::BASIS_POINT_MAX as u128)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_ops_report_direction() {
        assert_eq!(safe_add_u128(u128::MAX, 1), Err(LbCoreError::MathOverflow));
        assert_eq!(safe_sub_u128(0, 1), Err(LbCoreError::MathUnderflow));
        assert_eq!(safe_div_u128(1, 0), Err(LbCoreError::DivisionByZero));
        assert_eq!(safe_cast_i128_to_u64(-1), Err(LbCoreError::TypeCastFailed));
    }

    #[test]
    fn test_keyword_arms_generate_named_helpers() {
        assert_eq!(safe_cast_i64_to_i32(-5).unwrap(), -5);
        assert_eq!(safe_cast_i64_to_i32(i64::from(i32::MAX) + 1), Err(LbCoreError::TypeCastFailed));
        assert_eq!(safe_cast_i64_to_usize(-1), Err(LbCoreError::TypeCastFailed));
        assert_eq!(safe_cast_u128_to_u64(u128::from(u64::MAX)).unwrap(), u64::MAX);
        assert_eq!(safe_div_i128(-9, 2).unwrap(), -4);
        assert_eq!(safe_div_i128(1, 0), Err(LbCoreError::DivisionByZero));
        assert_eq!(safe_mul_i32(i32::MAX, 2), Err(LbCoreError::MathOverflow));
    }

    #[test]
    fn test_mul_div_uses_wide_intermediate() {
        // u128::MAX * 2 overflows u128 but the quotient fits
        assert_eq!(safe_mul_div_u128(u128::MAX, 2, 4).unwrap(), u128::MAX / 2);
        assert_eq!(safe_mul_div_u128(u128::MAX, 2, 1), Err(LbCoreError::MathOverflow));
    }

    #[test]
    fn test_bps() {
        assert_eq!(safe_calculate_bps(1_000, 5_000).unwrap(), 500);
        assert_eq!(safe_calculate_bps(999, 5_000).unwrap(), 499);
    }
}
