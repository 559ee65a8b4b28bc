/// Overflow-safe arithmetic for ledger amounts and swap percentages. Every
/// failure is logged before it is turned into `ZapError::MathOverflow`, so a
/// failed transaction shows the offending operands.

use anchor_lang::prelude::*;
use crate::error::ZapError;

pub trait SafeMath<T> {
    fn safe_add(self, v: T) -> Result<T>;
    fn safe_sub(self, v: T) -> Result<T>;
    fn safe_mul(self, v: T) -> Result<T>;
    fn safe_div(self, v: T) -> Result<T>;
}

macro_rules! impl_safe_math {
    ($type:ty) => {
        impl SafeMath<$type> for $type {
            fn safe_add(self, v: $type) -> Result<$type> {
                self.checked_add(v).ok_or_else(|| {
                    msg!("Math overflow in safe_add: {} + {}", self, v);
                    ZapError::MathOverflow.into()
                })
            }

            fn safe_sub(self, v: $type) -> Result<$type> {
                self.checked_sub(v).ok_or_else(|| {
                    msg!("Math underflow in safe_sub: {} - {}", self, v);
                    ZapError::MathOverflow.into()
                })
            }

            fn safe_mul(self, v: $type) -> Result<$type> {
                self.checked_mul(v).ok_or_else(|| {
                    msg!("Math overflow in safe_mul: {} * {}", self, v);
                    ZapError::MathOverflow.into()
                })
            }

            fn safe_div(self, v: $type) -> Result<$type> {
                if v == 0 {
                    msg!("Division by zero in safe_div: {} / {}", self, v);
                    return Err(ZapError::MathOverflow.into());
                }
                self.checked_div(v).ok_or_else(|| {
                    msg!("Math error in safe_div: {} / {}", self, v);
                    ZapError::MathOverflow.into()
                })
            }
        }
    };
}

impl_safe_math!(u8);
impl_safe_math!(u16);
impl_safe_math!(u32);
impl_safe_math!(u64);
impl_safe_math!(u128);
impl_safe_math!(i32);
impl_safe_math!(i64);
impl_safe_math!(usize);

/// Narrow a `u128` into `u64`
pub fn safe_cast_u64(value: u128) -> Result<u64> {
    u64::try_from(value).map_err(|_| {
        msg!("Type cast failed: {} does not fit in u64", value);
        ZapError::TypeCastFailed.into()
    })
}
