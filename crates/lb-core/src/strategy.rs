//! # Rebalancing Strategies
//!
//! Shapes a deposit of `(amount_x, amount_y)` over the bins
//! `[active_id + min_delta_id, active_id + max_delta_id]`. Token Y fills the
//! bid side (bins below the active bin) and token X the ask side.
//!
//! A shape is four numbers. On the bid side bin `b` receives
//! `y0 + delta_y * (active_id - b)`; on the ask side it receives
//! `(x0 + delta_x * (b - active_id)) * (1 + bin_step)^-b`.
//! `favor_x_in_active_id` decides which side owns the active bin.

use std::ops::Neg;

use ethnum::U256;

use crate::constants::SCALE_OFFSET;
use crate::errors::{CoreResult, LbCoreError};
use crate::math::price_math::{get_price_base_factor, get_price_from_id, pow};
use crate::math::safe_math::{
    i128_to_u256, safe_add_i128, safe_add_i32, safe_cast_i128_to_u64, safe_cast_u128_to_u64, safe_div_i128, safe_mul_i128,
    safe_sub_i128, safe_sub_i32, u256_to_i128, u256_to_u128,
};

pub const X0_NEG_FLAG: u8 = 0b1;
pub const Y0_NEG_FLAG: u8 = 0b10;
pub const DELTA_X_NEG_FLAG: u8 = 0b100;
pub const DELTA_Y_NEG_FLAG: u8 = 0b1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub enum StrategyType {
    /// Flat value across the range
    Spot,
    /// Concentrated at the active bin, decaying outward
    Curve,
    /// Thin at the active bin, growing outward
    BidAsk,
}

/// Signed distribution shape
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AddLiquidityParams {
    pub x0: i128,
    pub y0: i128,
    pub delta_x: i128,
    pub delta_y: i128,
}

/// Wire form of [`AddLiquidityParams`]: magnitudes plus a sign bit flag
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EncodedAddLiquidityParams {
    pub x0: u64,
    pub y0: u64,
    pub delta_x: u64,
    pub delta_y: u64,
    pub bit_flag: u8,
}

impl AddLiquidityParams {
    pub fn encode(&self) -> CoreResult<EncodedAddLiquidityParams> {
        let mut bit_flag = 0;
        if self.x0 < 0 {
            bit_flag |= X0_NEG_FLAG;
        }
        if self.y0 < 0 {
            bit_flag |= Y0_NEG_FLAG;
        }
        if self.delta_x < 0 {
            bit_flag |= DELTA_X_NEG_FLAG;
        }
        if self.delta_y < 0 {
            bit_flag |= DELTA_Y_NEG_FLAG;
        }

        let magnitude = |value: i128| -> CoreResult<u64> {
            u64::try_from(value.unsigned_abs()).map_err(|_| LbCoreError::TypeCastFailed)
        };

        Ok(EncodedAddLiquidityParams {
            x0: magnitude(self.x0)?,
            y0: magnitude(self.y0)?,
            delta_x: magnitude(self.delta_x)?,
            delta_y: magnitude(self.delta_y)?,
            bit_flag,
        })
    }
}

impl EncodedAddLiquidityParams {
    pub fn decode(&self) -> AddLiquidityParams {
        let signed = |value: u64, flag: u8| -> i128 {
            if self.bit_flag & flag != 0 {
                i128::from(value).neg()
            } else {
                i128::from(value)
            }
        };
        AddLiquidityParams {
            x0: signed(self.x0, X0_NEG_FLAG),
            y0: signed(self.y0, Y0_NEG_FLAG),
            delta_x: signed(self.delta_x, DELTA_X_NEG_FLAG),
            delta_y: signed(self.delta_y, DELTA_Y_NEG_FLAG),
        }
    }
}

/// Inputs for shaping a deposit around the active bin
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RebalancingParams {
    pub amount_x: u64,
    pub amount_y: u64,
    pub active_id: i32,
    pub bin_step: u16,
    pub min_delta_id: i32,
    pub max_delta_id: i32,
    pub favor_x_in_active_id: bool,
    pub strategy: StrategyType,
}

/// `(bid_side_end_delta_id, ask_side_start_delta_id)`
pub fn side_split(favor_x_in_active_id: bool) -> (i32, i32) {
    if favor_x_in_active_id {
        (-1, 0)
    } else {
        (0, 1)
    }
}

impl RebalancingParams {
    pub fn is_only_deposit_y(&self) -> bool {
        self.max_delta_id <= side_split(self.favor_x_in_active_id).0
    }

    pub fn is_only_deposit_x(&self) -> bool {
        self.min_delta_id >= side_split(self.favor_x_in_active_id).1
    }

    /// Signed shape for this deposit
    pub fn shape(&self) -> CoreResult<AddLiquidityParams> {
        if self.min_delta_id > self.max_delta_id {
            return Err(LbCoreError::InvalidStrategyParameters);
        }
        let handler = self.strategy.handler();

        if self.is_only_deposit_y() {
            let (y0, delta_y) =
                handler.find_y0_and_delta_y(self.amount_y, self.min_delta_id, self.max_delta_id)?;
            return Ok(AddLiquidityParams { y0, delta_y, ..Default::default() });
        }

        if self.is_only_deposit_x() {
            let (x0, delta_x) = handler.find_x0_and_delta_x(
                self.amount_x,
                self.min_delta_id,
                self.max_delta_id,
                self.bin_step,
                self.active_id,
            )?;
            return Ok(AddLiquidityParams { x0, delta_x, ..Default::default() });
        }

        let (bid_side_end, ask_side_start) = side_split(self.favor_x_in_active_id);
        let (y0, delta_y) =
            handler.find_y0_and_delta_y(self.amount_y, self.min_delta_id, bid_side_end)?;
        let (x0, delta_x) = handler.find_x0_and_delta_x(
            self.amount_x,
            ask_side_start,
            self.max_delta_id,
            self.bin_step,
            self.active_id,
        )?;
        Ok(AddLiquidityParams { x0, y0, delta_x, delta_y })
    }

    /// Shape in wire form
    pub fn rebalancing_params(&self) -> CoreResult<EncodedAddLiquidityParams> {
        self.shape()?.encode()
    }

    /// Per-bin amounts the shape deposits
    pub fn amounts_in_bins(&self) -> CoreResult<Vec<AmountInBin>> {
        amounts_in_bins(
            self.active_id,
            self.bin_step,
            self.min_delta_id,
            self.max_delta_id,
            self.favor_x_in_active_id,
            &self.shape()?,
        )
    }
}

pub trait StrategyHandler {
    fn find_y0_and_delta_y(
        &self,
        amount_y: u64,
        min_delta_id: i32,
        max_delta_id: i32,
    ) -> CoreResult<(i128, i128)>;

    fn find_x0_and_delta_x(
        &self,
        amount_x: u64,
        min_delta_id: i32,
        max_delta_id: i32,
        bin_step: u16,
        active_id: i32,
    ) -> CoreResult<(i128, i128)>;
}

struct SpotHandler;
struct CurveHandler;
struct BidAskHandler;

impl StrategyType {
    pub fn handler(&self) -> &'static dyn StrategyHandler {
        match self {
            StrategyType::Spot => &SpotHandler,
            StrategyType::Curve => &CurveHandler,
            StrategyType::BidAsk => &BidAskHandler,
        }
    }
}

/// `(1 + b)^-(active_id + delta)` in Q64.64
fn inverse_price(active_id: i32, delta: i32, bin_step: u16) -> CoreResult<U256> {
    let bin_id = safe_add_i32(active_id, delta)?;
    Ok(U256::from(get_price_from_id(bin_id.neg(), bin_step)?))
}

/// Whole range in one bin on the ask side
fn single_ask_bin(amount_x: u64, delta: i32, bin_step: u16, active_id: i32) -> CoreResult<(i128, i128)> {
    let price = inverse_price(active_id, delta, bin_step)?;
    let x0 = (U256::from(amount_x) << SCALE_OFFSET)
        .checked_div(price)
        .ok_or(LbCoreError::DivisionByZero)?;
    Ok((u256_to_i128(x0)?, 0))
}

impl StrategyHandler for SpotHandler {
    fn find_y0_and_delta_y(
        &self,
        amount_y: u64,
        min_delta_id: i32,
        max_delta_id: i32,
    ) -> CoreResult<(i128, i128)> {
        let total_bin = i128::from(max_delta_id) - i128::from(min_delta_id) + 1;
        let y0 = safe_div_i128(i128::from(amount_y), total_bin)?;
        Ok((y0, 0))
    }

    // delta_x is zero, so bin m holds x0 * p(m) and x0 = amount_x / sum(p(m))
    fn find_x0_and_delta_x(
        &self,
        amount_x: u64,
        min_delta_id: i32,
        max_delta_id: i32,
        bin_step: u16,
        active_id: i32,
    ) -> CoreResult<(i128, i128)> {
        if amount_x == 0 || max_delta_id < min_delta_id {
            return Ok((0, 0));
        }
        let mut total_weight = U256::ZERO;
        for delta in min_delta_id..=max_delta_id {
            total_weight = total_weight
                .checked_add(inverse_price(active_id, delta, bin_step)?)
                .ok_or(LbCoreError::MathOverflow)?;
        }
        let x0 = (U256::from(amount_x) << SCALE_OFFSET)
            .checked_div(total_weight)
            .ok_or(LbCoreError::DivisionByZero)?;
        Ok((u256_to_i128(x0)?, 0))
    }
}

impl StrategyHandler for CurveHandler {
    // With m1 = -min_delta_id and m2 = -max_delta_id, bin at distance d holds
    // y0 + delta_y * d. Fixing delta_y = -y0 / m1 empties the outermost bin:
    // y0 = amount_y * m1 / ((m1 - m2 + 1) * m1 - (m1 (m1 + 1) / 2 - m2 (m2 - 1) / 2))
    fn find_y0_and_delta_y(
        &self,
        amount_y: u64,
        min_delta_id: i32,
        max_delta_id: i32,
    ) -> CoreResult<(i128, i128)> {
        if min_delta_id == max_delta_id {
            return Ok((amount_y.into(), 0));
        }
        let m1 = i128::from(min_delta_id).neg();
        let m2 = i128::from(max_delta_id).neg();

        let span = safe_mul_i128(m1 - m2 + 1, m1)?;
        let weights = safe_sub_i128(safe_mul_i128(m1, m1 + 1)? / 2, safe_mul_i128(m2, m2 - 1)? / 2)?;
        let a = safe_sub_i128(span, weights)?;
        let y0 = safe_div_i128(safe_mul_i128(i128::from(amount_y), m1)?, a)?;
        // Round delta_y toward zero first, then rebuild y0 from it so the
        // outermost bin is exactly zero and the total never exceeds amount_y
        let delta_y = safe_div_i128(y0, m1)?.neg();
        let y0 = safe_mul_i128(delta_y, m1)?.neg();
        Ok((y0, delta_y))
    }

    // Bin m holds (x0 + delta_x * m) * p(m) with delta_x = -x0 / m2, so
    // x0 = amount_x / (sum(p(m)) - sum(m * p(m)) / m2)
    fn find_x0_and_delta_x(
        &self,
        amount_x: u64,
        min_delta_id: i32,
        max_delta_id: i32,
        bin_step: u16,
        active_id: i32,
    ) -> CoreResult<(i128, i128)> {
        if min_delta_id < 0 {
            return Err(LbCoreError::InvalidStrategyParameters);
        }
        if min_delta_id == max_delta_id {
            return single_ask_bin(amount_x, min_delta_id, bin_step, active_id);
        }

        let m2 = U256::from(max_delta_id as u32);
        let mut b = U256::ZERO;
        let mut c = U256::ZERO;
        for m in min_delta_id..=max_delta_id {
            let pm = inverse_price(active_id, m, bin_step)?;
            b = b.checked_add(pm).ok_or(LbCoreError::MathOverflow)?;
            let weighted = U256::from(m as u32)
                .checked_mul(pm)
                .ok_or(LbCoreError::MathOverflow)?
                / m2;
            c = c.checked_add(weighted).ok_or(LbCoreError::MathOverflow)?;
        }

        let denominator = b.checked_sub(c).ok_or(LbCoreError::MathUnderflow)?;
        let x0 = (U256::from(amount_x) << SCALE_OFFSET)
            .checked_div(denominator)
            .ok_or(LbCoreError::DivisionByZero)?;
        let x0 = u256_to_i128(x0)?;
        let m2 = i128::from(max_delta_id);
        let delta_x = safe_div_i128(x0, m2)?.neg();
        let x0 = safe_mul_i128(delta_x, m2)?.neg();
        Ok((x0, delta_x))
    }
}

impl StrategyHandler for BidAskHandler {
    // Fixing y0 = -delta_y * m2 empties the bin nearest the active bin:
    // delta_y = amount_y / (-m2 * (m1 - m2 + 1) + (m1 (m1 + 1) / 2 - m2 (m2 - 1) / 2))
    fn find_y0_and_delta_y(
        &self,
        amount_y: u64,
        min_delta_id: i32,
        max_delta_id: i32,
    ) -> CoreResult<(i128, i128)> {
        if min_delta_id == max_delta_id {
            return Ok((amount_y.into(), 0));
        }
        let m1 = i128::from(min_delta_id).neg();
        let m2 = i128::from(max_delta_id).neg();

        let span = safe_mul_i128(m2.neg(), m1 - m2 + 1)?;
        let weights = safe_sub_i128(safe_mul_i128(m1, m1 + 1)? / 2, safe_mul_i128(m2, m2 - 1)? / 2)?;
        let a = safe_add_i128(span, weights)?;
        let delta_y = safe_div_i128(i128::from(amount_y), a)?;
        let y0 = safe_mul_i128(delta_y.neg(), m2)?;
        Ok((y0, delta_y))
    }

    // Fixing x0 = -m1 * delta_x:
    // delta_x = amount_x / (sum(m * p(m)) - m1 * sum(p(m)))
    fn find_x0_and_delta_x(
        &self,
        amount_x: u64,
        min_delta_id: i32,
        max_delta_id: i32,
        bin_step: u16,
        active_id: i32,
    ) -> CoreResult<(i128, i128)> {
        if min_delta_id < 0 {
            return Err(LbCoreError::InvalidStrategyParameters);
        }
        if min_delta_id == max_delta_id {
            return single_ask_bin(amount_x, min_delta_id, bin_step, active_id);
        }

        let m1 = U256::from(min_delta_id as u32);
        let mut b = U256::ZERO;
        let mut c = U256::ZERO;
        for m in min_delta_id..=max_delta_id {
            let pm = inverse_price(active_id, m, bin_step)?;
            b = b
                .checked_add(m1.checked_mul(pm).ok_or(LbCoreError::MathOverflow)?)
                .ok_or(LbCoreError::MathOverflow)?;
            c = c
                .checked_add(U256::from(m as u32).checked_mul(pm).ok_or(LbCoreError::MathOverflow)?)
                .ok_or(LbCoreError::MathOverflow)?;
        }

        let denominator = c.checked_sub(b).ok_or(LbCoreError::MathUnderflow)?;
        let delta_x = (U256::from(amount_x) << SCALE_OFFSET)
            .checked_div(denominator)
            .ok_or(LbCoreError::DivisionByZero)?;
        let delta_x = u256_to_i128(delta_x)?;
        let x0 = safe_mul_i128(delta_x, i128::from(min_delta_id).neg())?;
        Ok((x0, delta_x))
    }
}

// ============================================================================
// Amounts per bin
// ============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AmountInBin {
    pub bin_id: i32,
    pub amount_x: u64,
    pub amount_y: u64,
}

pub fn amounts_in_bins_bid_side(
    active_id: i32,
    min_delta_id: i32,
    max_delta_id: i32,
    delta_y: i128,
    y0: i128,
) -> CoreResult<Vec<AmountInBin>> {
    let min_bin_id = safe_add_i32(active_id, min_delta_id)?;
    let max_bin_id = safe_add_i32(active_id, max_delta_id)?;

    (min_bin_id..=max_bin_id)
        .map(|bin_id| {
            let delta_bin = safe_sub_i32(active_id, bin_id)?;
            let amount_y = safe_add_i128(y0, safe_mul_i128(delta_y, delta_bin.into())?)?;
            Ok(AmountInBin {
                bin_id,
                amount_x: 0,
                amount_y: safe_cast_i128_to_u64(amount_y)?,
            })
        })
        .collect()
}

pub fn amounts_in_bins_ask_side(
    active_id: i32,
    bin_step: u16,
    min_delta_id: i32,
    max_delta_id: i32,
    delta_x: i128,
    x0: i128,
) -> CoreResult<Vec<AmountInBin>> {
    let min_bin_id = safe_add_i32(active_id, min_delta_id)?;
    let max_bin_id = safe_add_i32(active_id, max_delta_id)?;
    if min_bin_id > max_bin_id {
        return Ok(Vec::new());
    }

    let base_factor = get_price_base_factor(bin_step)?;
    let base = U256::from(base_factor);
    // Walk down from the top bin multiplying by the base instead of dividing
    let mut inverse_base_price = U256::from(
        pow(base_factor, max_bin_id.neg()).ok_or(LbCoreError::MathOverflow)?,
    );

    let mut amounts = vec![AmountInBin::default(); (max_bin_id - min_bin_id + 1) as usize];
    for bin_id in (min_bin_id..=max_bin_id).rev() {
        let delta_bin = safe_sub_i32(bin_id, active_id)?;
        let amount_x = i128_to_u256(safe_add_i128(x0, safe_mul_i128(delta_x, delta_bin.into())?)?)?;
        let amount_x = amount_x
            .checked_mul(inverse_base_price)
            .ok_or(LbCoreError::MathOverflow)?
            >> SCALE_OFFSET;
        let amount_x = safe_cast_u128_to_u64(u256_to_u128(amount_x)?)?;

        amounts[(bin_id - min_bin_id) as usize] = AmountInBin {
            bin_id,
            amount_x,
            amount_y: 0,
        };

        inverse_base_price = inverse_base_price
            .checked_mul(base)
            .ok_or(LbCoreError::MathOverflow)?
            >> SCALE_OFFSET;
    }

    Ok(amounts)
}

/// Per-bin amounts produced by `params` over `[min_delta_id, max_delta_id]`
pub fn amounts_in_bins(
    active_id: i32,
    bin_step: u16,
    min_delta_id: i32,
    max_delta_id: i32,
    favor_x_in_active_id: bool,
    params: &AddLiquidityParams,
) -> CoreResult<Vec<AmountInBin>> {
    let (bid_side_end, ask_side_start) = side_split(favor_x_in_active_id);

    if max_delta_id <= bid_side_end {
        return amounts_in_bins_bid_side(active_id, min_delta_id, max_delta_id, params.delta_y, params.y0);
    }
    if min_delta_id >= ask_side_start {
        return amounts_in_bins_ask_side(
            active_id,
            bin_step,
            min_delta_id,
            max_delta_id,
            params.delta_x,
            params.x0,
        );
    }

    let mut amounts =
        amounts_in_bins_bid_side(active_id, min_delta_id, bid_side_end, params.delta_y, params.y0)?;
    amounts.extend(amounts_in_bins_ask_side(
        active_id,
        bin_step,
        ask_side_start,
        max_delta_id,
        params.delta_x,
        params.x0,
    )?);
    Ok(amounts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(
        amount_x: u64,
        amount_y: u64,
        min_delta_id: i32,
        max_delta_id: i32,
        favor_x_in_active_id: bool,
        strategy: StrategyType,
    ) -> RebalancingParams {
        RebalancingParams {
            amount_x,
            amount_y,
            active_id: 100,
            bin_step: 10,
            min_delta_id,
            max_delta_id,
            favor_x_in_active_id,
            strategy,
        }
    }

    fn totals(amounts: &[AmountInBin]) -> (u64, u64) {
        amounts
            .iter()
            .fold((0, 0), |(x, y), bin| (x + bin.amount_x, y + bin.amount_y))
    }

    fn assert_close(expected: u64, actual: u64, max_bps: u64) {
        assert!(actual <= expected, "deposited {} exceeds budget {}", actual, expected);
        let diff_bps = (expected - actual) * 10_000 / expected;
        assert!(diff_bps <= max_bps, "{} vs {} differs by {} bps", expected, actual, diff_bps);
    }

    #[test]
    fn test_sign_encoding() {
        let shape = AddLiquidityParams { x0: -5, y0: 7, delta_x: 3, delta_y: -9 };
        let encoded = shape.encode().unwrap();
        assert_eq!(encoded.bit_flag, X0_NEG_FLAG | DELTA_Y_NEG_FLAG);
        assert_eq!((encoded.x0, encoded.delta_y), (5, 9));
        assert_eq!(encoded.decode(), shape);

        let too_big = AddLiquidityParams { x0: i128::from(u64::MAX) + 1, ..Default::default() };
        assert_eq!(too_big.encode(), Err(LbCoreError::TypeCastFailed));
    }

    #[test]
    fn test_spot_only_y_is_flat() {
        let p = params(0, 1_000_000, -10, -1, true, StrategyType::Spot);
        assert!(p.is_only_deposit_y());
        let amounts = p.amounts_in_bins().unwrap();
        assert_eq!(amounts.len(), 10);
        assert!(amounts.iter().all(|bin| bin.amount_y == 100_000 && bin.amount_x == 0));
        assert_eq!(amounts[0].bin_id, 90);
        assert_eq!(amounts[9].bin_id, 99);
    }

    #[test]
    fn test_spot_only_x_spends_budget() {
        let p = params(50_000_000, 0, 1, 20, false, StrategyType::Spot);
        assert!(p.is_only_deposit_x());
        let amounts = p.amounts_in_bins().unwrap();
        let (x, y) = totals(&amounts);
        assert_eq!(y, 0);
        assert_close(50_000_000, x, 1);
        // Equal value per bin means fewer X where X is priced higher
        assert!(amounts.windows(2).all(|pair| pair[0].amount_x >= pair[1].amount_x));
    }

    #[test]
    fn test_curve_concentrates_at_active_bin() {
        let p = params(10_000_000, 10_000_000, -20, 20, false, StrategyType::Curve);
        let shape = p.shape().unwrap();
        assert!(shape.y0 > 0 && shape.delta_y < 0);
        assert!(shape.x0 > 0 && shape.delta_x < 0);

        let amounts = p.amounts_in_bins().unwrap();
        assert_eq!(amounts.len(), 41);
        let (x, y) = totals(&amounts);
        assert_close(10_000_000, y, 100);
        assert_close(10_000_000, x, 100);

        let bid: Vec<u64> = amounts.iter().filter(|bin| bin.bin_id <= 100).map(|bin| bin.amount_y).collect();
        assert!(bid.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(bid[0], 0);
    }

    #[test]
    fn test_bid_ask_grows_outward() {
        let p = params(10_000_000, 10_000_000, -20, 20, true, StrategyType::BidAsk);
        let shape = p.shape().unwrap();
        assert!(shape.y0 <= 0 && shape.delta_y > 0);
        assert!(shape.x0 <= 0 && shape.delta_x > 0);

        let amounts = p.amounts_in_bins().unwrap();
        let (x, y) = totals(&amounts);
        assert_close(10_000_000, y, 100);
        assert_close(10_000_000, x, 100);

        let bid: Vec<u64> = amounts.iter().filter(|bin| bin.bin_id < 100).map(|bin| bin.amount_y).collect();
        assert!(bid.windows(2).all(|pair| pair[0] >= pair[1]));
        // The active bin belongs to the ask side and starts empty
        let active = amounts.iter().find(|bin| bin.bin_id == 100).unwrap();
        assert_eq!(active.amount_x, 0);
    }

    #[test]
    fn test_single_ask_bin() {
        for strategy in [StrategyType::Spot, StrategyType::Curve, StrategyType::BidAsk] {
            let p = params(100_000_000, 0, 0, 0, true, strategy);
            let amounts = p.amounts_in_bins().unwrap();
            assert_eq!(amounts.len(), 1);
            assert_close(100_000_000, amounts[0].amount_x, 1);
        }
    }

    #[test]
    fn test_inverted_range_rejected() {
        let p = params(1, 1, 5, -5, true, StrategyType::Spot);
        assert_eq!(p.shape(), Err(LbCoreError::InvalidStrategyParameters));
    }
}
