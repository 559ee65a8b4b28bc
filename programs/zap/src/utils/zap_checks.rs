//! Account-free checks and arithmetic behind the zap handlers
//!
//! The handlers read balances and accounts, call into these and then CPI.
//! Off-chain hosts call the same functions so both agree on every bound.

use anchor_lang::prelude::*;
use lb_core::bin_math::is_valid_bin_id;
use lb_core::strategy::RebalancingParams;

use crate::error::ZapError;
use crate::instructions::{ZapInLbParameters, ZapOutParameters};
use crate::utils::{SafeMath, SwapAdapter, ZapAction};

// ============================================================================
// Zap in
// ============================================================================

pub fn require_active_bin_within(active_id: i32, expected_active_id: i32, max_active_bin_slippage: u16) -> Result<()> {
    let slippage = active_id.abs_diff(expected_active_id);
    if slippage > u32::from(max_active_bin_slippage) {
        msg!(
            "Active bin {} moved {} bins from {}",
            active_id,
            slippage,
            expected_active_id
        );
        return err!(ZapError::ExceededActiveBinSlippage);
    }
    Ok(())
}

/// Strategy parameters spreading the settled `(x, y)` over
/// `[lower_bin_id, upper_bin_id]` around the current active bin
pub fn position_rebalancing(
    amounts: (u64, u64),
    active_id: i32,
    bin_step: u16,
    (lower_bin_id, upper_bin_id): (i32, i32),
    params: &ZapInLbParameters,
) -> Result<RebalancingParams> {
    require!(lower_bin_id <= upper_bin_id, ZapError::InvalidPosition);
    Ok(RebalancingParams {
        amount_x: amounts.0,
        amount_y: amounts.1,
        active_id,
        bin_step,
        min_delta_id: lower_bin_id.safe_sub(active_id)?,
        max_delta_id: upper_bin_id.safe_sub(active_id)?,
        favor_x_in_active_id: params.favor_x_in_active_id,
        strategy: params.strategy.into(),
    })
}

/// What a deposit pulled from the owner's `(x, y)` accounts
pub fn spent_amounts(pre: (u64, u64), post: (u64, u64)) -> (u64, u64) {
    (pre.0.saturating_sub(post.0), pre.1.saturating_sub(post.1))
}

/// `(lower_bin_id, width)` of a fresh position with `bin_delta` bins on each
/// side of `active_id`
pub fn new_position_range(active_id: i32, bin_delta: u8) -> Result<(i32, i32)> {
    let bin_delta = i32::from(bin_delta);
    let lower_bin_id = active_id.safe_sub(bin_delta)?;
    let upper_bin_id = active_id.safe_add(bin_delta)?;
    require!(
        is_valid_bin_id(lower_bin_id) && is_valid_bin_id(upper_bin_id),
        ZapError::InvalidPosition
    );
    let width = bin_delta.safe_mul(2)?.safe_add(1)?;
    Ok((lower_bin_id, width))
}

// ============================================================================
// Zap out
// ============================================================================

/// Validate a zap-out against the accounts it forwards. `swap_accounts` are
/// the wrapped instruction's accounts in order.
pub fn check_relay(
    action: u8,
    params: &ZapOutParameters,
    amm_program: &Pubkey,
    user_token_in: &Pubkey,
    swap_accounts: &[Pubkey],
) -> Result<(ZapAction, SwapAdapter)> {
    params.validate()?;
    let action = ZapAction::try_from(action)?;
    let adapter = action.adapter();
    adapter.validate_payload(action, amm_program, &params.payload_data)?;

    require!(
        swap_accounts.len() > adapter.source_index.max(adapter.destination_index),
        ZapError::InsufficientRemainingAccounts
    );
    require_keys_eq!(
        swap_accounts[adapter.source_index],
        *user_token_in,
        ZapError::InvalidSourceTokenAccount
    );
    Ok((action, adapter))
}

/// Swap amount and the payload patched with it, or `None` when the balance
/// did not grow
pub fn relay_payload(
    params: &ZapOutParameters,
    adapter: &SwapAdapter,
    post_user_token_balance: u64,
) -> Result<Option<(u64, Vec<u8>)>> {
    let swap_amount = params.get_swap_amount(post_user_token_balance)?;
    if swap_amount == 0 {
        return Ok(None);
    }
    let mut data = params.payload_data.clone();
    adapter.patch_amount_in(&mut data, swap_amount)?;
    Ok(Some((swap_amount, data)))
}
