//! Zap-out relay
//!
//! Runs after a withdrawal in the same transaction. The caller snapshots its
//! input token balance before withdrawing and passes a fully built swap for
//! one of the whitelisted programs. The relay measures how much the balance
//! grew, patches that share into the swap's `amount_in` and forwards the call
//! with the trailing accounts untouched.

use anchor_lang::prelude::*;
use anchor_lang::solana_program::{
    instruction::{AccountMeta, Instruction},
    program::invoke,
};
use anchor_spl::token_interface::TokenAccount;

use crate::constants::{program_id, MAX_PERCENTAGE};
use crate::error::ZapError;
use crate::events::ZapOutExecuted;
use crate::utils::{
    check_relay, parse_trailing_slices, relay_payload, safe_cast_u64, RemainingAccountsInfo, SafeMath,
};

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct ZapOutParameters {
    /// Share of the balance growth to swap, in percent
    pub percentage: u8,
    /// Balance of `user_token_in_account` before the withdrawal
    pub pre_user_token_balance: u64,
    pub max_swap_amount: u64,
    /// Wrapped swap instruction data, discriminator included
    pub payload_data: Vec<u8>,
    pub remaining_accounts_info: RemainingAccountsInfo,
}

impl ZapOutParameters {
    pub fn validate(&self) -> Result<()> {
        require!(
            self.percentage > 0 && self.percentage <= MAX_PERCENTAGE,
            ZapError::InvalidZapOutParameters
        );
        Ok(())
    }

    /// Amount to swap given the balance after the withdrawal. Zero when the
    /// balance did not grow.
    pub fn get_swap_amount(&self, post_user_token_balance: u64) -> Result<u64> {
        if post_user_token_balance <= self.pre_user_token_balance {
            return Ok(0);
        }
        let balance_change = post_user_token_balance.safe_sub(self.pre_user_token_balance)?;
        let share = u128::from(balance_change)
            .safe_mul(u128::from(self.percentage))?
            .safe_div(u128::from(MAX_PERCENTAGE))?;
        Ok(safe_cast_u64(share)?.min(self.max_swap_amount))
    }
}

#[derive(Accounts)]
pub struct ZapOutCtx<'info> {
    #[account(mut)]
    pub user_token_in_account: InterfaceAccount<'info, TokenAccount>,

    /// CHECK: Matched against the selected action's program
    pub amm_program: UncheckedAccount<'info>,
}

pub fn handle_zap_out<'c: 'info, 'info>(
    ctx: Context<'_, '_, 'c, 'info, ZapOutCtx<'info>>,
    action: u8,
    params: ZapOutParameters,
) -> Result<()> {
    let remaining = ctx.remaining_accounts;
    let swap_keys: Vec<Pubkey> = remaining.iter().map(|account| account.key()).collect();
    let (action, adapter) = check_relay(
        action,
        &params,
        ctx.accounts.amm_program.key,
        &ctx.accounts.user_token_in_account.key(),
        &swap_keys,
    )?;

    let (_, parsed) = parse_trailing_slices(
        remaining,
        &params.remaining_accounts_info,
        adapter.slice_types,
    )?;
    if let Some(bin_arrays) = parsed.bin_arrays {
        for bin_array in bin_arrays {
            require_keys_eq!(*bin_array.owner, program_id::LB_CLMM, ZapError::InvalidBinArray);
        }
    }

    let post_balance = ctx.accounts.user_token_in_account.amount;
    let Some((swap_amount, data)) = relay_payload(&params, &adapter, post_balance)? else {
        msg!(
            "Zap out skipped: balance {} -> {}",
            params.pre_user_token_balance,
            post_balance
        );
        return Ok(());
    };

    let accounts = remaining
        .iter()
        .map(|account| AccountMeta {
            pubkey: account.key(),
            is_signer: account.is_signer,
            is_writable: account.is_writable,
        })
        .collect();
    let mut account_infos = remaining.to_vec();
    account_infos.push(ctx.accounts.amm_program.to_account_info());

    invoke(
        &Instruction {
            program_id: adapter.program_id,
            accounts,
            data,
        },
        &account_infos,
    )?;

    emit!(ZapOutExecuted {
        amm_program: adapter.program_id,
        action: action as u8,
        balance_change: post_balance.saturating_sub(params.pre_user_token_balance),
        swap_amount,
    });
    msg!("Zap out swapped {} via action {}", swap_amount, action as u8);
    Ok(())
}
