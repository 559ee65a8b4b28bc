//! # Zap
//!
//! Atomic swap-and-deposit helpers for a bin-indexed liquidity book.
//!
//! A zap-in is one transaction of five instructions: arm the owner's ledger,
//! run an arbitrary external swap, settle the ledger with the output measured
//! on chain, deposit the settled amounts and close the ledger. A zap-out
//! withdraws and then relays a swap whose input is patched to the amount the
//! withdrawal actually released.

use anchor_lang::prelude::*;

pub mod constants;
pub mod error;
pub mod events;
pub mod instructions;
pub mod state;
pub mod utils;

#[cfg(test)]
mod tests;

pub use instructions::*;
pub use state::*;
pub use utils::{AccountsType, RemainingAccountsInfo, RemainingAccountsSlice, StrategyType};

declare_id!("zapvX9M3uf5pvy4wRPAbQgdQsM1xmuiFnkfHKPvwMiz");

#[program]
pub mod zap {
    use super::*;

    // Ledger lifecycle
    pub fn initialize_ledger(ctx: Context<InitializeLedger>) -> Result<()> {
        instructions::initialize_ledger::handle_initialize_ledger(ctx)
    }

    pub fn set_ledger_balance(
        ctx: Context<SetLedgerBalance>,
        amount: u64,
        pre_balance: u64,
        is_token_a: bool,
    ) -> Result<()> {
        instructions::set_ledger_balance::handle_set_ledger_balance(ctx, amount, pre_balance, is_token_a)
    }

    pub fn update_ledger_balance_after_swap(
        ctx: Context<UpdateLedgerBalanceAfterSwap>,
        pre_balance: u64,
        max_transfer_amount: u64,
        is_token_a: bool,
    ) -> Result<()> {
        instructions::update_ledger_balance_after_swap::handle_update_ledger_balance_after_swap(
            ctx,
            pre_balance,
            max_transfer_amount,
            is_token_a,
        )
    }

    pub fn close_ledger(ctx: Context<CloseLedger>) -> Result<()> {
        instructions::close_ledger::handle_close_ledger(ctx)
    }

    // Zaps
    pub fn zap_out<'c: 'info, 'info>(
        ctx: Context<'_, '_, 'c, 'info, ZapOutCtx<'info>>,
        action: u8,
        params: ZapOutParameters,
    ) -> Result<()> {
        instructions::zap_out::handle_zap_out(ctx, action, params)
    }

    pub fn zap_in_lb<'c: 'info, 'info>(
        ctx: Context<'_, '_, 'c, 'info, ZapInLb<'info>>,
        params: ZapInLbParameters,
    ) -> Result<()> {
        instructions::zap_in_lb::handle_zap_in_lb(ctx, params)
    }

    pub fn zap_in_lb_for_new_position<'c: 'info, 'info>(
        ctx: Context<'_, '_, 'c, 'info, ZapInLbForNewPosition<'info>>,
        bin_delta: u8,
        params: ZapInLbParameters,
    ) -> Result<()> {
        instructions::zap_in_lb_for_new_position::handle_zap_in_lb_for_new_position(ctx, bin_delta, params)
    }
}
