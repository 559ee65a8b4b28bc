//! Settle the ledger with the swap output measured on chain

use anchor_lang::prelude::*;
use anchor_spl::token_interface::TokenAccount;

use crate::constants::USER_LEDGER_SEED;
use crate::error::ZapError;
use crate::events::LedgerSettled;
use crate::state::UserLedger;

#[derive(Accounts)]
pub struct UpdateLedgerBalanceAfterSwap<'info> {
    #[account(
        mut,
        seeds = [USER_LEDGER_SEED, owner.key().as_ref()],
        bump = ledger.load()?.bump,
        has_one = owner @ ZapError::InvalidLedgerOwner,
    )]
    pub ledger: AccountLoader<'info, UserLedger>,

    /// Output-side token account the swap paid into
    #[account(
        constraint = token_account.owner == owner.key() @ ZapError::InvalidTokenAccount,
    )]
    pub token_account: InterfaceAccount<'info, TokenAccount>,

    pub owner: Signer<'info>,
}

pub fn handle_update_ledger_balance_after_swap(
    ctx: Context<UpdateLedgerBalanceAfterSwap>,
    pre_balance: u64,
    max_transfer_amount: u64,
    is_token_a: bool,
) -> Result<()> {
    let current_balance = ctx.accounts.token_account.amount;
    let mut ledger = ctx.accounts.ledger.load_mut()?;
    let realized_delta = ledger.settle(current_balance, pre_balance, max_transfer_amount, is_token_a)?;

    emit!(LedgerSettled {
        ledger: ctx.accounts.ledger.key(),
        owner: ledger.owner,
        realized_delta,
        max_transfer_amount,
        amount_a: ledger.amount_a,
        amount_b: ledger.amount_b,
    });
    msg!(
        "Ledger settled: delta {} (balance {} -> {})",
        realized_delta,
        pre_balance,
        current_balance
    );
    Ok(())
}
