//! Arm the ledger before an external swap
//!
//! `amount` is the known remainder on the input side (the part of the input
//! that will not be swapped); `pre_balance` is the owner's output-side token
//! balance right before the swap executes.

use anchor_lang::prelude::*;

use crate::constants::USER_LEDGER_SEED;
use crate::error::ZapError;
use crate::events::LedgerArmed;
use crate::state::UserLedger;

#[derive(Accounts)]
pub struct SetLedgerBalance<'info> {
    #[account(
        mut,
        seeds = [USER_LEDGER_SEED, owner.key().as_ref()],
        bump = ledger.load()?.bump,
        has_one = owner @ ZapError::InvalidLedgerOwner,
    )]
    pub ledger: AccountLoader<'info, UserLedger>,

    pub owner: Signer<'info>,
}

pub fn handle_set_ledger_balance(
    ctx: Context<SetLedgerBalance>,
    amount: u64,
    pre_balance: u64,
    is_token_a: bool,
) -> Result<()> {
    let mut ledger = ctx.accounts.ledger.load_mut()?;
    ledger.arm(amount, pre_balance, is_token_a)?;

    emit!(LedgerArmed {
        ledger: ctx.accounts.ledger.key(),
        owner: ledger.owner,
        remainder: amount,
        pre_balance,
        is_token_a,
    });
    msg!(
        "Ledger armed: remainder {} on side {}, snapshot {}",
        amount,
        if is_token_a { "A" } else { "B" },
        pre_balance
    );
    Ok(())
}
