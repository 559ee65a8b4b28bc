//! Reclaim the ledger once the zap no longer depends on it

use anchor_lang::prelude::*;

use crate::constants::USER_LEDGER_SEED;
use crate::error::ZapError;
use crate::events::LedgerClosed;
use crate::state::UserLedger;

#[derive(Accounts)]
pub struct CloseLedger<'info> {
    #[account(
        mut,
        seeds = [USER_LEDGER_SEED, owner.key().as_ref()],
        bump = ledger.load()?.bump,
        has_one = owner @ ZapError::InvalidLedgerOwner,
        close = rent_receiver,
    )]
    pub ledger: AccountLoader<'info, UserLedger>,

    pub owner: Signer<'info>,

    /// CHECK: Receives the ledger rent
    #[account(mut)]
    pub rent_receiver: UncheckedAccount<'info>,
}

pub fn handle_close_ledger(ctx: Context<CloseLedger>) -> Result<()> {
    ctx.accounts.ledger.load()?.ensure_closable()?;

    emit!(LedgerClosed {
        ledger: ctx.accounts.ledger.key(),
        owner: ctx.accounts.owner.key(),
    });
    Ok(())
}
