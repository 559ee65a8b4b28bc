//! Create the owner's ledger PDA in the `Idle` state

use anchor_lang::prelude::*;

use crate::constants::USER_LEDGER_SEED;
use crate::state::UserLedger;

#[derive(Accounts)]
pub struct InitializeLedger<'info> {
    #[account(
        init,
        payer = owner,
        space = UserLedger::LEN,
        seeds = [USER_LEDGER_SEED, owner.key().as_ref()],
        bump,
    )]
    pub ledger: AccountLoader<'info, UserLedger>,

    #[account(mut)]
    pub owner: Signer<'info>,

    pub system_program: Program<'info, System>,
}

pub fn handle_initialize_ledger(ctx: Context<InitializeLedger>) -> Result<()> {
    let mut ledger = ctx.accounts.ledger.load_init()?;
    ledger.initialize(ctx.accounts.owner.key(), ctx.bumps.ledger);
    msg!("Ledger initialized for {}", ctx.accounts.owner.key());
    Ok(())
}
