//! Ledger-funded deposit into a position opened in the same instruction
//!
//! Opens a position of `2 * bin_delta + 1` bins centred on the active bin
//! through the liquidity book's `initialize_position2`, then deposits the
//! settled ledger amounts exactly like `zap_in_lb`.

use anchor_lang::prelude::*;
use anchor_lang::solana_program::{
    instruction::{AccountMeta, Instruction},
    program::invoke,
};
use anchor_spl::token_interface::{Mint, TokenAccount, TokenInterface};

use crate::constants::{program_id, USER_LEDGER_SEED};
use crate::error::ZapError;
use crate::instructions::zap_in_lb::{deposit_from_ledger, RebalanceAccounts, ZapInLbParameters};
use crate::state::UserLedger;
use crate::utils::{initialize_position_data, new_position_range, require_active_bin_within};

#[derive(Accounts)]
pub struct ZapInLbForNewPosition<'info> {
    #[account(
        mut,
        seeds = [USER_LEDGER_SEED, owner.key().as_ref()],
        bump = ledger.load()?.bump,
        has_one = owner @ ZapError::InvalidLedgerOwner,
    )]
    pub ledger: AccountLoader<'info, UserLedger>,

    /// CHECK: Owner and layout checked in the handler
    #[account(mut, owner = program_id::LB_CLMM @ ZapError::InvalidLbPair)]
    pub lb_pair: UncheckedAccount<'info>,

    /// CHECK: Forwarded to the liquidity book, which validates it
    #[account(mut)]
    pub bin_array_bitmap_extension: Option<UncheckedAccount<'info>>,

    /// Fresh keypair for the new position
    #[account(mut, constraint = position.key() != owner.key() @ ZapError::InvalidPosition)]
    pub position: Signer<'info>,

    #[account(
        mut,
        constraint = user_token_x.mint == token_x_mint.key() @ ZapError::InvalidTokenAccount,
        constraint = user_token_x.owner == owner.key() @ ZapError::InvalidTokenAccount,
    )]
    pub user_token_x: InterfaceAccount<'info, TokenAccount>,

    #[account(
        mut,
        constraint = user_token_y.mint == token_y_mint.key() @ ZapError::InvalidTokenAccount,
        constraint = user_token_y.owner == owner.key() @ ZapError::InvalidTokenAccount,
    )]
    pub user_token_y: InterfaceAccount<'info, TokenAccount>,

    /// CHECK: Matched against the pair
    #[account(mut)]
    pub reserve_x: UncheckedAccount<'info>,

    /// CHECK: Matched against the pair
    #[account(mut)]
    pub reserve_y: UncheckedAccount<'info>,

    pub token_x_mint: InterfaceAccount<'info, Mint>,
    pub token_y_mint: InterfaceAccount<'info, Mint>,

    pub owner: Signer<'info>,

    #[account(mut)]
    pub rent_payer: Signer<'info>,

    pub token_x_program: Interface<'info, TokenInterface>,
    pub token_y_program: Interface<'info, TokenInterface>,

    /// CHECK: Forwarded to the liquidity book, which validates it
    pub memo_program: UncheckedAccount<'info>,

    pub system_program: Program<'info, System>,

    /// CHECK: Forwarded to the liquidity book, which validates it
    pub event_authority: UncheckedAccount<'info>,

    /// CHECK: Address constrained
    #[account(address = program_id::LB_CLMM)]
    pub lb_clmm_program: UncheckedAccount<'info>,
}

impl<'info> ZapInLbForNewPosition<'info> {
    fn rebalance_accounts(&self) -> RebalanceAccounts<'info> {
        RebalanceAccounts {
            position: self.position.to_account_info(),
            lb_pair: self.lb_pair.to_account_info(),
            bin_array_bitmap_extension: self
                .bin_array_bitmap_extension
                .as_ref()
                .map(|extension| extension.to_account_info()),
            user_token_x: self.user_token_x.to_account_info(),
            user_token_y: self.user_token_y.to_account_info(),
            reserve_x: self.reserve_x.to_account_info(),
            reserve_y: self.reserve_y.to_account_info(),
            token_x_mint: self.token_x_mint.to_account_info(),
            token_y_mint: self.token_y_mint.to_account_info(),
            owner: self.owner.to_account_info(),
            rent_payer: self.rent_payer.to_account_info(),
            token_x_program: self.token_x_program.to_account_info(),
            token_y_program: self.token_y_program.to_account_info(),
            memo_program: self.memo_program.to_account_info(),
            system_program: self.system_program.to_account_info(),
            event_authority: self.event_authority.to_account_info(),
            lb_clmm_program: self.lb_clmm_program.to_account_info(),
        }
    }

    fn initialize_position(&self, lower_bin_id: i32, width: i32) -> Result<()> {
        invoke(
            &Instruction {
                program_id: program_id::LB_CLMM,
                accounts: vec![
                    AccountMeta::new(self.rent_payer.key(), true),
                    AccountMeta::new(self.position.key(), true),
                    AccountMeta::new_readonly(self.lb_pair.key(), false),
                    AccountMeta::new_readonly(self.owner.key(), true),
                    AccountMeta::new_readonly(self.system_program.key(), false),
                    AccountMeta::new_readonly(self.event_authority.key(), false),
                    AccountMeta::new_readonly(self.lb_clmm_program.key(), false),
                ],
                data: initialize_position_data(lower_bin_id, width),
            },
            &[
                self.rent_payer.to_account_info(),
                self.position.to_account_info(),
                self.lb_pair.to_account_info(),
                self.owner.to_account_info(),
                self.system_program.to_account_info(),
                self.event_authority.to_account_info(),
                self.lb_clmm_program.to_account_info(),
            ],
        )?;
        Ok(())
    }
}

pub fn handle_zap_in_lb_for_new_position<'c: 'info, 'info>(
    ctx: Context<'_, '_, 'c, 'info, ZapInLbForNewPosition<'info>>,
    bin_delta: u8,
    params: ZapInLbParameters,
) -> Result<()> {
    let position = &ctx.accounts.position;
    require!(
        position.data_is_empty() && *position.owner == System::id(),
        ZapError::InvalidPosition
    );

    let accounts = ctx.accounts.rebalance_accounts();
    let pair = accounts.load_pair()?;
    require_active_bin_within(
        pair.active_id,
        params.expected_active_id,
        params.max_active_bin_slippage,
    )?;
    let (lower_bin_id, width) = new_position_range(pair.active_id, bin_delta)?;

    ctx.accounts.initialize_position(lower_bin_id, width)?;
    msg!(
        "Opened position {} over {} bins from {}",
        ctx.accounts.position.key(),
        width,
        lower_bin_id
    );

    deposit_from_ledger(&accounts, &ctx.accounts.ledger, ctx.remaining_accounts, &params)
}
