//! Ledger-funded deposit into a liquidity book position
//!
//! Spends the settled ledger amounts (side A as token X, side B as token Y)
//! through the liquidity book's `rebalance_liquidity`, shaped by the chosen
//! strategy over the whole position range. Whatever the deposit did not pull
//! from the owner's accounts stays on the ledger.
//!
//! Remaining accounts: transfer-hook slices for X and Y, then the bin arrays
//! covering the position, labelled by `remaining_accounts_info`.

use anchor_lang::prelude::*;
use anchor_lang::solana_program::{
    instruction::{AccountMeta, Instruction},
    program::invoke,
};
use anchor_spl::token::accessor;
use anchor_spl::token_interface::{Mint, TokenAccount, TokenInterface};
use lb_core::{AccountLayout, LbPairState, PositionHeader};

use crate::constants::{program_id, USER_LEDGER_SEED};
use crate::error::{core_err, ZapError};
use crate::events::ZapInExecuted;
use crate::state::UserLedger;
use crate::utils::{
    parse_trailing_slices, position_rebalancing, rebalance_liquidity_data, require_active_bin_within,
    require_bin_array_coverage, spent_amounts, AccountsType, RebalanceLiquidityParams, RemainingAccountsInfo,
    RemainingAccountsSlice, StrategyType,
};

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct ZapInLbParameters {
    /// Active bin the caller quoted against
    pub expected_active_id: i32,
    pub max_active_bin_slippage: u16,
    pub favor_x_in_active_id: bool,
    pub strategy: StrategyType,
    pub remaining_accounts_info: RemainingAccountsInfo,
}

#[derive(Accounts)]
pub struct ZapInLb<'info> {
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

    /// CHECK: Owner and header checked in the handler
    #[account(mut, owner = program_id::LB_CLMM @ ZapError::InvalidPosition)]
    pub position: UncheckedAccount<'info>,

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

    #[account(mut)]
    pub owner: Signer<'info>,

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

impl<'info> ZapInLb<'info> {
    pub(crate) fn rebalance_accounts(&self) -> RebalanceAccounts<'info> {
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
            rent_payer: self.owner.to_account_info(),
            token_x_program: self.token_x_program.to_account_info(),
            token_y_program: self.token_y_program.to_account_info(),
            memo_program: self.memo_program.to_account_info(),
            system_program: self.system_program.to_account_info(),
            event_authority: self.event_authority.to_account_info(),
            lb_clmm_program: self.lb_clmm_program.to_account_info(),
        }
    }
}

/// Accounts of the liquidity book's `rebalance_liquidity`, gathered from
/// either zap-in context
pub(crate) struct RebalanceAccounts<'info> {
    pub position: AccountInfo<'info>,
    pub lb_pair: AccountInfo<'info>,
    pub bin_array_bitmap_extension: Option<AccountInfo<'info>>,
    pub user_token_x: AccountInfo<'info>,
    pub user_token_y: AccountInfo<'info>,
    pub reserve_x: AccountInfo<'info>,
    pub reserve_y: AccountInfo<'info>,
    pub token_x_mint: AccountInfo<'info>,
    pub token_y_mint: AccountInfo<'info>,
    pub owner: AccountInfo<'info>,
    pub rent_payer: AccountInfo<'info>,
    pub token_x_program: AccountInfo<'info>,
    pub token_y_program: AccountInfo<'info>,
    pub memo_program: AccountInfo<'info>,
    pub system_program: AccountInfo<'info>,
    pub event_authority: AccountInfo<'info>,
    pub lb_clmm_program: AccountInfo<'info>,
}

impl<'info> RebalanceAccounts<'info> {
    pub(crate) fn load_pair(&self) -> Result<LbPairState> {
        let data = self.lb_pair.try_borrow_data()?;
        let pair = LbPairState::decode(&data).map_err(core_err)?;

        for (account, expected) in [
            (&self.reserve_x, pair.reserve_x),
            (&self.reserve_y, pair.reserve_y),
            (&self.token_x_mint, pair.token_x_mint),
            (&self.token_y_mint, pair.token_y_mint),
        ] {
            require_keys_eq!(account.key(), Pubkey::new_from_array(expected), ZapError::InvalidLbPair);
        }
        Ok(pair)
    }

    fn load_position_header(&self) -> Result<PositionHeader> {
        let data = self.position.try_borrow_data()?;
        let header = PositionHeader::read(&data).map_err(core_err)?;
        require_keys_eq!(
            Pubkey::new_from_array(header.lb_pair),
            self.lb_pair.key(),
            ZapError::InvalidPosition
        );
        require_keys_eq!(
            Pubkey::new_from_array(header.owner),
            self.owner.key(),
            ZapError::InvalidPosition
        );
        Ok(header)
    }

    fn user_balances(&self) -> Result<(u64, u64)> {
        Ok((
            accessor::amount(&self.user_token_x)?,
            accessor::amount(&self.user_token_y)?,
        ))
    }

    /// Fixed account list of `rebalance_liquidity`
    fn metas_and_infos(&self) -> (Vec<AccountMeta>, Vec<AccountInfo<'info>>) {
        let extension_meta = match &self.bin_array_bitmap_extension {
            Some(extension) => AccountMeta::new(extension.key(), false),
            None => AccountMeta::new_readonly(program_id::LB_CLMM, false),
        };
        let metas = vec![
            AccountMeta::new(self.position.key(), false),
            AccountMeta::new(self.lb_pair.key(), false),
            extension_meta,
            AccountMeta::new(self.user_token_x.key(), false),
            AccountMeta::new(self.user_token_y.key(), false),
            AccountMeta::new(self.reserve_x.key(), false),
            AccountMeta::new(self.reserve_y.key(), false),
            AccountMeta::new_readonly(self.token_x_mint.key(), false),
            AccountMeta::new_readonly(self.token_y_mint.key(), false),
            AccountMeta::new_readonly(self.owner.key(), true),
            AccountMeta::new(self.rent_payer.key(), true),
            AccountMeta::new_readonly(self.token_x_program.key(), false),
            AccountMeta::new_readonly(self.token_y_program.key(), false),
            AccountMeta::new_readonly(self.memo_program.key(), false),
            AccountMeta::new_readonly(self.system_program.key(), false),
            AccountMeta::new_readonly(self.event_authority.key(), false),
            AccountMeta::new_readonly(self.lb_clmm_program.key(), false),
        ];

        let mut infos = vec![
            self.position.clone(),
            self.lb_pair.clone(),
            self.user_token_x.clone(),
            self.user_token_y.clone(),
            self.reserve_x.clone(),
            self.reserve_y.clone(),
            self.token_x_mint.clone(),
            self.token_y_mint.clone(),
            self.owner.clone(),
            self.rent_payer.clone(),
            self.token_x_program.clone(),
            self.token_y_program.clone(),
            self.memo_program.clone(),
            self.system_program.clone(),
            self.event_authority.clone(),
            self.lb_clmm_program.clone(),
        ];
        if let Some(extension) = &self.bin_array_bitmap_extension {
            infos.push(extension.clone());
        }
        (metas, infos)
    }
}

/// Spend the settled ledger amounts into the position through
/// `rebalance_liquidity` and consume what the owner's accounts paid
pub(crate) fn deposit_from_ledger<'info>(
    accounts: &RebalanceAccounts<'info>,
    ledger: &AccountLoader<'info, UserLedger>,
    remaining_accounts: &[AccountInfo<'info>],
    params: &ZapInLbParameters,
) -> Result<()> {
    let offered = ledger.load()?.deposit_amounts()?;

    let pair = accounts.load_pair()?;
    require_active_bin_within(
        pair.active_id,
        params.expected_active_id,
        params.max_active_bin_slippage,
    )?;

    let header = accounts.load_position_header()?;

    let (_, parsed) = parse_trailing_slices(
        remaining_accounts,
        &params.remaining_accounts_info,
        &[
            AccountsType::TransferHookX,
            AccountsType::TransferHookY,
            AccountsType::BinArrays,
        ],
    )?;
    let bin_arrays = parsed.bin_arrays.ok_or(ZapError::InvalidBinArray)?;
    for bin_array in bin_arrays {
        require_keys_eq!(*bin_array.owner, program_id::LB_CLMM, ZapError::InvalidBinArray);
    }
    let bin_array_keys: Vec<Pubkey> = bin_arrays.iter().map(|account| account.key()).collect();
    require_bin_array_coverage(
        &accounts.lb_pair.key(),
        header.lower_bin_id,
        header.upper_bin_id,
        &bin_array_keys,
    )?;

    let rebalancing = position_rebalancing(
        offered,
        pair.active_id,
        pair.bin_step,
        (header.lower_bin_id, header.upper_bin_id),
        params,
    )?;
    let rebalance = RebalanceLiquidityParams::deposit(&rebalancing, params.max_active_bin_slippage)?;

    // Hooks first in a fixed order, then bin arrays
    let mut hook_info = RemainingAccountsInfo::default();
    let mut forwarded: Vec<AccountInfo<'info>> = Vec::new();
    for (accounts_type, hook_accounts) in [
        (AccountsType::TransferHookX, parsed.transfer_hook_x),
        (AccountsType::TransferHookY, parsed.transfer_hook_y),
    ] {
        if let Some(hook_accounts) = hook_accounts {
            hook_info.slices.push(RemainingAccountsSlice {
                accounts_type,
                length: hook_accounts.len() as u8,
            });
            forwarded.extend_from_slice(hook_accounts);
        }
    }
    forwarded.extend_from_slice(bin_arrays);

    let data = rebalance_liquidity_data(&rebalance, &hook_info)?;
    let (mut metas, mut infos) = accounts.metas_and_infos();
    metas.extend(forwarded.iter().map(|account| AccountMeta {
        pubkey: account.key(),
        is_signer: account.is_signer,
        is_writable: account.is_writable,
    }));
    infos.extend(forwarded);

    let pre = accounts.user_balances()?;
    invoke(
        &Instruction {
            program_id: program_id::LB_CLMM,
            accounts: metas,
            data,
        },
        &infos,
    )?;
    let (spent_x, spent_y) = spent_amounts(pre, accounts.user_balances()?);

    let mut ledger = ledger.load_mut()?;
    ledger.consume(spent_x, spent_y)?;

    emit!(ZapInExecuted {
        lb_pair: accounts.lb_pair.key(),
        position: accounts.position.key(),
        active_id: pair.active_id,
        deposited_x: spent_x,
        deposited_y: spent_y,
        remaining_a: ledger.amount_a,
        remaining_b: ledger.amount_b,
    });
    msg!(
        "Zap in deposited x {} y {} into bins {}..={}",
        spent_x,
        spent_y,
        header.lower_bin_id,
        header.upper_bin_id
    );
    Ok(())
}

pub fn handle_zap_in_lb<'c: 'info, 'info>(
    ctx: Context<'_, '_, 'c, 'info, ZapInLb<'info>>,
    params: ZapInLbParameters,
) -> Result<()> {
    let accounts = ctx.accounts.rebalance_accounts();
    deposit_from_ledger(&accounts, &ctx.accounts.ledger, ctx.remaining_accounts, &params)
}
