//! Zap-out relay and ledger-funded deposit instructions

use anchor_lang::system_program;
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};
use zap::{accounts, instruction, instructions::ZapInLbParameters, instructions::ZapOutParameters, utils::ZapAction};

use super::ZapInstructionBuilder;
use crate::pda::{derive_event_authority, derive_user_ledger};

/// Accounts of a wrapped swap for the zap-out relay
#[derive(Debug, Clone)]
pub struct RelayedSwap {
    pub action: ZapAction,
    pub amm_program: Pubkey,
    /// The wrapped instruction's own accounts followed by its slice-labelled tail
    pub accounts: Vec<AccountMeta>,
}

pub fn zap_out(
    program_id: &Pubkey,
    user_token_in_account: &Pubkey,
    swap: RelayedSwap,
    params: ZapOutParameters,
) -> Instruction {
    ZapInstructionBuilder::from_anchor(
        *program_id,
        accounts::ZapOutCtx {
            user_token_in_account: *user_token_in_account,
            amm_program: swap.amm_program,
        },
        instruction::ZapOut {
            action: swap.action as u8,
            params,
        },
    )
    .add_accounts(swap.accounts)
    .build()
}

/// Accounts of a liquidity book deposit funded by the ledger
#[derive(Debug, Clone)]
pub struct ZapInLbAccounts {
    pub owner: Pubkey,
    pub lb_program: Pubkey,
    pub lb_pair: Pubkey,
    pub bin_array_bitmap_extension: Option<Pubkey>,
    pub position: Pubkey,
    pub user_token_x: Pubkey,
    pub user_token_y: Pubkey,
    pub reserve_x: Pubkey,
    pub reserve_y: Pubkey,
    pub token_x_mint: Pubkey,
    pub token_y_mint: Pubkey,
    pub token_x_program: Pubkey,
    pub token_y_program: Pubkey,
    pub memo_program: Pubkey,
    /// Transfer-hook accounts then bin arrays, as labelled in the parameters
    pub remaining_accounts: Vec<AccountMeta>,
}

pub fn zap_in_lb(program_id: &Pubkey, zap_accounts: ZapInLbAccounts, params: ZapInLbParameters) -> Instruction {
    let (ledger, _) = derive_user_ledger(program_id, &zap_accounts.owner);
    let (event_authority, _) = derive_event_authority(&zap_accounts.lb_program);
    ZapInstructionBuilder::from_anchor(
        *program_id,
        accounts::ZapInLb {
            ledger,
            lb_pair: zap_accounts.lb_pair,
            bin_array_bitmap_extension: zap_accounts.bin_array_bitmap_extension,
            position: zap_accounts.position,
            user_token_x: zap_accounts.user_token_x,
            user_token_y: zap_accounts.user_token_y,
            reserve_x: zap_accounts.reserve_x,
            reserve_y: zap_accounts.reserve_y,
            token_x_mint: zap_accounts.token_x_mint,
            token_y_mint: zap_accounts.token_y_mint,
            owner: zap_accounts.owner,
            token_x_program: zap_accounts.token_x_program,
            token_y_program: zap_accounts.token_y_program,
            memo_program: zap_accounts.memo_program,
            system_program: system_program::ID,
            event_authority,
            lb_clmm_program: zap_accounts.lb_program,
        },
        instruction::ZapInLb { params },
    )
    .add_accounts(zap_accounts.remaining_accounts)
    .build()
}

/// Deposit into a position opened by the same instruction. `position` in
/// `zap_accounts` is a fresh keypair that must sign the transaction along
/// with `rent_payer`.
pub fn zap_in_lb_for_new_position(
    program_id: &Pubkey,
    zap_accounts: ZapInLbAccounts,
    rent_payer: &Pubkey,
    bin_delta: u8,
    params: ZapInLbParameters,
) -> Instruction {
    let (ledger, _) = derive_user_ledger(program_id, &zap_accounts.owner);
    let (event_authority, _) = derive_event_authority(&zap_accounts.lb_program);
    ZapInstructionBuilder::from_anchor(
        *program_id,
        accounts::ZapInLbForNewPosition {
            ledger,
            lb_pair: zap_accounts.lb_pair,
            bin_array_bitmap_extension: zap_accounts.bin_array_bitmap_extension,
            position: zap_accounts.position,
            user_token_x: zap_accounts.user_token_x,
            user_token_y: zap_accounts.user_token_y,
            reserve_x: zap_accounts.reserve_x,
            reserve_y: zap_accounts.reserve_y,
            token_x_mint: zap_accounts.token_x_mint,
            token_y_mint: zap_accounts.token_y_mint,
            owner: zap_accounts.owner,
            rent_payer: *rent_payer,
            token_x_program: zap_accounts.token_x_program,
            token_y_program: zap_accounts.token_y_program,
            memo_program: zap_accounts.memo_program,
            system_program: system_program::ID,
            event_authority,
            lb_clmm_program: zap_accounts.lb_program,
        },
        instruction::ZapInLbForNewPosition { bin_delta, params },
    )
    .add_accounts(zap_accounts.remaining_accounts)
    .build()
}
