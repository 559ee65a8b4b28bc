//! Ledger lifecycle instructions

use anchor_lang::system_program;
use solana_sdk::{instruction::Instruction, pubkey::Pubkey};
use zap::{accounts, instruction};

use super::ZapInstructionBuilder;
use crate::pda::derive_user_ledger;

pub fn initialize_ledger(program_id: &Pubkey, owner: &Pubkey) -> Instruction {
    let (ledger, _) = derive_user_ledger(program_id, owner);
    ZapInstructionBuilder::from_anchor(
        *program_id,
        accounts::InitializeLedger {
            ledger,
            owner: *owner,
            system_program: system_program::ID,
        },
        instruction::InitializeLedger {},
    )
    .build()
}

/// Arm the ledger with the input-side `remainder` and the output-side
/// `pre_balance`
pub fn set_ledger_balance(
    program_id: &Pubkey,
    owner: &Pubkey,
    remainder: u64,
    pre_balance: u64,
    is_token_a: bool,
) -> Instruction {
    let (ledger, _) = derive_user_ledger(program_id, owner);
    ZapInstructionBuilder::from_anchor(
        *program_id,
        accounts::SetLedgerBalance {
            ledger,
            owner: *owner,
        },
        instruction::SetLedgerBalance {
            amount: remainder,
            pre_balance,
            is_token_a,
        },
    )
    .build()
}

/// Settle the ledger from `token_account`, the output side of the swap
pub fn update_ledger_balance_after_swap(
    program_id: &Pubkey,
    owner: &Pubkey,
    token_account: &Pubkey,
    pre_balance: u64,
    max_transfer_amount: u64,
    is_token_a: bool,
) -> Instruction {
    let (ledger, _) = derive_user_ledger(program_id, owner);
    ZapInstructionBuilder::from_anchor(
        *program_id,
        accounts::UpdateLedgerBalanceAfterSwap {
            ledger,
            token_account: *token_account,
            owner: *owner,
        },
        instruction::UpdateLedgerBalanceAfterSwap {
            pre_balance,
            max_transfer_amount,
            is_token_a,
        },
    )
    .build()
}

pub fn close_ledger(program_id: &Pubkey, owner: &Pubkey, rent_receiver: &Pubkey) -> Instruction {
    let (ledger, _) = derive_user_ledger(program_id, owner);
    ZapInstructionBuilder::from_anchor(
        *program_id,
        accounts::CloseLedger {
            ledger,
            owner: *owner,
            rent_receiver: *rent_receiver,
        },
        instruction::CloseLedger {},
    )
    .build()
}
