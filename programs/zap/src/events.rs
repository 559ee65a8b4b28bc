//! Event definitions

use anchor_lang::prelude::*;

/// Emitted when a ledger records the input remainder and output snapshot
#[event]
pub struct LedgerArmed {
    pub ledger: Pubkey,
    pub owner: Pubkey,
    pub remainder: u64,
    pub pre_balance: u64,
    pub is_token_a: bool,
}

/// Emitted once the external swap output has been measured
#[event]
pub struct LedgerSettled {
    pub ledger: Pubkey,
    pub owner: Pubkey,
    pub realized_delta: u64,
    pub max_transfer_amount: u64,
    pub amount_a: u64,
    pub amount_b: u64,
}

#[event]
pub struct LedgerClosed {
    pub ledger: Pubkey,
    pub owner: Pubkey,
}

/// Emitted when the relay forwards a patched swap
#[event]
pub struct ZapOutExecuted {
    pub amm_program: Pubkey,
    pub action: u8,
    pub balance_change: u64,
    pub swap_amount: u64,
}

/// Emitted after a ledger-funded deposit into a liquidity book position
#[event]
pub struct ZapInExecuted {
    pub lb_pair: Pubkey,
    pub position: Pubkey,
    pub active_id: i32,
    pub deposited_x: u64,
    pub deposited_y: u64,
    pub remaining_a: u64,
    pub remaining_b: u64,
}
