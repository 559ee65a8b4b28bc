//! Global constants for the zap program
//!
//! PDA seeds, whitelisted external programs and the wrapped instruction
//! layouts the zap-out relay knows how to patch.

// PDA seed constants
pub const USER_LEDGER_SEED: &[u8] = b"user_ledger";
pub const BIN_ARRAY_SEED: &[u8] = lb_core::BIN_ARRAY_SEED;

// Zap-out constants
pub const MAX_PERCENTAGE: u8 = 100;

/// Aggregator route data ends with amount_in(8) + quoted_out_amount(8) +
/// slippage_bps(2) + platform_fee_bps(1)
pub const AGGREGATOR_AMOUNT_IN_REVERSE_OFFSET: usize = 8 + 8 + 2 + 1;

pub const LB_SWAP2_AMOUNT_IN_OFFSET: usize = 8;
pub const LB_SWAP2_SOURCE_ACCOUNT_INDEX: usize = 4;
pub const LB_SWAP2_DESTINATION_ACCOUNT_INDEX: usize = 5;

pub const CP_SWAP_AMOUNT_IN_OFFSET: usize = 8;
pub const CP_SWAP_SOURCE_ACCOUNT_INDEX: usize = 2;
pub const CP_SWAP_DESTINATION_ACCOUNT_INDEX: usize = 3;

pub const AGGREGATOR_ROUTE_SOURCE_ACCOUNT_INDEX: usize = 2;
pub const AGGREGATOR_ROUTE_DESTINATION_ACCOUNT_INDEX: usize = 4;

pub const AGGREGATOR_SHARED_ROUTE_SOURCE_ACCOUNT_INDEX: usize = 3;
pub const AGGREGATOR_SHARED_ROUTE_DESTINATION_ACCOUNT_INDEX: usize = 6;

// Wrapped instruction discriminators
pub const LB_SWAP2_DISC: [u8; 8] = [65, 75, 63, 76, 235, 91, 91, 136];
pub const LB_INITIALIZE_POSITION2_DISC: [u8; 8] = [143, 19, 242, 145, 213, 15, 104, 115];
pub const LB_REBALANCE_LIQUIDITY_DISC: [u8; 8] = [92, 4, 176, 193, 119, 185, 83, 9];
pub const CP_SWAP_DISC: [u8; 8] = [248, 198, 158, 145, 225, 117, 135, 200];
pub const AGGREGATOR_ROUTE_DISC: [u8; 8] = [229, 23, 203, 151, 122, 227, 173, 42];
pub const AGGREGATOR_SHARED_ROUTE_DISC: [u8; 8] = [193, 32, 155, 51, 65, 214, 156, 129];

// Rebalance constants
/// Shrink neither side of the position while rebalancing
pub const SHRINK_MODE_NONE: u8 = 3;

pub mod program_id {
    use anchor_lang::{prelude::Pubkey, solana_program::pubkey};

    #[cfg(not(feature = "local"))]
    pub const LB_CLMM: Pubkey = pubkey!("LBUZKhRxPF3XUpBCjp4YzTKgLccjZhTSDM9YuVaPwxo");

    #[cfg(feature = "local")]
    pub const LB_CLMM: Pubkey = pubkey!("LbVRzDTvBDEcrthxfZ4RL6yiq3uZw8bS6MwtdY6UhFQ");

    pub const CP_AMM: Pubkey = pubkey!("cpamdpZCGKUy5JxQXB4dcpGPiikHawvSWAd6mEn1sGG");

    pub const AGGREGATOR: Pubkey = pubkey!("JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4");
}
