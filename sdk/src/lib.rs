//! Zap SDK
//!
//! Client-side pieces for zapping into and out of a bin-indexed liquidity
//! book through the zap program:
//! - Instruction builders for the ledger lifecycle and both zap directions
//! - `compose_zap` / `compose_zap_out`, which order those instructions into
//!   one atomic transaction
//! - Bin array discovery for swaps and deposits over any `AccountStore`
//! - A long-lived RPC client wrapper and TOML configuration
pub mod client;
pub mod compose;
pub mod config;
pub mod discovery;
pub mod errors;
pub mod instructions;
pub mod logging;
pub mod pda;
pub mod store;

pub use client::*;
pub use compose::*;
pub use config::*;
pub use errors::*;
pub use store::*;

// Re-export the program types callers need to build parameters
pub use zap::{
    instructions::{ZapInLbParameters, ZapOutParameters},
    utils::{AccountsType, RemainingAccountsInfo, RemainingAccountsSlice, StrategyType, ZapAction},
};

/// Zap program id
pub const ZAP_PROGRAM_ID: solana_sdk::pubkey::Pubkey = zap::ID;
