//! # Liquidity Book Core
//!
//! Pure logic for a bin-indexed liquidity book, shared between the zap
//! program and off-chain clients. It provides:
//!
//! - Bin to bin-array index arithmetic
//! - Base bitmap and bitmap-extension scanning for liquid bin arrays
//! - Per-bin position liquidity accounting
//! - Fixed binary account layouts for pairs, bin arrays and positions
//! - Rebalancing strategy math used by ledger-funded deposits
//! - A deterministic in-memory liquidity book used as the reference engine
//!
//! ## Feature Flags
//!
//! - `client`: Enables serde derives for off-chain use

pub mod bin_math;
pub mod bitmap;
pub mod book;
pub mod constants;
pub mod errors;
pub mod math;
pub mod position_liquidity;
pub mod state;
pub mod strategy;

// Re-export commonly used items
pub use constants::*;
pub use errors::{CoreResult, LbCoreError};
pub use state::*;
