//! # Core Error Types
//!
//! Errors shared by the on-chain program and off-chain clients. Discovery
//! helpers report "not found" as `None`; these errors are for operations that
//! require a specific array, position or value to exist.

use thiserror::Error;

/// Liquidity book errors that can occur in both environments
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub enum LbCoreError {
    // ========================================================================
    // Arithmetic Errors
    // ========================================================================
    #[error("Math overflow")]
    MathOverflow,

    #[error("Math underflow")]
    MathUnderflow,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Type cast failed")]
    TypeCastFailed,

    // ========================================================================
    // Structural Errors
    // ========================================================================
    #[error("Bin array {0} not found")]
    BinArrayNotFound(i64),

    #[error("Bin array {0} already initialized")]
    BinArrayAlreadyInitialized(i64),

    #[error("Bin array index {0} is outside the addressable range")]
    BinArrayIndexOutOfBounds(i64),

    #[error("Bin array {0} requires the bitmap extension")]
    BitmapExtensionRequired(i64),

    #[error("Bitmap extension already initialized")]
    BitmapExtensionAlreadyInitialized,

    #[error("Bin id {0} is outside the position range")]
    BinIdOutOfPositionRange(i32),

    #[error("Bin id {0} is outside the supported range")]
    InvalidBinId(i32),

    #[error("Bin id {bin_id} has no representable price at bin step {bin_step}")]
    BinIdOutOfPriceRange { bin_id: i32, bin_step: u16 },

    #[error("Invalid bin array index")]
    InvalidBinArrayIndex,

    #[error("Invalid position width")]
    InvalidPositionWidth,

    #[error("Invalid array size")]
    InvalidArraySize,

    #[error("Invalid account data")]
    InvalidAccountData,

    #[error("Invalid account discriminator")]
    InvalidDiscriminator,

    // ========================================================================
    // Liquidity Errors
    // ========================================================================
    #[error("Insufficient liquidity")]
    InsufficientLiquidity,

    #[error("Invalid basis points")]
    InvalidBps,

    #[error("Invalid strategy parameters")]
    InvalidStrategyParameters,

    #[error("Bin {0} cannot take that token mix relative to the active bin")]
    InvalidLiquidityDistribution(i32),

    #[error("Position belongs to another pair")]
    PairMismatch,
}

/// Result type using core errors
pub type CoreResult<T> = Result<T, LbCoreError>;
