//! Error definitions

use anchor_lang::prelude::*;
use lb_core::LbCoreError;

#[error_code]
#[derive(PartialEq)]
pub enum ZapError {
    // Ledger sequencing errors
    #[msg("Ledger is already armed; settle and close it first")]
    LedgerAlreadyArmed,

    #[msg("Ledger has not been armed")]
    LedgerNotArmed,

    #[msg("Ledger has not been settled")]
    LedgerNotSettled,

    #[msg("Settled side must differ from the armed input side")]
    LedgerSideMismatch,

    #[msg("Pre-swap balance does not match the armed snapshot")]
    LedgerSnapshotMismatch,

    #[msg("Ledger belongs to a different owner")]
    InvalidLedgerOwner,

    #[msg("Ledger state tag is not recognized")]
    InvalidLedgerState,

    // Bounds errors
    #[msg("Realized swap output exceeds the declared maximum transfer")]
    ExceededTransferBound,

    #[msg("Active bin moved beyond the accepted slippage")]
    ExceededActiveBinSlippage,

    #[msg("Invalid zap out parameters")]
    InvalidZapOutParameters,

    // Relay errors
    #[msg("AMM program or instruction is not supported")]
    AmmIsNotSupported,

    #[msg("Amount offset is outside the payload")]
    InvalidOffset,

    #[msg("Wrapped swap does not spend the declared source token account")]
    InvalidSourceTokenAccount,

    #[msg("Unknown zap action")]
    InvalidAction,

    #[msg("Invalid remaining account slice")]
    InvalidRemainingAccountSlice,

    #[msg("Insufficient remaining accounts")]
    InsufficientRemainingAccounts,

    #[msg("Same accounts type is provided more than once")]
    DuplicatedRemainingAccountTypes,

    #[msg("Invalid bin array")]
    InvalidBinArray,

    #[msg("Invalid liquidity book pair")]
    InvalidLbPair,

    #[msg("Invalid position")]
    InvalidPosition,

    #[msg("Invalid token account")]
    InvalidTokenAccount,

    #[msg("Deposit range cannot be funded with the settled amounts")]
    InvalidStrategyParameters,

    // Math errors
    #[msg("Math overflow")]
    MathOverflow,

    #[msg("Type cast failed")]
    TypeCastFailed,
}

impl From<LbCoreError> for ZapError {
    fn from(err: LbCoreError) -> Self {
        match err {
            LbCoreError::MathOverflow
            | LbCoreError::MathUnderflow
            | LbCoreError::DivisionByZero => ZapError::MathOverflow,
            LbCoreError::TypeCastFailed => ZapError::TypeCastFailed,
            LbCoreError::BinArrayNotFound(_)
            | LbCoreError::BinArrayIndexOutOfBounds(_)
            | LbCoreError::InvalidBinArrayIndex => ZapError::InvalidBinArray,
            LbCoreError::BinIdOutOfPositionRange(_)
            | LbCoreError::InvalidPositionWidth
            | LbCoreError::InvalidBinId(_)
            | LbCoreError::BinIdOutOfPriceRange { .. } => ZapError::InvalidPosition,
            LbCoreError::InvalidStrategyParameters => ZapError::InvalidStrategyParameters,
            _ => ZapError::InvalidLbPair,
        }
    }
}

/// Convert a core error, logging the original for diagnosis
pub fn core_err(err: LbCoreError) -> Error {
    msg!("Liquidity book error: {}", err);
    ZapError::from(err).into()
}
