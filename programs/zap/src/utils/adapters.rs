//! Whitelisted swap adapters
//!
//! A zap-out wraps an opaque swap instruction for one of a fixed set of
//! programs. Each adapter knows the wrapped instruction's discriminator,
//! where its `amount_in` lives in the payload and which account positions
//! hold the source and destination token accounts.

use anchor_lang::prelude::*;

use crate::constants::*;
use crate::error::ZapError;
use crate::utils::AccountsType;

/// Position of the little-endian `amount_in` inside the payload
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AmountOffset {
    /// Bytes from the start of the payload
    Forward(usize),
    /// Bytes from the end of the payload
    FromEnd(usize),
}

impl AmountOffset {
    pub fn resolve(&self, payload_len: usize) -> Result<usize> {
        let offset = match *self {
            AmountOffset::Forward(offset) => offset,
            AmountOffset::FromEnd(offset) => payload_len
                .checked_sub(offset)
                .ok_or(ZapError::InvalidOffset)?,
        };
        require!(
            offset
                .checked_add(8)
                .is_some_and(|end| end <= payload_len),
            ZapError::InvalidOffset
        );
        Ok(offset)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ZapAction {
    LbSwap2 = 0,
    CpSwap = 1,
    AggregatorRoute = 2,
    AggregatorSharedRoute = 3,
}

impl TryFrom<u8> for ZapAction {
    type Error = ZapError;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(ZapAction::LbSwap2),
            1 => Ok(ZapAction::CpSwap),
            2 => Ok(ZapAction::AggregatorRoute),
            3 => Ok(ZapAction::AggregatorSharedRoute),
            _ => Err(ZapError::InvalidAction),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwapAdapter {
    pub program_id: Pubkey,
    pub discriminator: [u8; 8],
    pub amount_offset: AmountOffset,
    pub source_index: usize,
    pub destination_index: usize,
    /// Slice types the wrapped instruction may carry in its tail
    pub slice_types: &'static [AccountsType],
}

const LB_SWAP_SLICE_TYPES: &[AccountsType] = &[
    AccountsType::TransferHookX,
    AccountsType::TransferHookY,
    AccountsType::BinArrays,
];

impl ZapAction {
    pub fn adapter(&self) -> SwapAdapter {
        match self {
            ZapAction::LbSwap2 => SwapAdapter {
                program_id: program_id::LB_CLMM,
                discriminator: LB_SWAP2_DISC,
                amount_offset: AmountOffset::Forward(LB_SWAP2_AMOUNT_IN_OFFSET),
                source_index: LB_SWAP2_SOURCE_ACCOUNT_INDEX,
                destination_index: LB_SWAP2_DESTINATION_ACCOUNT_INDEX,
                slice_types: LB_SWAP_SLICE_TYPES,
            },
            ZapAction::CpSwap => SwapAdapter {
                program_id: program_id::CP_AMM,
                discriminator: CP_SWAP_DISC,
                amount_offset: AmountOffset::Forward(CP_SWAP_AMOUNT_IN_OFFSET),
                source_index: CP_SWAP_SOURCE_ACCOUNT_INDEX,
                destination_index: CP_SWAP_DESTINATION_ACCOUNT_INDEX,
                slice_types: &[],
            },
            ZapAction::AggregatorRoute => SwapAdapter {
                program_id: program_id::AGGREGATOR,
                discriminator: AGGREGATOR_ROUTE_DISC,
                amount_offset: AmountOffset::FromEnd(AGGREGATOR_AMOUNT_IN_REVERSE_OFFSET),
                source_index: AGGREGATOR_ROUTE_SOURCE_ACCOUNT_INDEX,
                destination_index: AGGREGATOR_ROUTE_DESTINATION_ACCOUNT_INDEX,
                slice_types: &[],
            },
            ZapAction::AggregatorSharedRoute => SwapAdapter {
                program_id: program_id::AGGREGATOR,
                discriminator: AGGREGATOR_SHARED_ROUTE_DISC,
                amount_offset: AmountOffset::FromEnd(AGGREGATOR_AMOUNT_IN_REVERSE_OFFSET),
                source_index: AGGREGATOR_SHARED_ROUTE_SOURCE_ACCOUNT_INDEX,
                destination_index: AGGREGATOR_SHARED_ROUTE_DESTINATION_ACCOUNT_INDEX,
                slice_types: &[],
            },
        }
    }

    fn is_aggregator(&self) -> bool {
        matches!(
            self,
            ZapAction::AggregatorRoute | ZapAction::AggregatorSharedRoute
        )
    }
}

impl SwapAdapter {
    /// Reject payloads that do not belong to this adapter
    pub fn validate_payload(&self, action: ZapAction, amm_program: &Pubkey, payload: &[u8]) -> Result<()> {
        require_keys_eq!(*amm_program, self.program_id, ZapError::AmmIsNotSupported);
        require!(
            payload.len() >= 8 && payload[..8] == self.discriminator,
            ZapError::AmmIsNotSupported
        );
        if action.is_aggregator() {
            // Trailing byte is platform_fee_bps, which must be zero
            require!(
                payload.last() == Some(&0),
                ZapError::InvalidZapOutParameters
            );
        }
        Ok(())
    }

    /// Overwrite the wrapped instruction's `amount_in`
    pub fn patch_amount_in(&self, payload: &mut [u8], amount: u64) -> Result<()> {
        let offset = self.amount_offset.resolve(payload.len())?;
        payload[offset..offset + 8].copy_from_slice(&amount.to_le_bytes());
        Ok(())
    }
}
