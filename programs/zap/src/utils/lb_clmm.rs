//! Rebalance-liquidity interface of the liquidity book program
//!
//! The zap program only needs one instruction from the liquidity book, so the
//! argument types are declared here and the instruction is assembled by hand
//! instead of linking the whole program as a CPI crate.

use anchor_lang::prelude::*;
use lb_core::strategy::{EncodedAddLiquidityParams, RebalancingParams};

use crate::constants::{
    program_id, BIN_ARRAY_SEED, LB_INITIALIZE_POSITION2_DISC, LB_REBALANCE_LIQUIDITY_DISC, SHRINK_MODE_NONE,
};
use crate::error::{core_err, ZapError};
use crate::utils::RemainingAccountsInfo;

/// Deposit shape accepted by `zap_in_lb`
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrategyType {
    Spot,
    Curve,
    BidAsk,
}

impl From<StrategyType> for lb_core::strategy::StrategyType {
    fn from(strategy: StrategyType) -> Self {
        match strategy {
            StrategyType::Spot => lb_core::strategy::StrategyType::Spot,
            StrategyType::Curve => lb_core::strategy::StrategyType::Curve,
            StrategyType::BidAsk => lb_core::strategy::StrategyType::BidAsk,
        }
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct AddLiquidityParams {
    pub min_delta_id: i32,
    pub max_delta_id: i32,
    pub x0: u64,
    pub y0: u64,
    pub delta_x: u64,
    pub delta_y: u64,
    pub bit_flag: u8,
    pub favor_x_in_active_id: bool,
    pub padding: [u8; 16],
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct RemoveLiquidityParams {
    pub min_bin_id: Option<i32>,
    pub max_bin_id: Option<i32>,
    pub bps: u16,
    pub padding: [u8; 16],
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct RebalanceLiquidityParams {
    pub active_id: i32,
    pub max_active_bin_slippage: u16,
    pub should_claim_fee: bool,
    pub should_claim_reward: bool,
    pub min_withdraw_x_amount: u64,
    pub max_deposit_x_amount: u64,
    pub min_withdraw_y_amount: u64,
    pub max_deposit_y_amount: u64,
    pub shrink_mode: u8,
    pub padding: [u8; 31],
    pub removes: Vec<RemoveLiquidityParams>,
    pub adds: Vec<AddLiquidityParams>,
}

impl RebalanceLiquidityParams {
    /// Deposit-only rebalance that spreads `rebalancing` over the position
    pub fn deposit(rebalancing: &RebalancingParams, max_active_bin_slippage: u16) -> Result<Self> {
        let EncodedAddLiquidityParams {
            x0,
            y0,
            delta_x,
            delta_y,
            bit_flag,
        } = rebalancing.rebalancing_params().map_err(core_err)?;

        Ok(Self {
            active_id: rebalancing.active_id,
            max_active_bin_slippage,
            should_claim_fee: false,
            should_claim_reward: false,
            min_withdraw_x_amount: 0,
            max_deposit_x_amount: rebalancing.amount_x,
            min_withdraw_y_amount: 0,
            max_deposit_y_amount: rebalancing.amount_y,
            shrink_mode: SHRINK_MODE_NONE,
            padding: [0; 31],
            removes: vec![],
            adds: vec![AddLiquidityParams {
                min_delta_id: rebalancing.min_delta_id,
                max_delta_id: rebalancing.max_delta_id,
                x0,
                y0,
                delta_x,
                delta_y,
                bit_flag,
                favor_x_in_active_id: rebalancing.favor_x_in_active_id,
                padding: [0; 16],
            }],
        })
    }
}

/// Discriminator, rebalance arguments and the forwarded hook slices
pub fn rebalance_liquidity_data(
    params: &RebalanceLiquidityParams,
    hooks: &RemainingAccountsInfo,
) -> Result<Vec<u8>> {
    let mut data = LB_REBALANCE_LIQUIDITY_DISC.to_vec();
    params
        .serialize(&mut data)
        .map_err(|_| ProgramError::InvalidInstructionData)?;
    hooks
        .serialize(&mut data)
        .map_err(|_| ProgramError::InvalidInstructionData)?;
    Ok(data)
}

/// `initialize_position2(lower_bin_id, width)`
pub fn initialize_position_data(lower_bin_id: i32, width: i32) -> Vec<u8> {
    let mut data = LB_INITIALIZE_POSITION2_DISC.to_vec();
    data.extend_from_slice(&lower_bin_id.to_le_bytes());
    data.extend_from_slice(&width.to_le_bytes());
    data
}

/// Bin array PDA of the liquidity book program
pub fn derive_bin_array_pda(lb_pair: &Pubkey, index: i64) -> Pubkey {
    Pubkey::find_program_address(
        &[BIN_ARRAY_SEED, lb_pair.as_ref(), &index.to_le_bytes()],
        &program_id::LB_CLMM,
    )
    .0
}

/// Event authority PDA the liquidity book program logs CPI events through
pub fn derive_event_authority() -> Pubkey {
    Pubkey::find_program_address(&[lb_core::EVENT_AUTHORITY_SEED], &program_id::LB_CLMM).0
}

/// Require a bin array account for every index overlapping
/// `[lower_bin_id, upper_bin_id]`
pub fn require_bin_array_coverage(
    lb_pair: &Pubkey,
    lower_bin_id: i32,
    upper_bin_id: i32,
    bin_array_keys: &[Pubkey],
) -> Result<()> {
    let indexes = lb_core::bin_math::bin_array_indexes_for_range(lower_bin_id, upper_bin_id)
        .map_err(core_err)?;
    for index in indexes {
        let expected = derive_bin_array_pda(lb_pair, index);
        if !bin_array_keys.contains(&expected) {
            msg!("Missing bin array {} ({})", index, expected);
            return err!(ZapError::InvalidBinArray);
        }
    }
    Ok(())
}
