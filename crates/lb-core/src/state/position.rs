//! Position layout
//!
//! A position stores `DEFAULT_BIN_PER_POSITION` bins inline. Wider positions
//! append the remaining bins after the fixed record as a u32 little-endian
//! count followed by packed `PositionBinData` entries. [`DynamicPosition`]
//! joins both regions behind one index.

use bytemuck::{Pod, Zeroable};

use crate::bin_math::is_valid_bin_id;
use crate::constants::{DEFAULT_BIN_PER_POSITION, NUM_REWARDS, POSITION_MAX_LENGTH};
use crate::errors::{CoreResult, LbCoreError};
use crate::math::safe_math::{safe_add_i32, safe_sub_i32};
use crate::state::{AccountLayout, DISCRIMINATOR_LEN};

/// Per-bin state of a position
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct PositionBinData {
    pub liquidity_share: u128,
    pub fee_x_pending: u64,
    pub fee_y_pending: u64,
    pub fee_x_per_token_complete: u128,
    pub fee_y_per_token_complete: u128,
    pub reward_pending: [u64; NUM_REWARDS],
    pub reward_per_token_complete: [u128; NUM_REWARDS],
}

impl PositionBinData {
    pub const LEN: usize = std::mem::size_of::<Self>();

    pub fn is_empty(&self) -> bool {
        self.liquidity_share == 0
            && self.fee_x_pending == 0
            && self.fee_y_pending == 0
            && self.reward_pending.iter().all(|pending| *pending == 0)
    }
}

/// Fixed part of a position account
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct PositionState {
    pub lb_pair: [u8; 32],
    pub owner: [u8; 32],
    pub lower_bin_id: i32,
    pub upper_bin_id: i32,
    pub last_updated_at: i64,
    pub bins: [PositionBinData; DEFAULT_BIN_PER_POSITION],
}

impl AccountLayout for PositionState {
    const DISCRIMINATOR: [u8; 8] = [117, 176, 212, 199, 245, 180, 133, 182];
}

/// Leading fields of a position account
///
/// Reading these does not materialize the inline bins, which keeps the read
/// within a small stack frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PositionHeader {
    pub lb_pair: [u8; 32],
    pub owner: [u8; 32],
    pub lower_bin_id: i32,
    pub upper_bin_id: i32,
}

impl PositionHeader {
    pub fn read(data: &[u8]) -> CoreResult<Self> {
        if data.len() < PositionState::LEN {
            return Err(LbCoreError::InvalidAccountData);
        }
        if data[..DISCRIMINATOR_LEN] != PositionState::DISCRIMINATOR {
            return Err(LbCoreError::InvalidDiscriminator);
        }
        let body = &data[DISCRIMINATOR_LEN..];
        let mut lb_pair = [0u8; 32];
        let mut owner = [0u8; 32];
        lb_pair.copy_from_slice(&body[..32]);
        owner.copy_from_slice(&body[32..64]);
        let lower_bin_id = i32::from_le_bytes([body[64], body[65], body[66], body[67]]);
        let upper_bin_id = i32::from_le_bytes([body[68], body[69], body[70], body[71]]);
        if upper_bin_id < lower_bin_id {
            return Err(LbCoreError::InvalidPositionWidth);
        }
        Ok(Self {
            lb_pair,
            owner,
            lower_bin_id,
            upper_bin_id,
        })
    }
}

/// One logical position backed by the inline and extended regions
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DynamicPosition {
    pub state: Box<PositionState>,
    pub extended: Vec<PositionBinData>,
}

impl DynamicPosition {
    /// Open an empty position covering `width` bins starting at `lower_bin_id`
    pub fn new(lb_pair: [u8; 32], owner: [u8; 32], lower_bin_id: i32, width: usize) -> CoreResult<Self> {
        if width == 0 || width > POSITION_MAX_LENGTH {
            return Err(LbCoreError::InvalidPositionWidth);
        }
        let upper_bin_id = safe_add_i32(lower_bin_id, width as i32 - 1)?;
        for bin_id in [lower_bin_id, upper_bin_id] {
            if !is_valid_bin_id(bin_id) {
                return Err(LbCoreError::InvalidBinId(bin_id));
            }
        }

        let mut state = Box::new(PositionState::zeroed());
        state.lb_pair = lb_pair;
        state.owner = owner;
        state.lower_bin_id = lower_bin_id;
        state.upper_bin_id = upper_bin_id;

        Ok(Self {
            state,
            extended: vec![PositionBinData::default(); extended_len_for_width(width)],
        })
    }

    pub fn lower_bin_id(&self) -> i32 {
        self.state.lower_bin_id
    }

    pub fn upper_bin_id(&self) -> i32 {
        self.state.upper_bin_id
    }

    pub fn width(&self) -> usize {
        (self.state.upper_bin_id - self.state.lower_bin_id + 1) as usize
    }

    pub fn contains(&self, bin_id: i32) -> bool {
        (self.state.lower_bin_id..=self.state.upper_bin_id).contains(&bin_id)
    }

    /// Bin at offset `i` from the lower bin, wherever it is stored
    pub fn bin_at(&self, i: usize) -> CoreResult<&PositionBinData> {
        if i >= self.width() {
            return Err(LbCoreError::InvalidPositionWidth);
        }
        if i < DEFAULT_BIN_PER_POSITION {
            Ok(&self.state.bins[i])
        } else {
            self.extended
                .get(i - DEFAULT_BIN_PER_POSITION)
                .ok_or(LbCoreError::InvalidAccountData)
        }
    }

    pub fn bin_at_mut(&mut self, i: usize) -> CoreResult<&mut PositionBinData> {
        if i >= self.width() {
            return Err(LbCoreError::InvalidPositionWidth);
        }
        if i < DEFAULT_BIN_PER_POSITION {
            Ok(&mut self.state.bins[i])
        } else {
            self.extended
                .get_mut(i - DEFAULT_BIN_PER_POSITION)
                .ok_or(LbCoreError::InvalidAccountData)
        }
    }

    fn offset_of(&self, bin_id: i32) -> CoreResult<usize> {
        if !self.contains(bin_id) {
            return Err(LbCoreError::BinIdOutOfPositionRange(bin_id));
        }
        Ok(safe_sub_i32(bin_id, self.state.lower_bin_id)? as usize)
    }

    pub fn bin_for_id(&self, bin_id: i32) -> CoreResult<&PositionBinData> {
        let offset = self.offset_of(bin_id)?;
        self.bin_at(offset)
    }

    pub fn bin_for_id_mut(&mut self, bin_id: i32) -> CoreResult<&mut PositionBinData> {
        let offset = self.offset_of(bin_id)?;
        self.bin_at_mut(offset)
    }

    /// Liquidity share held in `bin_id`, or `None` outside the range
    pub fn liquidity_share(&self, bin_id: i32) -> Option<u128> {
        self.bin_for_id(bin_id).ok().map(|bin| bin.liquidity_share)
    }

    /// All bins with their ids, lower to upper
    pub fn bins(&self) -> impl Iterator<Item = (i32, &PositionBinData)> + '_ {
        let lower = self.state.lower_bin_id;
        self.state
            .bins
            .iter()
            .take(self.width().min(DEFAULT_BIN_PER_POSITION))
            .chain(self.extended.iter())
            .enumerate()
            .map(move |(i, bin)| (lower + i as i32, bin))
    }

    /// Closable once no share or pending amount is left
    pub fn is_empty(&self) -> bool {
        self.bins().all(|(_, bin)| bin.is_empty())
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut data = self.state.encode();
        data.reserve(4 + self.extended.len() * PositionBinData::LEN);
        data.extend_from_slice(&(self.extended.len() as u32).to_le_bytes());
        for bin in &self.extended {
            data.extend_from_slice(bytemuck::bytes_of(bin));
        }
        data
    }

    pub fn decode(data: &[u8]) -> CoreResult<Self> {
        let state = PositionState::decode(data)?;
        let width = state
            .upper_bin_id
            .checked_sub(state.lower_bin_id)
            .and_then(|span| usize::try_from(span).ok())
            .map(|span| span + 1)
            .ok_or(LbCoreError::InvalidPositionWidth)?;
        if width > POSITION_MAX_LENGTH {
            return Err(LbCoreError::InvalidPositionWidth);
        }

        let tail = &data[PositionState::LEN..];
        let extended_len = match tail.get(..4) {
            Some(prefix) => u32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize,
            None => 0,
        };
        if extended_len != extended_len_for_width(width) {
            return Err(LbCoreError::InvalidAccountData);
        }

        let body = tail.get(4..).unwrap_or_default();
        if body.len() < extended_len * PositionBinData::LEN {
            return Err(LbCoreError::InvalidAccountData);
        }
        let extended = body
            .chunks_exact(PositionBinData::LEN)
            .take(extended_len)
            .map(bytemuck::pod_read_unaligned::<PositionBinData>)
            .collect();

        Ok(Self {
            state: Box::new(state),
            extended,
        })
    }
}

/// Bins a position of `width` stores past the inline region
pub fn extended_len_for_width(width: usize) -> usize {
    width.saturating_sub(DEFAULT_BIN_PER_POSITION)
}
