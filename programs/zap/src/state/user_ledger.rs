//! User ledger
//!
//! Transaction-scoped bookkeeping that bridges an external swap of unknown
//! output into a deposit of known size. A zap walks the record through
//! `Idle -> Armed -> Settled` and closes it; no step may be skipped.
//!
//! Side A is token X of a liquidity book pair and side B is token Y. The
//! armed side holds the known non-swapped remainder, the other side receives
//! the realized swap output once settled.

use anchor_lang::prelude::*;

use crate::error::ZapError;
use crate::utils::SafeMath;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum LedgerState {
    Idle = 0,
    Armed = 1,
    Settled = 2,
}

impl TryFrom<u8> for LedgerState {
    type Error = ZapError;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(LedgerState::Idle),
            1 => Ok(LedgerState::Armed),
            2 => Ok(LedgerState::Settled),
            _ => Err(ZapError::InvalidLedgerState),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum LedgerSide {
    A = 0,
    B = 1,
}

impl LedgerSide {
    pub fn from_is_token_a(is_token_a: bool) -> Self {
        if is_token_a {
            LedgerSide::A
        } else {
            LedgerSide::B
        }
    }
}

#[account(zero_copy)]
#[derive(Debug, Default)]
pub struct UserLedger {
    pub owner: Pubkey,
    /// Token X in the liquidity book
    pub amount_a: u64,
    /// Token Y in the liquidity book
    pub amount_b: u64,
    /// Output-side balance observed before the external swap
    pub pre_balance: u64,
    /// Bound the realized output was checked against
    pub max_transfer_amount: u64,
    pub armed_side: u8,
    pub state: u8,
    pub bump: u8,
    pub _padding: [u8; 5],
}

impl UserLedger {
    pub const LEN: usize = 8 + std::mem::size_of::<UserLedger>();

    pub fn initialize(&mut self, owner: Pubkey, bump: u8) {
        self.owner = owner;
        self.bump = bump;
        self.state = LedgerState::Idle as u8;
    }

    pub fn ledger_state(&self) -> Result<LedgerState> {
        Ok(LedgerState::try_from(self.state)?)
    }

    fn side_amount_mut(&mut self, side: LedgerSide) -> &mut u64 {
        match side {
            LedgerSide::A => &mut self.amount_a,
            LedgerSide::B => &mut self.amount_b,
        }
    }

    /// Record the input-side remainder and the output-side snapshot
    pub fn arm(&mut self, remainder: u64, pre_balance: u64, is_token_a: bool) -> Result<()> {
        require!(
            self.ledger_state()? != LedgerState::Armed,
            ZapError::LedgerAlreadyArmed
        );

        let side = LedgerSide::from_is_token_a(is_token_a);
        self.amount_a = 0;
        self.amount_b = 0;
        *self.side_amount_mut(side) = remainder;
        self.pre_balance = pre_balance;
        self.max_transfer_amount = 0;
        self.armed_side = side as u8;
        self.state = LedgerState::Armed as u8;
        Ok(())
    }

    /// Measure the swap output on the side opposite the armed one and store
    /// it as the realized delta
    pub fn settle(
        &mut self,
        current_balance: u64,
        pre_balance: u64,
        max_transfer_amount: u64,
        is_token_a: bool,
    ) -> Result<u64> {
        require!(
            self.ledger_state()? == LedgerState::Armed,
            ZapError::LedgerNotArmed
        );
        let side = LedgerSide::from_is_token_a(is_token_a);
        require!(side as u8 != self.armed_side, ZapError::LedgerSideMismatch);
        require!(
            pre_balance == self.pre_balance,
            ZapError::LedgerSnapshotMismatch
        );

        let delta = current_balance.saturating_sub(pre_balance);
        if delta > max_transfer_amount {
            msg!(
                "Realized delta {} exceeds max transfer {}",
                delta,
                max_transfer_amount
            );
            return err!(ZapError::ExceededTransferBound);
        }

        *self.side_amount_mut(side) = delta;
        self.max_transfer_amount = max_transfer_amount;
        self.state = LedgerState::Settled as u8;
        Ok(delta)
    }

    /// `(amount_a, amount_b)` available to the deposit step
    pub fn deposit_amounts(&self) -> Result<(u64, u64)> {
        require!(
            self.ledger_state()? == LedgerState::Settled,
            ZapError::LedgerNotSettled
        );
        Ok((self.amount_a, self.amount_b))
    }

    /// Subtract what a deposit actually pulled from the owner's accounts
    pub fn consume(&mut self, spent_a: u64, spent_b: u64) -> Result<()> {
        require!(
            self.ledger_state()? == LedgerState::Settled,
            ZapError::LedgerNotSettled
        );
        self.amount_a = self.amount_a.safe_sub(spent_a)?;
        self.amount_b = self.amount_b.safe_sub(spent_b)?;
        Ok(())
    }

    pub fn ensure_closable(&self) -> Result<()> {
        require!(
            self.ledger_state()? != LedgerState::Armed,
            ZapError::LedgerNotSettled
        );
        Ok(())
    }
}

// Fixed zero_copy layout
const _: [(); 72] = [(); core::mem::size_of::<UserLedger>()];
