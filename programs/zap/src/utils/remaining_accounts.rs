//! Typed slices over trailing accounts
//!
//! Instructions that forward to another program receive a variable number of
//! trailing accounts. The caller labels consecutive runs of them with
//! `(accounts_type, length)` slices so the handler can tell transfer-hook
//! accounts apart from bin arrays without guessing.
//!
//! The first three variants match the liquidity book program's own encoding,
//! so hook slices can be forwarded to it unchanged.

use anchor_lang::prelude::*;

use crate::error::ZapError;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccountsType {
    TransferHookX,
    TransferHookY,
    TransferHookReward,
    BinArrays,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RemainingAccountsSlice {
    pub accounts_type: AccountsType,
    pub length: u8,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct RemainingAccountsInfo {
    pub slices: Vec<RemainingAccountsSlice>,
}

impl RemainingAccountsInfo {
    pub fn total_length(&self) -> usize {
        self.slices.iter().map(|slice| slice.length as usize).sum()
    }
}

/// Accounts grouped by type after parsing
#[derive(Debug, PartialEq, Eq)]
pub struct ParsedRemainingAccounts<'a, T> {
    pub transfer_hook_x: Option<&'a [T]>,
    pub transfer_hook_y: Option<&'a [T]>,
    pub transfer_hook_reward: Option<&'a [T]>,
    pub bin_arrays: Option<&'a [T]>,
}

impl<'a, T> Default for ParsedRemainingAccounts<'a, T> {
    fn default() -> Self {
        Self {
            transfer_hook_x: None,
            transfer_hook_y: None,
            transfer_hook_reward: None,
            bin_arrays: None,
        }
    }
}

impl<'a, T> ParsedRemainingAccounts<'a, T> {
    fn slot(&mut self, accounts_type: AccountsType) -> &mut Option<&'a [T]> {
        match accounts_type {
            AccountsType::TransferHookX => &mut self.transfer_hook_x,
            AccountsType::TransferHookY => &mut self.transfer_hook_y,
            AccountsType::TransferHookReward => &mut self.transfer_hook_reward,
            AccountsType::BinArrays => &mut self.bin_arrays,
        }
    }
}

/// Split `remaining` by `slices`, advancing it past everything consumed.
///
/// Slices of a type outside `valid_types` or repeated types are rejected.
/// Zero-length slices are skipped.
pub fn parse_remaining_accounts<'a, T>(
    remaining: &mut &'a [T],
    slices: &[RemainingAccountsSlice],
    valid_types: &[AccountsType],
) -> Result<ParsedRemainingAccounts<'a, T>> {
    let mut parsed = ParsedRemainingAccounts::default();

    for slice in slices {
        require!(
            valid_types.contains(&slice.accounts_type),
            ZapError::InvalidRemainingAccountSlice
        );
        if slice.length == 0 {
            continue;
        }

        let length = slice.length as usize;
        require!(
            remaining.len() >= length,
            ZapError::InsufficientRemainingAccounts
        );

        let slot = parsed.slot(slice.accounts_type);
        require!(slot.is_none(), ZapError::DuplicatedRemainingAccountTypes);

        let current: &'a [T] = *remaining;
        let (taken, rest) = current.split_at(length);
        *slot = Some(taken);
        *remaining = rest;
    }

    Ok(parsed)
}

/// Parse the slices that describe the tail of `accounts`, returning the
/// untyped head separately
pub fn parse_trailing_slices<'a, T>(
    accounts: &'a [T],
    info: &RemainingAccountsInfo,
    valid_types: &[AccountsType],
) -> Result<(&'a [T], ParsedRemainingAccounts<'a, T>)> {
    let head_len = accounts
        .len()
        .checked_sub(info.total_length())
        .ok_or(ZapError::InsufficientRemainingAccounts)?;
    let (head, mut tail) = accounts.split_at(head_len);
    let parsed = parse_remaining_accounts(&mut tail, &info.slices, valid_types)?;
    Ok((head, parsed))
}
