//! Bin array discovery
//!
//! Swaps need the liquid bin arrays in the direction of travel; deposits need
//! every array overlapping the position. Both come back as writable
//! `AccountMeta`s ready to append as remaining accounts.

use lb_core::{
    bin_math::bin_array_indexes_for_range, bitmap::is_overflow_default_bin_array_bitmap,
    BinArrayBitmapExtension, LbPairState,
};
use solana_sdk::{instruction::AccountMeta, pubkey::Pubkey};
use tracing::debug;

use crate::errors::{SdkError, SdkResult};
use crate::pda::{derive_bin_array, derive_bitmap_extension};
use crate::store::AccountStore;

/// Indexes of the next `count` liquid bin arrays from the active bin. A
/// disabled pair takes no swaps and is reported as an error.
pub fn bin_array_indexes_for_swap<S: AccountStore>(
    store: &S,
    lb_program: &Pubkey,
    lb_pair: &Pubkey,
    swap_for_y: bool,
    count: usize,
) -> SdkResult<Vec<i64>> {
    let pair: LbPairState = store.require(lb_pair)?;
    if !pair.is_enabled() {
        return Err(SdkError::PairDisabled(lb_pair.to_string()));
    }
    let (extension_key, _) = derive_bitmap_extension(lb_program, lb_pair);
    let extension: Option<BinArrayBitmapExtension> = store.decode(&extension_key)?;

    let indexes = pair.bin_array_indexes_for_swap(swap_for_y, extension.as_ref(), count);
    debug!(
        %lb_pair,
        active_id = pair.active_id,
        swap_for_y,
        with_extension = extension.is_some(),
        ?indexes,
        "discovered swap bin arrays"
    );
    Ok(indexes)
}

pub fn bin_arrays_for_swap<S: AccountStore>(
    store: &S,
    lb_program: &Pubkey,
    lb_pair: &Pubkey,
    swap_for_y: bool,
    count: usize,
) -> SdkResult<Vec<AccountMeta>> {
    let indexes = bin_array_indexes_for_swap(store, lb_program, lb_pair, swap_for_y, count)?;
    Ok(indexes
        .into_iter()
        .map(|index| AccountMeta::new(derive_bin_array(lb_program, lb_pair, index).0, false))
        .collect())
}

/// Every bin array overlapping `[lower_bin_id, upper_bin_id]`, lowest first
pub fn bin_arrays_for_range(
    lb_program: &Pubkey,
    lb_pair: &Pubkey,
    lower_bin_id: i32,
    upper_bin_id: i32,
) -> SdkResult<Vec<AccountMeta>> {
    Ok(bin_array_indexes_for_range(lower_bin_id, upper_bin_id)?
        .map(|index| AccountMeta::new(derive_bin_array(lb_program, lb_pair, index).0, false))
        .collect())
}

/// The bitmap extension address when the range reaches past the base bitmap
pub fn bitmap_extension_for_range(
    lb_program: &Pubkey,
    lb_pair: &Pubkey,
    lower_bin_id: i32,
    upper_bin_id: i32,
) -> SdkResult<Option<Pubkey>> {
    let needs_extension = bin_array_indexes_for_range(lower_bin_id, upper_bin_id)?
        .any(is_overflow_default_bin_array_bitmap);
    Ok(needs_extension.then(|| derive_bitmap_extension(lb_program, lb_pair).0))
}
