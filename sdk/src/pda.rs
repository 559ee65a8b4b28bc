//! Program-derived addresses used by zaps

use lb_core::{BIN_ARRAY_SEED, BITMAP_EXTENSION_SEED, EVENT_AUTHORITY_SEED};
use solana_sdk::pubkey::Pubkey;
use zap::constants::USER_LEDGER_SEED;

pub fn derive_user_ledger(program_id: &Pubkey, owner: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[USER_LEDGER_SEED, owner.as_ref()], program_id)
}

pub fn derive_bin_array(lb_program: &Pubkey, lb_pair: &Pubkey, index: i64) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[BIN_ARRAY_SEED, lb_pair.as_ref(), &index.to_le_bytes()],
        lb_program,
    )
}

pub fn derive_bitmap_extension(lb_program: &Pubkey, lb_pair: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[BITMAP_EXTENSION_SEED, lb_pair.as_ref()], lb_program)
}

pub fn derive_event_authority(program: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[EVENT_AUTHORITY_SEED], program)
}

/// Associated token account of `owner` for `mint` under `token_program`
pub fn associated_token_account(owner: &Pubkey, mint: &Pubkey, token_program: &Pubkey) -> Pubkey {
    spl_associated_token_account::get_associated_token_address_with_program_id(owner, mint, token_program)
}
