//! # Account Layouts
//!
//! Fixed little-endian records stored behind an 8-byte discriminator. All
//! layouts are `bytemuck::Pod`, contain no implicit padding and decode from
//! unaligned account bytes.

pub mod bin;
pub mod bitmap_extension;
pub mod lb_pair;
pub mod position;

pub use bin::*;
pub use bitmap_extension::*;
pub use lb_pair::*;
pub use position::*;

use bytemuck::Pod;

use crate::errors::{CoreResult, LbCoreError};

/// Length of the account discriminator prefix
pub const DISCRIMINATOR_LEN: usize = 8;

/// A fixed-size account record stored behind a discriminator
pub trait AccountLayout: Pod {
    /// 8-byte account discriminator
    const DISCRIMINATOR: [u8; 8];

    /// Serialized length including the discriminator
    const LEN: usize = DISCRIMINATOR_LEN + std::mem::size_of::<Self>();

    /// Decode a record from account bytes. Trailing bytes are ignored.
    fn decode(data: &[u8]) -> CoreResult<Self> {
        if data.len() < Self::LEN {
            return Err(LbCoreError::InvalidAccountData);
        }
        if data[..DISCRIMINATOR_LEN] != Self::DISCRIMINATOR {
            return Err(LbCoreError::InvalidDiscriminator);
        }
        Ok(bytemuck::pod_read_unaligned(&data[DISCRIMINATOR_LEN..Self::LEN]))
    }

    /// Encode the record with its discriminator
    fn encode(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(Self::LEN);
        data.extend_from_slice(&Self::DISCRIMINATOR);
        data.extend_from_slice(bytemuck::bytes_of(self));
        data
    }
}
