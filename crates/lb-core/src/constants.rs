//! # Liquidity Book Constants
//!
//! Fixed protocol parameters. They shape the account layouts and the bitmap
//! geometry, so they are compile-time values.

// ============================================================================
// Bin Array Geometry
// ============================================================================

/// Number of bins stored in one bin array
pub const MAX_BIN_PER_ARRAY: usize = 70;

/// Half-width of the bin array index range covered by the pair's base bitmap.
/// The default range is `[-BIN_ARRAY_BITMAP_SIZE, BIN_ARRAY_BITMAP_SIZE - 1]`.
pub const BIN_ARRAY_BITMAP_SIZE: i64 = 512;

/// Number of 64-bit words in the base bitmap (one bit per default-range index)
pub const BASE_BITMAP_WORDS: usize = (2 * BIN_ARRAY_BITMAP_SIZE as usize) / 64;

/// Number of chunks on each side of the bitmap extension
pub const EXTENSION_BINARRAY_BITMAP_SIZE: usize = 12;

/// Words per extension chunk
pub const EXTENSION_CHUNK_WORDS: usize = 8;

/// Bits per extension chunk
pub const EXTENSION_CHUNK_BITS: usize = EXTENSION_CHUNK_WORDS * 64;

/// Smallest bin array index addressable through the extension
pub const MIN_BIN_ARRAY_INDEX: i64 =
    -BIN_ARRAY_BITMAP_SIZE * (EXTENSION_BINARRAY_BITMAP_SIZE as i64 + 1);

/// Largest bin array index addressable through the extension
pub const MAX_BIN_ARRAY_INDEX: i64 =
    BIN_ARRAY_BITMAP_SIZE * (EXTENSION_BINARRAY_BITMAP_SIZE as i64 + 1) - 1;

/// Number of bin arrays a swap instruction supplies as dynamic accounts
pub const MAX_BIN_ARRAYS_PER_SWAP: usize = 4;

// ============================================================================
// Bin Bounds
// ============================================================================

pub const MAX_BIN_ID: i32 = 443_636;
pub const MIN_BIN_ID: i32 = -443_636;

/// Basis point denominator used by bin step and withdrawal shares
pub const BASIS_POINT_MAX: i32 = 10_000;

// ============================================================================
// Position Geometry
// ============================================================================

/// Bins stored inline in the fixed-size position record
pub const DEFAULT_BIN_PER_POSITION: usize = 70;

/// Largest width a position may grow to (inline plus extended region)
pub const POSITION_MAX_LENGTH: usize = 1400;

/// Reward slots tracked per bin and per position bin
pub const NUM_REWARDS: usize = 2;

// ============================================================================
// Fixed Point
// ============================================================================

/// Q64.64 scale
pub const SCALE_OFFSET: u32 = 64;

/// 1.0 in Q64.64
pub const ONE: u128 = 1u128 << SCALE_OFFSET;

/// Exponent bound for `pow`; 19 bits cover every reachable bin id
pub const MAX_EXPONENTIAL: u32 = 0x80000;

// ============================================================================
// Address Seeds
// ============================================================================

pub const BIN_ARRAY_SEED: &[u8] = b"bin_array";
pub const BITMAP_EXTENSION_SEED: &[u8] = b"bitmap";
pub const EVENT_AUTHORITY_SEED: &[u8] = b"__event_authority";
