//! # Mathematical Operations
//!
//! Overflow-checked arithmetic and Q64.64 price math used by the liquidity
//! book. Everything here is deterministic and allocation free.

pub mod price_math;
pub mod safe_math;

pub use price_math::*;
pub use safe_math::*;
