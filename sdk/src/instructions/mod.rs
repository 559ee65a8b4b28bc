//! Instruction builders for the zap program

pub mod builder;
pub mod ledger;
pub mod zaps;

pub use builder::ZapInstructionBuilder;
pub use ledger::*;
pub use zaps::*;
