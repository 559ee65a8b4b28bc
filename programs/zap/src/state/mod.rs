pub mod user_ledger;

pub use user_ledger::*;
