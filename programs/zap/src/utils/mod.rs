/// Helpers shared by the zap instructions: overflow-checked arithmetic,
/// remaining-account slicing, swap adapter descriptions and the hand-built
/// liquidity book CPI.
pub mod adapters;          // Whitelisted swap programs and amount patching
pub mod lb_clmm;           // Rebalance-liquidity CPI interface
pub mod math_safe;         // Overflow-safe arithmetic traits
pub mod remaining_accounts; // Typed slices over trailing accounts
pub mod zap_checks;        // Handler bounds shared with off-chain hosts

pub use adapters::*;
pub use lb_clmm::*;
pub use math_safe::*;
pub use remaining_accounts::*;
pub use zap_checks::*;
