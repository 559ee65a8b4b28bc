/// Zap program instructions. The ledger instructions bracket an external swap
/// inside one transaction; `zap_out` relays a swap of freshly withdrawn
/// tokens; `zap_in_lb` deposits the settled ledger amounts into a liquidity
/// book position, `zap_in_lb_for_new_position` opens that position first.

// Ledger lifecycle
pub mod initialize_ledger;
pub mod set_ledger_balance;
pub mod update_ledger_balance_after_swap;
pub mod close_ledger;

// Zaps
pub mod zap_out;
pub mod zap_in_lb;
pub mod zap_in_lb_for_new_position;

pub use initialize_ledger::*;
pub use set_ledger_balance::*;
pub use update_ledger_balance_after_swap::*;
pub use close_ledger::*;
pub use zap_out::*;
pub use zap_in_lb::*;
pub use zap_in_lb_for_new_position::*;
