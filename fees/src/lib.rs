//! Fee settlement for the weft validator core.
//!
//! A transaction's fee is settled exactly once, as a breakdown of amounts
//! keyed by fee source; the breakdown's sum is the transaction's final fee.
//! Leader fees earned by proposing committed blocks accumulate separately
//! per proposer.

pub mod breakdown;
pub mod error;
pub mod ledger;

pub use breakdown::{FeeBreakdown, FeeSource};
pub use error::FeeError;
pub use ledger::FeeLedger;
