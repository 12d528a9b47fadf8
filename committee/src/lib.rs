//! Validator committees and quorum certificate validation.
//!
//! Committee membership is fixed per epoch and keyed by (epoch, shard). The
//! registry is an explicit, versioned lookup passed into validation — never
//! ambient global state — and retains a bounded history window of epochs.
//!
//! ## Module overview
//!
//! - [`committee`] — weighted membership and the 2f+1 quorum threshold.
//! - [`registry`] — epoch/shard-keyed committee lookup with bounded history.
//! - [`leader`] — leader-selection capability queried per (committee, height).
//! - [`qc`] — vote challenges, vote signing, and QC validation.
//! - [`error`] — typed validation failures.

pub mod committee;
pub mod error;
pub mod leader;
pub mod qc;
pub mod registry;

pub use committee::{Committee, CommitteeMember};
pub use error::QcError;
pub use leader::{LeaderStrategy, RoundRobinLeaderStrategy};
pub use qc::{sign_vote, validate_qc, vote_challenge};
pub use registry::EpochCommitteeRegistry;
