//! The block commitment engine.
//!
//! A leader proposes a block of ordered commands; validators vote; a quorum
//! certificate justifies it; cross-shard pledges gate processing; and the
//! depth-2 three-chain rule commits it together with every uncommitted
//! ancestor, in order. Liveness faults fall back to timeouts: a missed
//! height is filled with a locally synthesized dummy block, a missing
//! pledge bounds its wait and fails the single affected block.
//!
//! ## Module overview
//!
//! - [`engine`] — the state machine driving propose → justify → process →
//!   commit, with `Abandoned` fork pruning.
//! - [`phase`] — per-block lifecycle phases.
//! - [`pledge`] — monotonic high-water marks with cancellable bounded waits.
//! - [`event`] — commit/abandon notifications broadcast to consumers.
//! - [`config`] — timing bounds and traversal limits.
//! - [`error`] — typed engine failures.

pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod phase;
pub mod pledge;

pub use config::ConsensusConfig;
pub use engine::ConsensusEngine;
pub use error::EngineError;
pub use event::ConsensusEvent;
pub use phase::BlockPhase;
pub use pledge::MonotonicWatch;
