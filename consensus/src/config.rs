//! Engine configuration.
//!
//! Every timing bound the engine relies on lives here rather than in the
//! logic: deployments tune these against committee size and network timing.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// Upper bound on how long a block waits for a missing cross-shard
    /// pledge before processing fails.
    pub pledge_wait_ms: u64,
    /// How long to wait for a leader's proposal at a height before
    /// synthesizing a dummy block.
    pub view_timeout_ms: u64,
    /// Maximum blocks walked along any parent chain before the walk is
    /// declared malformed.
    pub max_traversal_depth: usize,
    /// Past epochs whose committees stay resolvable alongside the newest.
    pub committee_retention_epochs: u64,
}

impl ConsensusConfig {
    pub fn pledge_wait(&self) -> Duration {
        Duration::from_millis(self.pledge_wait_ms)
    }

    pub fn view_timeout(&self) -> Duration {
        Duration::from_millis(self.view_timeout_ms)
    }
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            pledge_wait_ms: 2_000,
            view_timeout_ms: 10_000,
            max_traversal_depth: 10_000,
            committee_retention_epochs: 4,
        }
    }
}
