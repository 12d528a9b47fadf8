//! Versioned committee lookup keyed by (epoch, shard).
//!
//! Populated on epoch transition, retained for a bounded history window so
//! QCs from recent epochs can still be validated, discarded past it.

use crate::Committee;
use std::collections::BTreeMap;
use tracing::debug;
use weft_types::{Epoch, Shard};

/// Default number of past epochs kept alongside the newest one.
pub const DEFAULT_RETENTION_EPOCHS: u64 = 4;

/// Epoch/shard-keyed committee registry with bounded retention.
#[derive(Clone, Debug)]
pub struct EpochCommitteeRegistry {
    retention_epochs: u64,
    committees: BTreeMap<(Epoch, Shard), Committee>,
    newest_epoch: Option<Epoch>,
}

impl EpochCommitteeRegistry {
    pub fn new(retention_epochs: u64) -> Self {
        Self {
            retention_epochs,
            committees: BTreeMap::new(),
            newest_epoch: None,
        }
    }

    /// Register the committee for an (epoch, shard). Prunes every epoch
    /// older than the retention window below the newest registered epoch.
    pub fn register(&mut self, epoch: Epoch, shard: Shard, committee: Committee) {
        self.committees.insert((epoch, shard), committee);
        let newest = self.newest_epoch.map_or(epoch, |e| e.max(epoch));
        self.newest_epoch = Some(newest);

        let cutoff = newest.saturating_sub(self.retention_epochs);
        let before = self.committees.len();
        self.committees.retain(|(e, _), _| *e >= cutoff);
        let pruned = before - self.committees.len();
        if pruned > 0 {
            debug!(%epoch, pruned, "pruned committees outside retention window");
        }
    }

    pub fn get(&self, epoch: Epoch, shard: Shard) -> Option<&Committee> {
        self.committees.get(&(epoch, shard))
    }

    pub fn contains(&self, epoch: Epoch, shard: Shard) -> bool {
        self.committees.contains_key(&(epoch, shard))
    }

    /// The newest epoch ever registered.
    pub fn newest_epoch(&self) -> Option<Epoch> {
        self.newest_epoch
    }

    pub fn len(&self) -> usize {
        self.committees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committees.is_empty()
    }
}

impl Default for EpochCommitteeRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION_EPOCHS)
    }
}
