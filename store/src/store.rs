//! Append-only arena of blocks keyed by id.
//!
//! The store is the single owner of every `Block` record. Consensus holds
//! ids, never copies: flag mutation goes through the store so the two-phase
//! invariant (`is_committed ⇒ is_processed`) is enforced in one place.

use crate::{Block, StoreError};
use std::collections::HashMap;
use tracing::debug;
use weft_types::{BlockId, Epoch, Network, Shard, Timestamp};

/// In-memory block DAG with height/shard indexes and bounded ancestor walks.
///
/// Writes require exclusive access; reads of the committed prefix may run
/// concurrently with writes to the uncommitted tail (callers arrange this
/// with an outer read-write lock).
#[derive(Debug)]
pub struct BlockStore {
    network: Network,
    max_traversal_depth: usize,
    blocks: HashMap<BlockId, Block>,
    children: HashMap<BlockId, Vec<BlockId>>,
    committed_tips: HashMap<Shard, BlockId>,
}

impl BlockStore {
    pub fn new(network: Network, max_traversal_depth: usize) -> Self {
        Self {
            network,
            max_traversal_depth,
            blocks: HashMap::new(),
            children: HashMap::new(),
            committed_tips: HashMap::new(),
        }
    }

    /// Insert a block.
    ///
    /// Fails with `DuplicateBlock` if the id exists, `OrphanBlock` if the
    /// parent is unknown (non-genesis), and `HeightMismatch` if a non-dummy
    /// block does not sit directly above its parent. Genesis blocks insert
    /// committed and become the shard's committed tip.
    pub fn insert(&mut self, block: Block) -> Result<BlockId, StoreError> {
        let id = *block.id();

        if block.network() != self.network {
            return Err(StoreError::NetworkMismatch {
                block: id,
                expected: self.network,
                actual: block.network(),
            });
        }
        if self.blocks.contains_key(&id) {
            return Err(StoreError::DuplicateBlock(id));
        }

        if block.is_genesis() {
            debug!(block = %block, "inserting genesis block");
            self.committed_tips.insert(block.shard(), id);
            self.blocks.insert(id, block);
            return Ok(id);
        }

        let parent = self
            .blocks
            .get(block.parent())
            .ok_or(StoreError::OrphanBlock {
                block: id,
                parent: *block.parent(),
            })?;

        if !block.is_dummy() && block.height() != parent.height().next() {
            return Err(StoreError::HeightMismatch {
                block: id,
                height: block.height(),
                parent_height: parent.height(),
            });
        }

        // Epochs never decrease along a chain.
        if block.epoch() < parent.epoch() {
            return Err(StoreError::EpochRegression {
                block: id,
                epoch: block.epoch(),
                parent_epoch: parent.epoch(),
            });
        }

        debug!(block = %block, "inserting block");
        self.children.entry(*block.parent()).or_default().push(id);
        self.blocks.insert(id, block);
        Ok(id)
    }

    pub fn get(&self, id: &BlockId) -> Result<&Block, StoreError> {
        self.blocks.get(id).ok_or(StoreError::NotFound(*id))
    }

    pub fn exists(&self, id: &BlockId) -> bool {
        self.blocks.contains_key(id)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Ids of the blocks whose parent is `id`.
    pub fn children(&self, id: &BlockId) -> &[BlockId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Mark a block's commands as applied to local state. Idempotent.
    pub fn mark_processed(&mut self, id: &BlockId) -> Result<(), StoreError> {
        let block = self.blocks.get_mut(id).ok_or(StoreError::NotFound(*id))?;
        block.set_processed();
        Ok(())
    }

    /// Mark a block committed. Idempotent; committing a block that has not
    /// been processed is an `InvalidTransition`.
    pub fn mark_committed(&mut self, id: &BlockId) -> Result<(), StoreError> {
        let block = self.blocks.get_mut(id).ok_or(StoreError::NotFound(*id))?;
        if !block.is_processed() {
            return Err(StoreError::InvalidTransition {
                block: *id,
                details: "committed before processed".to_string(),
            });
        }
        if block.is_committed() {
            return Ok(());
        }
        block.set_committed();

        let (shard, height) = (block.shard(), block.height());
        let replace = match self.committed_tips.get(&shard) {
            Some(tip) => self.blocks[tip].height() < height,
            None => true,
        };
        if replace {
            self.committed_tips.insert(shard, *id);
        }
        Ok(())
    }

    /// Record the local persistence timestamp. Settable exactly once.
    pub fn set_stored_at(&mut self, id: &BlockId, timestamp: Timestamp) -> Result<(), StoreError> {
        let block = self.blocks.get_mut(id).ok_or(StoreError::NotFound(*id))?;
        if block.stored_at().is_some() {
            return Err(StoreError::AlreadyStored(*id));
        }
        block.set_stored_at(timestamp);
        Ok(())
    }

    /// Whether `ancestor` lies on the parent chain of `descendant`.
    ///
    /// The walk is bounded by the configured max depth; a malformed chain
    /// longer than that fails with `ChainTooDeep`.
    pub fn is_ancestor(&self, ancestor: &BlockId, descendant: &BlockId) -> Result<bool, StoreError> {
        let mut current = *self.get(descendant)?.parent();
        for _ in 0..self.max_traversal_depth {
            if current == *ancestor {
                return Ok(true);
            }
            match self.blocks.get(&current) {
                Some(block) if !block.is_genesis() => current = *block.parent(),
                _ => return Ok(false),
            }
        }
        Err(StoreError::ChainTooDeep {
            start: *descendant,
            max_depth: self.max_traversal_depth,
        })
    }

    /// The uncommitted ancestors of `from` (inclusive), oldest first.
    ///
    /// Walks the parent chain until the first committed block; this is the
    /// exact sequence a commit must apply, in order, to leave no gaps.
    pub fn uncommitted_chain(&self, from: &BlockId) -> Result<Vec<BlockId>, StoreError> {
        let mut chain = Vec::new();
        let mut current = *from;
        for _ in 0..self.max_traversal_depth {
            let block = self.get(&current)?;
            if block.is_committed() {
                chain.reverse();
                return Ok(chain);
            }
            chain.push(current);
            current = *block.parent();
        }
        Err(StoreError::ChainTooDeep {
            start: *from,
            max_depth: self.max_traversal_depth,
        })
    }

    /// The highest committed block for a shard, if any.
    pub fn highest_committed(&self, shard: Shard) -> Option<&Block> {
        self.committed_tips.get(&shard).map(|id| &self.blocks[id])
    }

    /// The highest committed block for a shard at or below `epoch`.
    pub fn highest_committed_in_epoch(
        &self,
        shard: Shard,
        epoch: Epoch,
    ) -> Result<Option<&Block>, StoreError> {
        let Some(tip) = self.highest_committed(shard) else {
            return Ok(None);
        };
        let mut current = tip;
        for _ in 0..self.max_traversal_depth {
            if current.epoch() <= epoch {
                return Ok(Some(current));
            }
            if current.is_genesis() {
                return Ok(None);
            }
            current = self.get(current.parent())?;
        }
        Err(StoreError::ChainTooDeep {
            start: *tip.id(),
            max_depth: self.max_traversal_depth,
        })
    }
}
