use thiserror::Error;
use weft_types::{BlockId, Epoch, Network, NodeHeight};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("block {0} not found")]
    NotFound(BlockId),

    #[error("block {0} already exists")]
    DuplicateBlock(BlockId),

    #[error("block {block} references unknown parent {parent}")]
    OrphanBlock { block: BlockId, parent: BlockId },

    #[error("block {block} at {height} does not sit directly above parent at {parent_height}")]
    HeightMismatch {
        block: BlockId,
        height: NodeHeight,
        parent_height: NodeHeight,
    },

    #[error("block {block} at {epoch} regresses below parent {parent_epoch}")]
    EpochRegression {
        block: BlockId,
        epoch: Epoch,
        parent_epoch: Epoch,
    },

    #[error("block {block}: {details}")]
    InvalidTransition { block: BlockId, details: String },

    #[error("block {0} already has a stored_at timestamp")]
    AlreadyStored(BlockId),

    #[error("ancestor walk from {start} exceeded {max_depth} blocks")]
    ChainTooDeep { start: BlockId, max_depth: usize },

    #[error("block {block} is for network {actual}, store expects {expected}")]
    NetworkMismatch {
        block: BlockId,
        expected: Network,
        actual: Network,
    },
}
