use crate::BlockPhase;
use thiserror::Error;
use weft_committee::QcError;
use weft_fees::FeeError;
use weft_store::StoreError;
use weft_types::{BlockId, Epoch, NodeHeight, Shard};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("{proposed_by} is not the designated leader for {height} in {epoch}")]
    NotLeader {
        proposed_by: String,
        height: NodeHeight,
        epoch: Epoch,
    },

    #[error("QC certifies block {qc_block_id} at {qc_height}, not block {block_id} at {height}")]
    QcMismatch {
        block_id: BlockId,
        height: NodeHeight,
        qc_block_id: BlockId,
        qc_height: NodeHeight,
    },

    #[error("no committee registered for {epoch}, {shard}")]
    UnknownCommittee { epoch: Epoch, shard: Shard },

    #[error(
        "block {block} requires pledge index {required} from {shard}, observed {observed}"
    )]
    MissingForeignPledge {
        block: BlockId,
        shard: Shard,
        required: u64,
        observed: u64,
    },

    #[error("block {block} cannot move from {phase} to {target}")]
    InvalidPhaseTransition {
        block: BlockId,
        phase: BlockPhase,
        target: BlockPhase,
    },

    #[error("proposal {0} is unsigned or carries an invalid leader signature")]
    InvalidBlockSignature(BlockId),

    #[error(transparent)]
    Qc(#[from] QcError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Fee(#[from] FeeError),
}
