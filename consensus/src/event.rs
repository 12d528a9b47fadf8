//! Notifications broadcast by the engine.

use weft_types::{Amount, BlockId, Epoch, NodeHeight, Shard, TransactionId};

/// Emitted after the engine's state has durably changed; consumers (the
/// transaction finalizer, gossip, metrics) subscribe via
/// [`ConsensusEngine::subscribe`](crate::ConsensusEngine::subscribe).
#[derive(Clone, Debug)]
pub enum ConsensusEvent {
    /// A block committed. One event per block, in ancestor-to-descendant
    /// order within a shard.
    BlockCommitted {
        block_id: BlockId,
        height: NodeHeight,
        epoch: Epoch,
        shard: Shard,
        /// Transactions whose commands the block carried, in command order.
        transaction_ids: Vec<TransactionId>,
        total_leader_fee: Amount,
    },
    /// A block (and its descendants) fell off the committed chain.
    BranchAbandoned {
        block_id: BlockId,
        height: NodeHeight,
        shard: Shard,
    },
}
