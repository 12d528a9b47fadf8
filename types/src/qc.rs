//! Quorum certificate: aggregated proof that a supermajority of a validator
//! committee voted for a given block.
//!
//! A QC is immutable once formed. Validation against the committee for its
//! epoch/shard lives in `weft-committee`; this is just the data.

use crate::{BlockId, Epoch, NodeHeight, Shard, ValidatorSignature};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A set of validator votes for a specific block / height / epoch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumCertificate {
    /// The block this certificate certifies.
    block_id: BlockId,
    /// The certified block's height.
    block_height: NodeHeight,
    /// Epoch the votes were cast in.
    epoch: Epoch,
    /// Shard the certified block belongs to.
    shard: Shard,
    /// One vote signature per committee member that voted.
    signatures: Vec<ValidatorSignature>,
}

impl QuorumCertificate {
    pub fn new(
        block_id: BlockId,
        block_height: NodeHeight,
        epoch: Epoch,
        shard: Shard,
        signatures: Vec<ValidatorSignature>,
    ) -> Self {
        Self {
            block_id,
            block_height,
            epoch,
            shard,
            signatures,
        }
    }

    /// The self-certifying certificate carried by a genesis block.
    ///
    /// Has no signatures and certifies the zero id at height 0. Only
    /// acceptable on a genesis block; everywhere else an empty signature
    /// set fails quorum validation.
    pub fn genesis(epoch: Epoch, shard: Shard) -> Self {
        Self {
            block_id: BlockId::ZERO,
            block_height: NodeHeight::ZERO,
            epoch,
            shard,
            signatures: Vec::new(),
        }
    }

    pub fn block_id(&self) -> &BlockId {
        &self.block_id
    }

    pub fn block_height(&self) -> NodeHeight {
        self.block_height
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn shard(&self) -> Shard {
        self.shard
    }

    pub fn signatures(&self) -> &[ValidatorSignature] {
        &self.signatures
    }

    /// Whether this is the signature-less genesis certificate.
    pub fn is_genesis(&self) -> bool {
        self.block_id.is_zero() && self.block_height.is_zero() && self.signatures.is_empty()
    }
}

impl fmt::Display for QuorumCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "QC[block {}, {}, {}, {}, {} signatures]",
            self.block_id,
            self.block_height,
            self.epoch,
            self.shard,
            self.signatures.len()
        )
    }
}
