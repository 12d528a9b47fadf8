//! Vote challenges and quorum certificate validation.
//!
//! A vote is an Ed25519 signature over a domain-separated Blake2b challenge
//! binding the block id, height, epoch, and shard. A QC aggregates votes;
//! it is valid when every signer is a distinct committee member with a
//! correct signature and the signers' combined power meets the committee's
//! quorum threshold.

use std::collections::HashSet;
use tracing::warn;
use weft_crypto::{blake2b_256_multi, sign_message, verify_signature};
use weft_types::{
    BlockId, Epoch, NodeHeight, PrivateKey, PublicKey, QuorumCertificate, Shard,
    ValidatorSignature,
};

use crate::{EpochCommitteeRegistry, QcError};

const VOTE_DOMAIN: &[u8] = b"weft.vote.v1";

/// The 32-byte challenge a validator signs when voting for a block.
pub fn vote_challenge(
    block_id: &BlockId,
    height: NodeHeight,
    epoch: Epoch,
    shard: Shard,
) -> [u8; 32] {
    blake2b_256_multi(&[
        VOTE_DOMAIN,
        block_id.as_bytes(),
        &height.as_u64().to_le_bytes(),
        &epoch.as_u64().to_le_bytes(),
        &shard.as_u32().to_le_bytes(),
    ])
}

/// Sign a vote for a block, producing the signature a QC aggregates.
pub fn sign_vote(
    private_key: &PrivateKey,
    public_key: PublicKey,
    block_id: &BlockId,
    height: NodeHeight,
    epoch: Epoch,
    shard: Shard,
) -> ValidatorSignature {
    let challenge = vote_challenge(block_id, height, epoch, shard);
    ValidatorSignature::new(public_key, sign_message(&challenge, private_key))
}

/// Validate a quorum certificate against the committee registered for its
/// epoch and shard. Pure verification: no side effects.
pub fn validate_qc(qc: &QuorumCertificate, registry: &EpochCommitteeRegistry) -> Result<(), QcError> {
    let committee = registry
        .get(qc.epoch(), qc.shard())
        .ok_or(QcError::UnknownCommittee {
            epoch: qc.epoch(),
            shard: qc.shard(),
        })?;

    let challenge = vote_challenge(qc.block_id(), qc.block_height(), qc.epoch(), qc.shard());

    let mut seen: HashSet<PublicKey> = HashSet::with_capacity(qc.signatures().len());
    let mut power: u64 = 0;
    for vote in qc.signatures() {
        let member = committee
            .member(&vote.public_key)
            .ok_or_else(|| QcError::UnknownSigner(vote.public_key.to_string()))?;

        if !seen.insert(vote.public_key) {
            return Err(QcError::DuplicateSigner(vote.public_key.to_string()));
        }

        if !verify_signature(&challenge, &vote.signature, &vote.public_key) {
            warn!(signer = %vote.public_key, block = %qc.block_id(), "vote signature failed verification");
            return Err(QcError::InvalidSignature(vote.public_key.to_string()));
        }

        power = power.saturating_add(member.voting_power);
    }

    let need = committee.quorum_threshold();
    if power < need {
        return Err(QcError::QuorumNotMet { have: power, need });
    }

    Ok(())
}
