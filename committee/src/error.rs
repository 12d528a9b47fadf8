use thiserror::Error;
use weft_types::{Epoch, Shard};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QcError {
    #[error("no committee registered for {epoch}, {shard}")]
    UnknownCommittee { epoch: Epoch, shard: Shard },

    #[error("signer {0} is not a committee member")]
    UnknownSigner(String),

    #[error("signer {0} appears more than once")]
    DuplicateSigner(String),

    #[error("invalid vote signature from {0}")]
    InvalidSignature(String),

    #[error("quorum not met: {have} < {need}")]
    QuorumNotMet { have: u64, need: u64 },
}
