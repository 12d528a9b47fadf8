use thiserror::Error;

/// Failures produced by confidential proof verification.
///
/// Every variant is fatal to the transaction carrying the proof: a failed
/// cryptographic verdict cannot change on retry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProofError {
    #[error("malformed commitment: {0}")]
    MalformedCommitment(String),

    #[error("malformed proof: {0}")]
    MalformedProof(String),

    #[error("range proof verification failed")]
    RangeProofFailed,

    #[error("balance proof does not balance inputs against outputs plus fee")]
    BalanceMismatch,
}
