//! Cryptographic primitives for the weft validator core.
//!
//! - **Ed25519** for vote and block signing
//! - **Blake2b** for hashing (block ids, merkle roots, vote challenges)
//! - **Pedersen commitments** over Ristretto with Bulletproof range proofs
//!   for confidential value transfer

pub mod confidential;
pub mod error;
pub mod hash;
pub mod keys;
pub mod sign;

pub use confidential::{
    generate_withdraw_proof, verify_withdraw_proof, BalanceProof, ConfidentialMask,
    ConfidentialOutput, PedersenCommitment, WithdrawProof, WithdrawProofBundle,
};
pub use error::ProofError;
pub use hash::{blake2b_256, blake2b_256_multi, merkle_root};
pub use keys::{generate_keypair, keypair_from_private, keypair_from_seed, public_from_private};
pub use sign::{sign_message, verify_signature};
