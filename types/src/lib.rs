//! Fundamental types for the weft validator core.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: block and transaction identifiers, amounts, epochs and shards,
//! timestamps, keys, and the quorum certificate model.

pub mod amount;
pub mod block;
pub mod epoch;
pub mod keys;
pub mod network;
pub mod qc;
pub mod time;
pub mod transaction;

pub use amount::Amount;
pub use block::BlockId;
pub use epoch::{Epoch, NodeHeight, Shard};
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature, ValidatorSignature};
pub use network::Network;
pub use qc::QuorumCertificate;
pub use time::Timestamp;
pub use transaction::TransactionId;
