//! Block models and the append-only block DAG store.
//!
//! Blocks form a DAG rooted at a genesis block, expressed as an arena of
//! records indexed by id with parent/child relations held as id references.
//! A block is immutable once signed; only its three lifecycle flags
//! (`is_processed`, `is_committed`, `stored_at`) mutate afterwards, and only
//! through the store.

pub mod block;
pub mod error;
pub mod store;

pub use block::{Block, BlockSignature, Command};
pub use error::StoreError;
pub use store::BlockStore;
