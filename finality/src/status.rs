//! Transaction lifecycle states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a transaction stands between submission and finality.
///
/// `Pending → Dispatched → Committed | Rejected | Errored`. The last three
/// are terminal. A wait-protocol timeout is an overlay on the response, not
/// a status: the underlying transaction never becomes "timed out".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// Known locally; not yet handed to consensus.
    Pending,
    /// Sequenced into a proposed block; awaiting commit.
    Dispatched,
    /// Committed and executed successfully. Terminal.
    Committed,
    /// Committed but execution or proof verification failed. Terminal.
    Rejected,
    /// An internal fault prevented finalization. Terminal.
    Errored,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Committed | Self::Rejected | Self::Errored)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Dispatched => "dispatched",
            Self::Committed => "committed",
            Self::Rejected => "rejected",
            Self::Errored => "errored",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
