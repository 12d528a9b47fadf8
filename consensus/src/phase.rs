//! Per-block lifecycle phases.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a block stands in the commitment pipeline.
///
/// Phases advance `Proposed → Justified → Processed → Committed`.
/// `Abandoned` is terminal and reached from `Proposed`/`Justified` when a
/// committed sibling prunes the branch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockPhase {
    /// Inserted; awaiting a quorum certificate.
    Proposed,
    /// Certified by a QC; awaiting command application.
    Justified,
    /// Commands applied to local state; awaiting the commit rule.
    Processed,
    /// The three-chain rule fired. Terminal.
    Committed,
    /// Superseded by a committed sibling branch. Terminal.
    Abandoned,
}

impl BlockPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Committed | Self::Abandoned)
    }

    /// Whether a quorum certificate has been accepted for the block.
    pub fn is_justified(&self) -> bool {
        matches!(self, Self::Justified | Self::Processed | Self::Committed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proposed => "proposed",
            Self::Justified => "justified",
            Self::Processed => "processed",
            Self::Committed => "committed",
            Self::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for BlockPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
