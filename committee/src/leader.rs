//! Leader selection capability.
//!
//! The engine queries a `LeaderStrategy` per (committee, height) to decide
//! who may propose. The concrete selection algorithm is a collaborator
//! concern; round-robin is provided as the reference implementation.

use crate::{Committee, CommitteeMember};
use weft_types::{NodeHeight, PublicKey};

/// Chooses the proposing leader for a height within a committee.
pub trait LeaderStrategy: Send + Sync {
    /// The designated leader for `height`. Panics only on an empty
    /// committee, which registration must prevent.
    fn leader<'a>(&self, committee: &'a Committee, height: NodeHeight) -> &'a CommitteeMember;

    /// Whether `public_key` is the designated leader for `height`.
    fn is_leader(&self, committee: &Committee, height: NodeHeight, public_key: &PublicKey) -> bool {
        &self.leader(committee, height).public_key == public_key
    }
}

/// Rotates leadership over committee members by height.
#[derive(Clone, Copy, Debug, Default)]
pub struct RoundRobinLeaderStrategy;

impl LeaderStrategy for RoundRobinLeaderStrategy {
    fn leader<'a>(&self, committee: &'a Committee, height: NodeHeight) -> &'a CommitteeMember {
        let index = (height.as_u64() % committee.len() as u64) as usize;
        &committee.members()[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn committee(n: u8) -> Committee {
        Committee::from_public_keys((0..n).map(|b| PublicKey([b; 32])))
    }

    #[test]
    fn rotates_over_members() {
        let c = committee(3);
        let strategy = RoundRobinLeaderStrategy;
        assert_eq!(
            strategy.leader(&c, NodeHeight::new(0)).public_key,
            PublicKey([0; 32])
        );
        assert_eq!(
            strategy.leader(&c, NodeHeight::new(1)).public_key,
            PublicKey([1; 32])
        );
        assert_eq!(
            strategy.leader(&c, NodeHeight::new(3)).public_key,
            PublicKey([0; 32])
        );
    }

    #[test]
    fn is_leader_matches_leader() {
        let c = committee(4);
        let strategy = RoundRobinLeaderStrategy;
        let leader = strategy.leader(&c, NodeHeight::new(7)).public_key;
        assert!(strategy.is_leader(&c, NodeHeight::new(7), &leader));
        assert!(!strategy.is_leader(&c, NodeHeight::new(8), &leader));
    }
}
