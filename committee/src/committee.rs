//! Weighted validator committee membership.

use serde::{Deserialize, Serialize};
use weft_types::PublicKey;

/// A single committee member and their voting power.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitteeMember {
    pub public_key: PublicKey,
    pub voting_power: u64,
}

impl CommitteeMember {
    pub fn new(public_key: PublicKey, voting_power: u64) -> Self {
        Self {
            public_key,
            voting_power,
        }
    }
}

/// The validator committee for one (epoch, shard).
///
/// Membership is immutable for the lifetime of the epoch. Member order is
/// meaningful: leader selection rotates over it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Committee {
    members: Vec<CommitteeMember>,
}

impl Committee {
    pub fn new(members: Vec<CommitteeMember>) -> Self {
        Self { members }
    }

    /// Equal-weight committee, one power unit per member.
    pub fn from_public_keys(keys: impl IntoIterator<Item = PublicKey>) -> Self {
        Self {
            members: keys
                .into_iter()
                .map(|public_key| CommitteeMember::new(public_key, 1))
                .collect(),
        }
    }

    pub fn members(&self) -> &[CommitteeMember] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member(&self, public_key: &PublicKey) -> Option<&CommitteeMember> {
        self.members.iter().find(|m| &m.public_key == public_key)
    }

    pub fn contains(&self, public_key: &PublicKey) -> bool {
        self.member(public_key).is_some()
    }

    /// Total voting power across all members.
    pub fn total_power(&self) -> u64 {
        self.members.iter().map(|m| m.voting_power).sum()
    }

    /// The 2f+1 quorum threshold, where f = (total − 1) / 3 is the Byzantine
    /// power tolerated out of 3f+1.
    pub fn quorum_threshold(&self) -> u64 {
        let f = self.total_power().saturating_sub(1) / 3;
        2 * f + 1
    }
}
