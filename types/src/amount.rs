//! Fee and value amounts.
//!
//! Amounts are raw integer units (u64) to avoid floating-point errors.
//! Confidential value transfer hides amounts behind commitments; this type
//! carries the revealed quantities: fees, leader earnings, settled totals.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// An amount in raw units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Self = Self(0);

    /// The largest representable amount; range proofs bound committed
    /// values to 64 bits, so this is also the confidential value ceiling.
    pub const MAX: Self = Self(u64::MAX);

    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl Add for Amount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl From<u64> for Amount {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
