//! Fee sources and per-transaction breakdowns.

use crate::FeeError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use weft_types::Amount;

/// What a fee component was charged for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FeeSource {
    /// Substate storage consumed by the transaction.
    Storage,
    /// Instruction execution cost.
    Compute,
    /// Confidential proof verification work.
    ProofVerification,
    /// Message propagation cost.
    Network,
}

impl FeeSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Storage => "storage",
            Self::Compute => "compute",
            Self::ProofVerification => "proof-verification",
            Self::Network => "network",
        }
    }
}

impl fmt::Display for FeeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Amounts charged per source for one transaction.
///
/// The sum of all entries is the transaction's final fee.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown(BTreeMap<FeeSource, u64>);

impl FeeBreakdown {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Add to a source's amount; saturates are not allowed, overflow errors.
    pub fn add(&mut self, source: FeeSource, amount: u64) -> Result<(), FeeError> {
        let entry = self.0.entry(source).or_insert(0);
        *entry = entry.checked_add(amount).ok_or(FeeError::Overflow)?;
        Ok(())
    }

    pub fn get(&self, source: FeeSource) -> u64 {
        self.0.get(&source).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FeeSource, u64)> + '_ {
        self.0.iter().map(|(source, amount)| (*source, *amount))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all entries, failing on overflow.
    pub fn total(&self) -> Result<Amount, FeeError> {
        let mut total = Amount::ZERO;
        for amount in self.0.values() {
            total = total
                .checked_add(Amount::new(*amount))
                .ok_or(FeeError::Overflow)?;
        }
        Ok(total)
    }
}

impl FromIterator<(FeeSource, u64)> for FeeBreakdown {
    fn from_iter<I: IntoIterator<Item = (FeeSource, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_sums_entries() {
        let breakdown: FeeBreakdown = [(FeeSource::Storage, 3), (FeeSource::Compute, 7)]
            .into_iter()
            .collect();
        assert_eq!(breakdown.total().unwrap(), Amount::new(10));
    }

    #[test]
    fn total_overflow_detected() {
        let breakdown: FeeBreakdown = [(FeeSource::Storage, u64::MAX), (FeeSource::Compute, 1)]
            .into_iter()
            .collect();
        assert_eq!(breakdown.total(), Err(FeeError::Overflow));
    }

    #[test]
    fn add_accumulates_per_source() {
        let mut breakdown = FeeBreakdown::new();
        breakdown.add(FeeSource::Compute, 5).unwrap();
        breakdown.add(FeeSource::Compute, 2).unwrap();
        assert_eq!(breakdown.get(FeeSource::Compute), 7);
        assert_eq!(breakdown.get(FeeSource::Network), 0);
    }

    #[test]
    fn add_overflow_detected() {
        let mut breakdown = FeeBreakdown::new();
        breakdown.add(FeeSource::Storage, u64::MAX).unwrap();
        assert_eq!(breakdown.add(FeeSource::Storage, 1), Err(FeeError::Overflow));
    }

    #[test]
    fn empty_breakdown_totals_zero() {
        assert_eq!(FeeBreakdown::new().total().unwrap(), Amount::ZERO);
    }
}
