//! The fee ledger: idempotent per-transaction settlement plus per-leader
//! earnings.

use crate::{FeeBreakdown, FeeError};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;
use weft_types::{Amount, PublicKey, TransactionId};

/// Owns settled fee breakdowns keyed by transaction id and accumulated
/// leader earnings keyed by proposer.
///
/// Shared-read/exclusive-write: every operation is short and synchronous,
/// guarded by an interior lock, so callers share the ledger behind an `Arc`.
#[derive(Debug, Default)]
pub struct FeeLedger {
    inner: RwLock<LedgerState>,
}

#[derive(Debug, Default)]
struct LedgerState {
    settled: HashMap<TransactionId, (FeeBreakdown, Amount)>,
    leader_totals: HashMap<PublicKey, Amount>,
}

impl FeeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settle a transaction's fee from its breakdown, returning the total.
    ///
    /// Idempotent per transaction id: re-charging with an identical
    /// breakdown returns the already-settled total without double-counting;
    /// a different breakdown fails `FeeAlreadySettled`.
    pub fn charge(
        &self,
        transaction_id: TransactionId,
        breakdown: FeeBreakdown,
    ) -> Result<Amount, FeeError> {
        let total = breakdown.total()?;
        let mut state = self.inner.write().expect("fee ledger lock poisoned");

        if let Some((existing, settled_total)) = state.settled.get(&transaction_id) {
            if *existing == breakdown {
                return Ok(*settled_total);
            }
            return Err(FeeError::FeeAlreadySettled(transaction_id));
        }

        debug!(transaction = %transaction_id, %total, "settled transaction fee");
        state.settled.insert(transaction_id, (breakdown, total));
        Ok(total)
    }

    /// The settled total for a transaction; zero if unsettled.
    pub fn total_for(&self, transaction_id: &TransactionId) -> Amount {
        self.inner
            .read()
            .expect("fee ledger lock poisoned")
            .settled
            .get(transaction_id)
            .map(|(_, total)| *total)
            .unwrap_or(Amount::ZERO)
    }

    pub fn is_settled(&self, transaction_id: &TransactionId) -> bool {
        self.inner
            .read()
            .expect("fee ledger lock poisoned")
            .settled
            .contains_key(transaction_id)
    }

    /// Credit a leader's earnings for proposing a committed block.
    pub fn credit_leader(&self, proposer: &PublicKey, amount: Amount) -> Result<Amount, FeeError> {
        let mut state = self.inner.write().expect("fee ledger lock poisoned");
        let total = state.leader_totals.entry(*proposer).or_insert(Amount::ZERO);
        *total = total.checked_add(amount).ok_or(FeeError::Overflow)?;
        let credited = *total;
        debug!(leader = %proposer, %amount, "credited leader fee");
        Ok(credited)
    }

    /// A leader's accumulated earnings; zero if never credited.
    pub fn leader_total(&self, proposer: &PublicKey) -> Amount {
        self.inner
            .read()
            .expect("fee ledger lock poisoned")
            .leader_totals
            .get(proposer)
            .copied()
            .unwrap_or(Amount::ZERO)
    }
}
