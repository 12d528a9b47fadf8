//! The transaction finalizer.

use crate::{
    FinalityError, RejectReason, TransactionRecord, TransactionResult, TransactionStatus,
    TransactionWaitResult,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::time::{self, Instant};
use tracing::{debug, warn};
use weft_consensus::ConsensusEvent;
use weft_crypto::{verify_withdraw_proof, WithdrawProof};
use weft_fees::{FeeBreakdown, FeeLedger};
use weft_types::{Amount, TransactionId};

/// Executes a committed transaction's commands. Execution semantics are a
/// collaborator concern; the finalizer only records the verdict.
pub trait TransactionExecutor: Send + Sync {
    fn execute(&self, transaction_id: &TransactionId) -> TransactionResult;
}

struct Entry {
    record: TransactionRecord,
    status_tx: watch::Sender<TransactionStatus>,
}

impl Entry {
    fn new(id: TransactionId) -> Self {
        Self {
            record: TransactionRecord::new(id),
            status_tx: watch::channel(TransactionStatus::Pending).0,
        }
    }
}

/// Maps transaction ids to terminal statuses and multiplexes waiters.
///
/// Each record carries a watch channel: `wait_result` suspends only the
/// calling task, any number of waiters observe the same transaction, and
/// waking one never delays another. Reads the fee ledger; never mutates
/// records from the wait path.
pub struct TransactionFinalizer {
    fees: Arc<FeeLedger>,
    inner: Mutex<HashMap<TransactionId, Entry>>,
}

impl TransactionFinalizer {
    pub fn new(fees: Arc<FeeLedger>) -> Self {
        Self {
            fees,
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Track a newly submitted transaction as `Pending`.
    pub fn register(&self, id: TransactionId) -> Result<(), FinalityError> {
        let mut map = self.inner.lock().expect("finalizer lock poisoned");
        if map.contains_key(&id) {
            return Err(FinalityError::AlreadyRegistered(id));
        }
        map.insert(id, Entry::new(id));
        debug!(transaction = %id, "transaction registered");
        Ok(())
    }

    /// Record that the transaction was sequenced into a proposed block:
    /// `Pending → Dispatched`. Idempotent while non-terminal.
    pub fn mark_dispatched(&self, id: &TransactionId) -> Result<(), FinalityError> {
        let mut map = self.inner.lock().expect("finalizer lock poisoned");
        let entry = map
            .get_mut(id)
            .ok_or(FinalityError::UnknownTransaction(*id))?;
        match entry.record.status {
            TransactionStatus::Pending => {
                entry.record.status = TransactionStatus::Dispatched;
                entry.status_tx.send_replace(TransactionStatus::Dispatched);
                Ok(())
            }
            TransactionStatus::Dispatched => Ok(()),
            status => Err(FinalityError::AlreadyFinal { id: *id, status }),
        }
    }

    /// Finalize a transaction from its execution outcome.
    ///
    /// `Accept` transitions to `Committed` and pulls the settled fee from
    /// the ledger; `Reject` transitions to `Rejected` with a zero fee (a
    /// rejected transaction's fee is never charged). The result is mirrored
    /// into `json_result`. Unseen ids are created on the fly — commit events
    /// may carry transactions this node never saw submitted.
    pub fn finalize(
        &self,
        id: TransactionId,
        result: TransactionResult,
    ) -> Result<TransactionStatus, FinalityError> {
        let json_result = serde_json::to_value(&result)
            .map_err(|e| FinalityError::Serialization(e.to_string()))?;

        let mut map = self.inner.lock().expect("finalizer lock poisoned");
        let entry = map.entry(id).or_insert_with(|| Entry::new(id));
        if entry.record.status.is_terminal() {
            return Err(FinalityError::AlreadyFinal {
                id,
                status: entry.record.status,
            });
        }

        let (status, final_fee) = match &result {
            TransactionResult::Accept { .. } => {
                (TransactionStatus::Committed, self.fees.total_for(&id))
            }
            TransactionResult::Reject { .. } => (TransactionStatus::Rejected, Amount::ZERO),
        };

        entry.record.status = status;
        entry.record.result = Some(result);
        entry.record.json_result = Some(json_result);
        entry.record.final_fee = final_fee;
        entry.status_tx.send_replace(status);
        debug!(transaction = %id, %status, %final_fee, "transaction finalized");
        Ok(status)
    }

    /// Record an internal fault: terminal `Errored`, no result payload.
    pub fn mark_errored(&self, id: TransactionId, details: &str) -> Result<(), FinalityError> {
        let mut map = self.inner.lock().expect("finalizer lock poisoned");
        let entry = map.entry(id).or_insert_with(|| Entry::new(id));
        if entry.record.status.is_terminal() {
            return Err(FinalityError::AlreadyFinal {
                id,
                status: entry.record.status,
            });
        }
        warn!(transaction = %id, details, "transaction errored");
        entry.record.status = TransactionStatus::Errored;
        entry.status_tx.send_replace(TransactionStatus::Errored);
        Ok(())
    }

    /// Verify a confidential withdraw proof and finalize accordingly.
    ///
    /// On success the fee breakdown is settled through the ledger and the
    /// transaction commits; on any proof failure the transaction is
    /// rejected, the fee is not charged, and `final_fee` stays zero.
    pub fn settle_confidential(
        &self,
        id: TransactionId,
        proof: &WithdrawProof,
        breakdown: FeeBreakdown,
    ) -> Result<TransactionStatus, FinalityError> {
        match verify_withdraw_proof(proof) {
            Ok(revealed_fee) => {
                self.fees.charge(id, breakdown)?;
                self.finalize(
                    id,
                    TransactionResult::Accept {
                        output: serde_json::json!({ "revealed_fee": revealed_fee.raw() }),
                    },
                )
            }
            Err(err) => self.finalize(
                id,
                TransactionResult::Reject {
                    reason: RejectReason::InvalidConfidentialProof(err.to_string()),
                },
            ),
        }
    }

    /// Snapshot a transaction's record. Ids never seen are
    /// `UnknownTransaction` — distinct from a known, still-pending one.
    pub fn query(&self, id: &TransactionId) -> Result<TransactionRecord, FinalityError> {
        let map = self.inner.lock().expect("finalizer lock poisoned");
        map.get(id)
            .map(|entry| entry.record.clone())
            .ok_or(FinalityError::UnknownTransaction(*id))
    }

    /// Wait until the transaction reaches a terminal status or `timeout`
    /// elapses.
    ///
    /// On timeout the current status is returned with `timed_out = true`
    /// and the record is left untouched: a later terminal transition is
    /// still observable by a fresh call. Suspends only the caller.
    pub async fn wait_result(
        &self,
        id: &TransactionId,
        timeout: Duration,
    ) -> Result<TransactionWaitResult, FinalityError> {
        let (snapshot, mut status_rx) = {
            let map = self.inner.lock().expect("finalizer lock poisoned");
            let entry = map.get(id).ok_or(FinalityError::UnknownTransaction(*id))?;
            (entry.record.clone(), entry.status_tx.subscribe())
        };
        if snapshot.status.is_terminal() {
            return Ok(TransactionWaitResult::from_record(snapshot, false));
        }

        let deadline = Instant::now() + timeout;
        loop {
            match time::timeout_at(deadline, status_rx.changed()).await {
                Ok(Ok(())) => {
                    let record = self.query(id)?;
                    if record.status.is_terminal() {
                        return Ok(TransactionWaitResult::from_record(record, false));
                    }
                }
                // Finalizer dropped mid-wait; report what we have.
                Ok(Err(_)) => {
                    return Ok(TransactionWaitResult::from_record(self.query(id)?, false));
                }
                Err(_) => {
                    return Ok(TransactionWaitResult::from_record(self.query(id)?, true));
                }
            }
        }
    }

    /// Consume engine commit events, executing and finalizing every
    /// transaction in each committed block. Failures are isolated per
    /// transaction. Runs until the event channel closes.
    pub async fn run(
        self: Arc<Self>,
        mut events: broadcast::Receiver<ConsensusEvent>,
        executor: Arc<dyn TransactionExecutor>,
    ) {
        loop {
            match events.recv().await {
                Ok(ConsensusEvent::BlockCommitted {
                    block_id,
                    transaction_ids,
                    ..
                }) => {
                    for id in transaction_ids {
                        let result = executor.execute(&id);
                        if let Err(err) = self.finalize(id, result) {
                            warn!(
                                transaction = %id, block = %block_id, %err,
                                "failed to finalize committed transaction"
                            );
                        }
                    }
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "finalizer lagged behind commit events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}
