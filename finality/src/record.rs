//! Transaction records and the wait-protocol response shape.

use crate::TransactionStatus;
use serde::{Deserialize, Serialize};
use std::fmt;
use weft_types::{Amount, TransactionId};

/// Why a committed transaction was rejected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// Command execution failed.
    ExecutionFailure(String),
    /// A confidential proof did not verify. Never retried: a cryptographic
    /// verdict cannot change.
    InvalidConfidentialProof(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExecutionFailure(details) => write!(f, "execution failure: {details}"),
            Self::InvalidConfidentialProof(details) => {
                write!(f, "invalid confidential proof: {details}")
            }
        }
    }
}

/// The terminal outcome of a transaction's commands.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TransactionResult {
    /// Execution succeeded; `output` is the executor's result payload.
    Accept { output: serde_json::Value },
    /// Execution or proof verification failed.
    Reject { reason: RejectReason },
}

/// The finalizer's view of one transaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub status: TransactionStatus,
    /// Present only in terminal states; carries the rejection reason for
    /// rejected transactions.
    pub result: Option<TransactionResult>,
    /// JSON mirror of `result` for external consumption.
    pub json_result: Option<serde_json::Value>,
    /// Settled total; zero until finalized, and zero forever for rejected
    /// transactions (their fee is never charged).
    pub final_fee: Amount,
}

impl TransactionRecord {
    pub fn new(id: TransactionId) -> Self {
        Self {
            id,
            status: TransactionStatus::Pending,
            result: None,
            json_result: None,
            final_fee: Amount::ZERO,
        }
    }
}

/// Response of the wait-for-result protocol.
///
/// `timed_out` is set only by the wait path; everything else is a snapshot
/// of the transaction record at response time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionWaitResult {
    pub transaction_id: TransactionId,
    pub result: Option<TransactionResult>,
    pub json_result: Option<serde_json::Value>,
    pub status: TransactionStatus,
    pub final_fee: Amount,
    pub timed_out: bool,
}

impl TransactionWaitResult {
    pub(crate) fn from_record(record: TransactionRecord, timed_out: bool) -> Self {
        Self {
            transaction_id: record.id,
            result: record.result,
            json_result: record.json_result,
            status: record.status,
            final_fee: record.final_fee,
            timed_out,
        }
    }
}
