use crate::TransactionStatus;
use thiserror::Error;
use weft_fees::FeeError;
use weft_types::TransactionId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FinalityError {
    #[error("unknown transaction {0}")]
    UnknownTransaction(TransactionId),

    #[error("transaction {0} is already registered")]
    AlreadyRegistered(TransactionId),

    #[error("transaction {id} is already final ({status})")]
    AlreadyFinal {
        id: TransactionId,
        status: TransactionStatus,
    },

    #[error("transaction {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: TransactionId,
        from: TransactionStatus,
        to: TransactionStatus,
    },

    #[error("failed to encode result: {0}")]
    Serialization(String),

    #[error(transparent)]
    Fee(#[from] FeeError),
}
