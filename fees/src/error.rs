use thiserror::Error;
use weft_types::TransactionId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeeError {
    #[error("fee amount overflow")]
    Overflow,

    #[error("fee already settled for transaction {0} with a different breakdown")]
    FeeAlreadySettled(TransactionId),
}
