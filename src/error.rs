//! Defines the ledger's error type and the conversions from SQLite errors.

use crate::{
    database_id::{EventId, SavingsBucketId, WalletId},
    ledger::TransactionKind,
};

/// The errors that may occur in the ledger engine.
///
/// Variants fall into three families: validation failures
/// ([Error::Validation]), missing references ([Error::WalletNotFound],
/// [Error::BucketNotFound], [Error::TransactionNotFound], [Error::NotFound])
/// and precondition failures on existing transactions
/// ([Error::TransactionDeleted], [Error::KindMismatch]). Idempotency
/// collisions are not errors; a create call that replays an existing key
/// returns the prior record.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The caller supplied malformed input. `field` names the offending
    /// input field so the client can report it.
    #[error("invalid {field}: {reason}")]
    Validation {
        /// The input field that failed validation.
        field: &'static str,
        /// Why the field was rejected.
        reason: String,
    },

    /// The referenced wallet does not exist or has been archived.
    #[error("wallet {0} does not exist or is archived")]
    WalletNotFound(WalletId),

    /// The referenced savings bucket does not exist or has been archived.
    #[error("savings bucket {0} does not exist or is archived")]
    BucketNotFound(SavingsBucketId),

    /// The referenced transaction is not in the database.
    #[error("transaction {0} is not in the database")]
    TransactionNotFound(EventId),

    /// Tried to update a transaction that has been soft-deleted.
    #[error("transaction {0} has been deleted")]
    TransactionDeleted(EventId),

    /// A kind-specific updater was called on a transaction of another kind.
    #[error("transaction {id} is a {actual} transaction, not {expected}")]
    KindMismatch {
        /// The transaction the caller tried to update.
        id: EventId,
        /// The kind the updater expected.
        expected: TransactionKind,
        /// The kind stored for the transaction.
        actual: TransactionKind,
    },

    /// The stored postings for a transaction do not match the shape its kind
    /// requires (e.g. a transfer without two wallet legs).
    #[error("transaction {0} has an inconsistent posting shape")]
    CorruptPostings(EventId),

    /// The requested resource could not be found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl Error {
    /// Shortcut for building an [Error::Validation].
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Error::Validation {
            field,
            reason: reason.into(),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {error}");
                Error::SqlError(error)
            }
        }
    }
}
