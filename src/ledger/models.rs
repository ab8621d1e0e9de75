//! Core data models and table definitions for the transaction ledger.

use std::fmt;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::database_id::{CategoryId, EventId, PostingId, SavingsBucketId, WalletId};

/// The longest idempotency key the ledger accepts, the length of a
/// hyphenated UUID.
pub const IDEMPOTENCY_KEY_MAX_LENGTH: usize = 36;

/// The kind of financial event a transaction records.
///
/// The kind is fixed at creation and determines the shape of the
/// transaction's postings:
///
/// | Kind | Postings |
/// |---|---|
/// | `Expense` | one wallet posting, negative |
/// | `Income` | one wallet posting, positive |
/// | `Transfer` | two wallet postings that are exact negatives, different wallets |
/// | `SavingsContribution` | wallet posting (negative) + bucket posting (positive) |
/// | `SavingsWithdrawal` | bucket posting (negative) + wallet posting (positive) |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Money spent from a wallet.
    Expense,
    /// Money earned into a wallet.
    Income,
    /// Money moved between two wallets.
    Transfer,
    /// Money moved from a wallet into a savings bucket.
    SavingsContribution,
    /// Money moved from a savings bucket back into a wallet.
    SavingsWithdrawal,
}

impl TransactionKind {
    /// The column value the kind is stored as.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Expense => "expense",
            TransactionKind::Income => "income",
            TransactionKind::Transfer => "transfer",
            TransactionKind::SavingsContribution => "savings_contribution",
            TransactionKind::SavingsWithdrawal => "savings_withdrawal",
        }
    }

    /// Parse a kind from its column value.
    ///
    /// `column` is the row index the text was read from, used to report
    /// conversion failures.
    pub(crate) fn from_column(text: &str, column: usize) -> Result<Self, rusqlite::Error> {
        match text {
            "expense" => Ok(TransactionKind::Expense),
            "income" => Ok(TransactionKind::Income),
            "transfer" => Ok(TransactionKind::Transfer),
            "savings_contribution" => Ok(TransactionKind::SavingsContribution),
            "savings_withdrawal" => Ok(TransactionKind::SavingsWithdrawal),
            other => Err(rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Text,
                format!("unknown transaction kind \"{other}\"").into(),
            )),
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One financial occurrence recorded in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionEvent {
    /// The ID of the transaction, assigned at creation.
    pub id: EventId,
    /// The kind of event, immutable after creation.
    pub kind: TransactionKind,
    /// When the event happened, supplied by the caller. The business date of
    /// the event, not necessarily when it was recorded.
    pub occurred_at: OffsetDateTime,
    /// Optional free-text description of the event.
    pub note: Option<String>,
    /// Optional counterparty, e.g. the shop or employer.
    pub payee: Option<String>,
    /// The category the event belongs to. Required for expenses, optional
    /// for income, absent for the other kinds.
    pub category_id: Option<CategoryId>,
    /// Soft-delete marker; `None` means the event is active.
    pub deleted_at: Option<OffsetDateTime>,
    /// Unique key that makes retried create calls safe.
    pub idempotency_key: String,
    /// When the row was created.
    pub created_at: OffsetDateTime,
    /// When the row was last modified.
    pub updated_at: OffsetDateTime,
}

/// The account a posting moves money into or out of.
///
/// A posting targets exactly one of a wallet or a savings bucket, never both
/// and never neither. The database enforces the same rule with a CHECK
/// constraint over the two nullable columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostingTarget {
    /// A spending wallet.
    Wallet(WalletId),
    /// A savings bucket.
    Bucket(SavingsBucketId),
}

impl PostingTarget {
    /// The wallet this posting targets, if any.
    pub fn wallet_id(&self) -> Option<WalletId> {
        match self {
            PostingTarget::Wallet(id) => Some(*id),
            PostingTarget::Bucket(_) => None,
        }
    }

    /// The savings bucket this posting targets, if any.
    pub fn bucket_id(&self) -> Option<SavingsBucketId> {
        match self {
            PostingTarget::Wallet(_) => None,
            PostingTarget::Bucket(id) => Some(*id),
        }
    }
}

/// One signed ledger leg belonging to exactly one [TransactionEvent].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    /// The ID of the posting.
    pub id: PostingId,
    /// The event that owns this posting.
    pub event_id: EventId,
    /// The account the posting moves money into or out of.
    pub target: PostingTarget,
    /// Signed amount in the smallest currency unit. Positive means money
    /// entering the account, negative means money leaving it.
    pub amount_idr: i64,
    /// When the row was created.
    pub created_at: OffsetDateTime,
}

/// A transaction event together with its postings and derived category name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionWithPostings {
    /// The event itself.
    pub event: TransactionEvent,
    /// The event's postings, one or two depending on the kind.
    pub postings: Vec<Posting>,
    /// The name of the event's category, when it has one.
    pub category_name: Option<String>,
}

/// Create the ledger tables and their indexes.
///
/// # Errors
/// Returns an error if the tables cannot be created or if there is an SQL
/// error.
pub(crate) fn create_ledger_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS transaction_event (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            kind TEXT NOT NULL,
            occurred_at TEXT NOT NULL,
            note TEXT,
            payee TEXT,
            category_id INTEGER REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL,
            deleted_at TEXT,
            idempotency_key TEXT NOT NULL UNIQUE CHECK(length(idempotency_key) <= 36),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_event_occurred_at
            ON transaction_event(occurred_at);
        CREATE INDEX IF NOT EXISTS idx_transaction_event_kind_occurred_at
            ON transaction_event(kind, occurred_at);
        CREATE INDEX IF NOT EXISTS idx_transaction_event_category_occurred_at
            ON transaction_event(category_id, occurred_at);

        CREATE TABLE IF NOT EXISTS posting (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id INTEGER NOT NULL REFERENCES transaction_event(id),
            wallet_id INTEGER REFERENCES wallet(id),
            savings_bucket_id INTEGER REFERENCES savings_bucket(id),
            amount_idr INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            CHECK ((wallet_id IS NULL) <> (savings_bucket_id IS NULL))
        );

        CREATE INDEX IF NOT EXISTS idx_posting_event_id ON posting(event_id);
        CREATE INDEX IF NOT EXISTS idx_posting_wallet_created_at
            ON posting(wallet_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_posting_bucket_created_at
            ON posting(savings_bucket_id, created_at);",
    )?;

    Ok(())
}

/// Map a database row to a [TransactionEvent].
///
/// Expects the event columns in table order starting at index 0.
pub(crate) fn map_event_row(row: &Row) -> Result<TransactionEvent, rusqlite::Error> {
    let kind_text: String = row.get(1)?;

    Ok(TransactionEvent {
        id: row.get(0)?,
        kind: TransactionKind::from_column(&kind_text, 1)?,
        occurred_at: row.get(2)?,
        note: row.get(3)?,
        payee: row.get(4)?,
        category_id: row.get(5)?,
        deleted_at: row.get(6)?,
        idempotency_key: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

/// Map a database row to a [Posting].
///
/// Expects the posting columns in table order starting at index 0.
pub(crate) fn map_posting_row(row: &Row) -> Result<Posting, rusqlite::Error> {
    let wallet_id: Option<WalletId> = row.get(2)?;
    let bucket_id: Option<SavingsBucketId> = row.get(3)?;

    let target = match (wallet_id, bucket_id) {
        (Some(wallet_id), None) => PostingTarget::Wallet(wallet_id),
        (None, Some(bucket_id)) => PostingTarget::Bucket(bucket_id),
        _ => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Null,
                "posting must reference exactly one of a wallet or a savings bucket".into(),
            ));
        }
    };

    Ok(Posting {
        id: row.get(0)?,
        event_id: row.get(1)?,
        target,
        amount_idr: row.get(4)?,
        created_at: row.get(5)?,
    })
}
