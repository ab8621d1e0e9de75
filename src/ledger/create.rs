//! Command handlers for recording new ledger events.
//!
//! Each transaction kind has a typed input struct and a `create_*` function.
//! Every create validates its input, checks the referenced wallets,
//! categories, and buckets, then inserts the event and its postings in one
//! atomic database transaction. Idempotency keys make retried calls safe: a
//! replayed key returns the event recorded by the first call, unchanged.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};
use uuid::Uuid;

use crate::{
    Error,
    database_id::{CategoryId, SavingsBucketId, WalletId},
    ledger::{
        models::{
            IDEMPOTENCY_KEY_MAX_LENGTH, PostingTarget, TransactionKind, TransactionWithPostings,
        },
        query::get_transaction,
    },
    reference::{CategoryKind, require_active_bucket, require_active_wallet, require_category},
};

/// The smallest amount a transaction may move, in minor currency units.
pub const MINIMUM_AMOUNT_IDR: i64 = 100;

/// Input for recording money spent from a wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExpense {
    /// When the money was spent.
    pub occurred_at: OffsetDateTime,
    /// The wallet the money left.
    pub wallet_id: WalletId,
    /// The expense category the spending belongs to.
    pub category_id: CategoryId,
    /// How much was spent, as a positive magnitude.
    pub amount_idr: i64,
    /// Optional free-text description.
    pub note: Option<String>,
    /// Optional counterparty.
    pub payee: Option<String>,
    /// Optional key making retries safe; generated when absent.
    pub idempotency_key: Option<String>,
}

/// Input for recording money earned into a wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewIncome {
    /// When the money was earned.
    pub occurred_at: OffsetDateTime,
    /// The wallet the money entered.
    pub wallet_id: WalletId,
    /// The income category, if the caller wants one.
    pub category_id: Option<CategoryId>,
    /// How much was earned, as a positive magnitude.
    pub amount_idr: i64,
    /// Optional free-text description.
    pub note: Option<String>,
    /// Optional counterparty.
    pub payee: Option<String>,
    /// Optional key making retries safe; generated when absent.
    pub idempotency_key: Option<String>,
}

/// Input for moving money between two wallets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransfer {
    /// When the money moved.
    pub occurred_at: OffsetDateTime,
    /// The wallet the money left.
    pub from_wallet_id: WalletId,
    /// The wallet the money entered. Must differ from `from_wallet_id`.
    pub to_wallet_id: WalletId,
    /// How much was moved, as a positive magnitude.
    pub amount_idr: i64,
    /// Optional free-text description.
    pub note: Option<String>,
    /// Optional key making retries safe; generated when absent.
    pub idempotency_key: Option<String>,
}

/// Input for moving money from a wallet into a savings bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSavingsContribution {
    /// When the money moved.
    pub occurred_at: OffsetDateTime,
    /// The wallet the money left.
    pub wallet_id: WalletId,
    /// The bucket the money entered.
    pub savings_bucket_id: SavingsBucketId,
    /// How much was moved, as a positive magnitude.
    pub amount_idr: i64,
    /// Optional free-text description.
    pub note: Option<String>,
    /// Optional key making retries safe; generated when absent.
    pub idempotency_key: Option<String>,
}

/// Input for moving money from a savings bucket back into a wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSavingsWithdrawal {
    /// When the money moved.
    pub occurred_at: OffsetDateTime,
    /// The wallet the money entered.
    pub wallet_id: WalletId,
    /// The bucket the money left.
    pub savings_bucket_id: SavingsBucketId,
    /// How much was moved, as a positive magnitude.
    pub amount_idr: i64,
    /// Optional free-text description.
    pub note: Option<String>,
    /// Optional key making retries safe; generated when absent.
    pub idempotency_key: Option<String>,
}

/// Record an expense: one wallet posting carrying the negated amount.
///
/// # Errors
/// This function will return an:
/// - [Error::Validation] if the amount is below [MINIMUM_AMOUNT_IDR], the
///   idempotency key is malformed, or the category is missing or not an
///   expense category,
/// - [Error::WalletNotFound] if the wallet is missing or archived,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_expense(
    input: NewExpense,
    connection: &Connection,
) -> Result<TransactionWithPostings, Error> {
    let amount = validate_amount(input.amount_idr)?;
    let key = resolve_idempotency_key(input.idempotency_key)?;
    if let Some(existing) = find_by_idempotency_key(&key, connection)? {
        return Ok(existing);
    }

    require_active_wallet(input.wallet_id, connection)?;
    require_category(input.category_id, CategoryKind::Expense, connection)?;

    write_event(
        EventFields {
            kind: TransactionKind::Expense,
            occurred_at: input.occurred_at,
            note: input.note,
            payee: input.payee,
            category_id: Some(input.category_id),
            idempotency_key: key,
        },
        &[(PostingTarget::Wallet(input.wallet_id), -amount)],
        connection,
    )
}

/// Record an income: one wallet posting carrying the amount as-is.
///
/// # Errors
/// This function will return an:
/// - [Error::Validation] if the amount is below [MINIMUM_AMOUNT_IDR], the
///   idempotency key is malformed, or a category was given that is missing
///   or not an income category,
/// - [Error::WalletNotFound] if the wallet is missing or archived,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_income(
    input: NewIncome,
    connection: &Connection,
) -> Result<TransactionWithPostings, Error> {
    let amount = validate_amount(input.amount_idr)?;
    let key = resolve_idempotency_key(input.idempotency_key)?;
    if let Some(existing) = find_by_idempotency_key(&key, connection)? {
        return Ok(existing);
    }

    require_active_wallet(input.wallet_id, connection)?;
    if let Some(category_id) = input.category_id {
        require_category(category_id, CategoryKind::Income, connection)?;
    }

    write_event(
        EventFields {
            kind: TransactionKind::Income,
            occurred_at: input.occurred_at,
            note: input.note,
            payee: input.payee,
            category_id: input.category_id,
            idempotency_key: key,
        },
        &[(PostingTarget::Wallet(input.wallet_id), amount)],
        connection,
    )
}

/// Record a transfer: two wallet postings that are exact negatives.
///
/// # Errors
/// This function will return an:
/// - [Error::Validation] if the amount is below [MINIMUM_AMOUNT_IDR], the
///   idempotency key is malformed, or both endpoints are the same wallet,
/// - [Error::WalletNotFound] if either wallet is missing or archived,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transfer(
    input: NewTransfer,
    connection: &Connection,
) -> Result<TransactionWithPostings, Error> {
    let amount = validate_amount(input.amount_idr)?;
    if input.from_wallet_id == input.to_wallet_id {
        return Err(Error::validation(
            "to_wallet_id",
            "from and to wallets must be different",
        ));
    }
    let key = resolve_idempotency_key(input.idempotency_key)?;
    if let Some(existing) = find_by_idempotency_key(&key, connection)? {
        return Ok(existing);
    }

    require_active_wallet(input.from_wallet_id, connection)?;
    require_active_wallet(input.to_wallet_id, connection)?;

    write_event(
        EventFields {
            kind: TransactionKind::Transfer,
            occurred_at: input.occurred_at,
            note: input.note,
            payee: None,
            category_id: None,
            idempotency_key: key,
        },
        &[
            (PostingTarget::Wallet(input.from_wallet_id), -amount),
            (PostingTarget::Wallet(input.to_wallet_id), amount),
        ],
        connection,
    )
}

/// Record a savings contribution: money leaves a wallet and enters a bucket.
///
/// # Errors
/// This function will return an:
/// - [Error::Validation] if the amount is below [MINIMUM_AMOUNT_IDR] or the
///   idempotency key is malformed,
/// - [Error::WalletNotFound] if the wallet is missing or archived,
/// - [Error::BucketNotFound] if the bucket is missing or archived,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_savings_contribution(
    input: NewSavingsContribution,
    connection: &Connection,
) -> Result<TransactionWithPostings, Error> {
    let amount = validate_amount(input.amount_idr)?;
    let key = resolve_idempotency_key(input.idempotency_key)?;
    if let Some(existing) = find_by_idempotency_key(&key, connection)? {
        return Ok(existing);
    }

    require_active_wallet(input.wallet_id, connection)?;
    require_active_bucket(input.savings_bucket_id, connection)?;

    write_event(
        EventFields {
            kind: TransactionKind::SavingsContribution,
            occurred_at: input.occurred_at,
            note: input.note,
            payee: None,
            category_id: None,
            idempotency_key: key,
        },
        &[
            (PostingTarget::Wallet(input.wallet_id), -amount),
            (PostingTarget::Bucket(input.savings_bucket_id), amount),
        ],
        connection,
    )
}

/// Record a savings withdrawal: money leaves a bucket and enters a wallet.
///
/// # Errors
/// This function will return an:
/// - [Error::Validation] if the amount is below [MINIMUM_AMOUNT_IDR] or the
///   idempotency key is malformed,
/// - [Error::WalletNotFound] if the wallet is missing or archived,
/// - [Error::BucketNotFound] if the bucket is missing or archived,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_savings_withdrawal(
    input: NewSavingsWithdrawal,
    connection: &Connection,
) -> Result<TransactionWithPostings, Error> {
    let amount = validate_amount(input.amount_idr)?;
    let key = resolve_idempotency_key(input.idempotency_key)?;
    if let Some(existing) = find_by_idempotency_key(&key, connection)? {
        return Ok(existing);
    }

    require_active_wallet(input.wallet_id, connection)?;
    require_active_bucket(input.savings_bucket_id, connection)?;

    write_event(
        EventFields {
            kind: TransactionKind::SavingsWithdrawal,
            occurred_at: input.occurred_at,
            note: input.note,
            payee: None,
            category_id: None,
            idempotency_key: key,
        },
        &[
            (PostingTarget::Bucket(input.savings_bucket_id), -amount),
            (PostingTarget::Wallet(input.wallet_id), amount),
        ],
        connection,
    )
}

/// Check that a requested amount is a positive magnitude of at least
/// [MINIMUM_AMOUNT_IDR] minor units.
pub(crate) fn validate_amount(amount_idr: i64) -> Result<i64, Error> {
    if amount_idr < MINIMUM_AMOUNT_IDR {
        return Err(Error::validation(
            "amount_idr",
            format!("amount must be at least {MINIMUM_AMOUNT_IDR} minor units, got {amount_idr}"),
        ));
    }

    Ok(amount_idr)
}

/// Use the caller's idempotency key, or generate one so every event carries
/// a key and retried requests stay safe.
fn resolve_idempotency_key(key: Option<String>) -> Result<String, Error> {
    match key {
        None => Ok(Uuid::new_v4().to_string()),
        Some(key) if key.trim().is_empty() => Err(Error::validation(
            "idempotency_key",
            "idempotency key must not be blank",
        )),
        Some(key) if key.len() > IDEMPOTENCY_KEY_MAX_LENGTH => Err(Error::validation(
            "idempotency_key",
            format!(
                "idempotency key must be at most {IDEMPOTENCY_KEY_MAX_LENGTH} characters, got {}",
                key.len()
            ),
        )),
        Some(key) => Ok(key),
    }
}

/// Look up the event recorded under an idempotency key, if any.
fn find_by_idempotency_key(
    key: &str,
    connection: &Connection,
) -> Result<Option<TransactionWithPostings>, Error> {
    use rusqlite::OptionalExtension;

    let event_id = connection
        .prepare("SELECT id FROM transaction_event WHERE idempotency_key = :key")?
        .query_row(&[(":key", &key)], |row| row.get(0))
        .optional()?;

    match event_id {
        Some(event_id) => get_transaction(event_id, connection),
        None => Ok(None),
    }
}

/// The event columns shared by every create.
struct EventFields {
    kind: TransactionKind,
    occurred_at: OffsetDateTime,
    note: Option<String>,
    payee: Option<String>,
    category_id: Option<CategoryId>,
    idempotency_key: String,
}

/// Insert one event and its postings atomically, then re-read the committed
/// record.
///
/// A unique-constraint failure on the idempotency key means a concurrent
/// create with the same key won the race; the earlier event is returned
/// instead of an error.
fn write_event(
    fields: EventFields,
    legs: &[(PostingTarget, i64)],
    connection: &Connection,
) -> Result<TransactionWithPostings, Error> {
    let now = OffsetDateTime::now_utc();
    let occurred_at = fields.occurred_at.to_offset(UtcOffset::UTC);

    let tx = connection.unchecked_transaction()?;

    let insert_result = tx
        .prepare(
            "INSERT INTO transaction_event
                (kind, occurred_at, note, payee, category_id, idempotency_key, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             RETURNING id",
        )?
        .query_row(
            (
                fields.kind.as_str(),
                occurred_at,
                &fields.note,
                &fields.payee,
                fields.category_id,
                &fields.idempotency_key,
                now,
                now,
            ),
            |row| row.get(0),
        );

    let event_id = match insert_result {
        Ok(event_id) => event_id,
        Err(rusqlite::Error::SqliteFailure(sql_error, Some(ref desc)))
            if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                && desc.ends_with("transaction_event.idempotency_key") =>
        {
            // Lost the race against a concurrent create with the same key.
            // The earlier event wins; the fields of this request are
            // discarded.
            drop(tx);
            tracing::debug!(
                "idempotency key {} already recorded, returning the prior event",
                fields.idempotency_key
            );
            return find_by_idempotency_key(&fields.idempotency_key, connection)?
                .ok_or(Error::NotFound);
        }
        Err(error) => return Err(error.into()),
    };

    for (target, amount_idr) in legs {
        tx.execute(
            "INSERT INTO posting (event_id, wallet_id, savings_bucket_id, amount_idr, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            (
                event_id,
                target.wallet_id(),
                target.bucket_id(),
                amount_idr,
                now,
            ),
        )?;
    }

    tx.commit()?;

    get_transaction(event_id, connection)?.ok_or(Error::NotFound)
}
