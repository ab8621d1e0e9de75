//! Command handlers for updating existing ledger events.
//!
//! Updates are partial: `None` leaves a field untouched, and for nullable
//! fields the inner `Option` distinguishes clearing (`Some(None)`) from
//! keeping (`None`). Changed references are re-validated before anything is
//! written, and amount changes re-derive the signed posting amounts with the
//! same sign convention as creation. All writes for one call happen in a
//! single database transaction.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

use crate::{
    Error,
    database_id::{CategoryId, EventId, PostingId, SavingsBucketId, WalletId},
    ledger::{
        create::validate_amount,
        models::{PostingTarget, TransactionKind, TransactionWithPostings},
        query::get_transaction,
    },
    reference::{CategoryKind, require_active_bucket, require_active_wallet, require_category},
};

/// Partial update for an expense.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateExpense {
    /// New occurrence time.
    pub occurred_at: Option<OffsetDateTime>,
    /// Move the expense to a different wallet.
    pub wallet_id: Option<WalletId>,
    /// Change the category. An expense always needs one, so `Some(None)` is
    /// rejected.
    pub category_id: Option<Option<CategoryId>>,
    /// New positive magnitude.
    pub amount_idr: Option<i64>,
    /// Change or clear the note.
    pub note: Option<Option<String>>,
    /// Change or clear the payee.
    pub payee: Option<Option<String>>,
}

/// Partial update for an income.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateIncome {
    /// New occurrence time.
    pub occurred_at: Option<OffsetDateTime>,
    /// Move the income to a different wallet.
    pub wallet_id: Option<WalletId>,
    /// Change or clear the category.
    pub category_id: Option<Option<CategoryId>>,
    /// New positive magnitude.
    pub amount_idr: Option<i64>,
    /// Change or clear the note.
    pub note: Option<Option<String>>,
    /// Change or clear the payee.
    pub payee: Option<Option<String>>,
}

/// Partial update for a transfer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateTransfer {
    /// New occurrence time.
    pub occurred_at: Option<OffsetDateTime>,
    /// Change the wallet the money left.
    pub from_wallet_id: Option<WalletId>,
    /// Change the wallet the money entered.
    pub to_wallet_id: Option<WalletId>,
    /// New positive magnitude.
    pub amount_idr: Option<i64>,
    /// Change or clear the note.
    pub note: Option<Option<String>>,
}

/// Partial update for a savings contribution or withdrawal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateSavingsMovement {
    /// New occurrence time.
    pub occurred_at: Option<OffsetDateTime>,
    /// Change the wallet side of the movement.
    pub wallet_id: Option<WalletId>,
    /// Change the bucket side of the movement.
    pub savings_bucket_id: Option<SavingsBucketId>,
    /// New positive magnitude.
    pub amount_idr: Option<i64>,
    /// Change or clear the note.
    pub note: Option<Option<String>>,
}

/// Update an expense.
///
/// # Errors
/// This function will return an:
/// - [Error::TransactionNotFound] if `id` does not refer to a transaction,
/// - [Error::TransactionDeleted] if the transaction was soft-deleted,
/// - [Error::KindMismatch] if the transaction is not an expense,
/// - [Error::Validation] if a changed field fails validation,
/// - [Error::WalletNotFound] if a changed wallet is missing or archived,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_expense(
    id: EventId,
    patch: UpdateExpense,
    connection: &Connection,
) -> Result<TransactionWithPostings, Error> {
    let current = load_for_update(id, TransactionKind::Expense, connection)?;
    let leg = single_wallet_leg(&current)?;

    let amount = match patch.amount_idr {
        Some(amount) => validate_amount(amount)?,
        None => leg.amount_idr.abs(),
    };

    let wallet_id = patch.wallet_id.unwrap_or(leg.wallet_id);
    if patch.wallet_id.is_some() {
        require_active_wallet(wallet_id, connection)?;
    }

    let category_id = match patch.category_id {
        Some(Some(category_id)) => {
            require_category(category_id, CategoryKind::Expense, connection)?;
            Some(category_id)
        }
        Some(None) => {
            return Err(Error::validation(
                "category_id",
                "an expense requires a category",
            ));
        }
        None => current.event.category_id,
    };

    apply_update(
        &current,
        EventPatch {
            occurred_at: patch.occurred_at,
            note: patch.note,
            payee: patch.payee,
            category_id,
        },
        &[PostingChange {
            posting_id: leg.posting_id,
            target: PostingTarget::Wallet(wallet_id),
            amount_idr: -amount,
        }],
        connection,
    )
}

/// Update an income.
///
/// # Errors
/// This function will return an:
/// - [Error::TransactionNotFound] if `id` does not refer to a transaction,
/// - [Error::TransactionDeleted] if the transaction was soft-deleted,
/// - [Error::KindMismatch] if the transaction is not an income,
/// - [Error::Validation] if a changed field fails validation,
/// - [Error::WalletNotFound] if a changed wallet is missing or archived,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_income(
    id: EventId,
    patch: UpdateIncome,
    connection: &Connection,
) -> Result<TransactionWithPostings, Error> {
    let current = load_for_update(id, TransactionKind::Income, connection)?;
    let leg = single_wallet_leg(&current)?;

    let amount = match patch.amount_idr {
        Some(amount) => validate_amount(amount)?,
        None => leg.amount_idr.abs(),
    };

    let wallet_id = patch.wallet_id.unwrap_or(leg.wallet_id);
    if patch.wallet_id.is_some() {
        require_active_wallet(wallet_id, connection)?;
    }

    let category_id = match patch.category_id {
        Some(Some(category_id)) => {
            require_category(category_id, CategoryKind::Income, connection)?;
            Some(category_id)
        }
        Some(None) => None,
        None => current.event.category_id,
    };

    apply_update(
        &current,
        EventPatch {
            occurred_at: patch.occurred_at,
            note: patch.note,
            payee: patch.payee,
            category_id,
        },
        &[PostingChange {
            posting_id: leg.posting_id,
            target: PostingTarget::Wallet(wallet_id),
            amount_idr: amount,
        }],
        connection,
    )
}

/// Update a transfer.
///
/// If either endpoint wallet changes, the resulting pair must still name two
/// different wallets; this is checked against the merged old and new
/// endpoints, so setting only one side can fail too.
///
/// # Errors
/// This function will return an:
/// - [Error::TransactionNotFound] if `id` does not refer to a transaction,
/// - [Error::TransactionDeleted] if the transaction was soft-deleted,
/// - [Error::KindMismatch] if the transaction is not a transfer,
/// - [Error::Validation] if a changed field fails validation or the merged
///   endpoints collide,
/// - [Error::WalletNotFound] if a changed wallet is missing or archived,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transfer(
    id: EventId,
    patch: UpdateTransfer,
    connection: &Connection,
) -> Result<TransactionWithPostings, Error> {
    let current = load_for_update(id, TransactionKind::Transfer, connection)?;
    let legs = transfer_legs(&current)?;

    let amount = match patch.amount_idr {
        Some(amount) => validate_amount(amount)?,
        None => legs.amount_idr,
    };

    let from_wallet_id = patch.from_wallet_id.unwrap_or(legs.from_wallet_id);
    let to_wallet_id = patch.to_wallet_id.unwrap_or(legs.to_wallet_id);
    if from_wallet_id == to_wallet_id {
        return Err(Error::validation(
            "to_wallet_id",
            "from and to wallets must be different",
        ));
    }
    if patch.from_wallet_id.is_some() {
        require_active_wallet(from_wallet_id, connection)?;
    }
    if patch.to_wallet_id.is_some() {
        require_active_wallet(to_wallet_id, connection)?;
    }

    apply_update(
        &current,
        EventPatch {
            occurred_at: patch.occurred_at,
            note: patch.note,
            payee: None,
            category_id: current.event.category_id,
        },
        &[
            PostingChange {
                posting_id: legs.from_posting_id,
                target: PostingTarget::Wallet(from_wallet_id),
                amount_idr: -amount,
            },
            PostingChange {
                posting_id: legs.to_posting_id,
                target: PostingTarget::Wallet(to_wallet_id),
                amount_idr: amount,
            },
        ],
        connection,
    )
}

/// Update a savings contribution.
///
/// # Errors
/// This function will return an:
/// - [Error::TransactionNotFound] if `id` does not refer to a transaction,
/// - [Error::TransactionDeleted] if the transaction was soft-deleted,
/// - [Error::KindMismatch] if the transaction is not a savings contribution,
/// - [Error::Validation] if a changed field fails validation,
/// - [Error::WalletNotFound] or [Error::BucketNotFound] if a changed account
///   is missing or archived,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_savings_contribution(
    id: EventId,
    patch: UpdateSavingsMovement,
    connection: &Connection,
) -> Result<TransactionWithPostings, Error> {
    update_savings_movement(id, TransactionKind::SavingsContribution, patch, connection)
}

/// Update a savings withdrawal.
///
/// # Errors
/// This function will return an:
/// - [Error::TransactionNotFound] if `id` does not refer to a transaction,
/// - [Error::TransactionDeleted] if the transaction was soft-deleted,
/// - [Error::KindMismatch] if the transaction is not a savings withdrawal,
/// - [Error::Validation] if a changed field fails validation,
/// - [Error::WalletNotFound] or [Error::BucketNotFound] if a changed account
///   is missing or archived,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_savings_withdrawal(
    id: EventId,
    patch: UpdateSavingsMovement,
    connection: &Connection,
) -> Result<TransactionWithPostings, Error> {
    update_savings_movement(id, TransactionKind::SavingsWithdrawal, patch, connection)
}

fn update_savings_movement(
    id: EventId,
    kind: TransactionKind,
    patch: UpdateSavingsMovement,
    connection: &Connection,
) -> Result<TransactionWithPostings, Error> {
    let current = load_for_update(id, kind, connection)?;
    let legs = savings_legs(&current)?;

    let amount = match patch.amount_idr {
        Some(amount) => validate_amount(amount)?,
        None => legs.amount_idr,
    };

    let wallet_id = patch.wallet_id.unwrap_or(legs.wallet_id);
    if patch.wallet_id.is_some() {
        require_active_wallet(wallet_id, connection)?;
    }
    let bucket_id = patch.savings_bucket_id.unwrap_or(legs.bucket_id);
    if patch.savings_bucket_id.is_some() {
        require_active_bucket(bucket_id, connection)?;
    }

    // A contribution drains the wallet; a withdrawal drains the bucket.
    let bucket_sign = match kind {
        TransactionKind::SavingsContribution => 1,
        _ => -1,
    };

    apply_update(
        &current,
        EventPatch {
            occurred_at: patch.occurred_at,
            note: patch.note,
            payee: None,
            category_id: current.event.category_id,
        },
        &[
            PostingChange {
                posting_id: legs.wallet_posting_id,
                target: PostingTarget::Wallet(wallet_id),
                amount_idr: -bucket_sign * amount,
            },
            PostingChange {
                posting_id: legs.bucket_posting_id,
                target: PostingTarget::Bucket(bucket_id),
                amount_idr: bucket_sign * amount,
            },
        ],
        connection,
    )
}

/// Load the transaction an updater wants to change, rejecting deleted rows
/// and kind mismatches.
fn load_for_update(
    id: EventId,
    expected: TransactionKind,
    connection: &Connection,
) -> Result<TransactionWithPostings, Error> {
    let current = get_transaction(id, connection)?.ok_or(Error::TransactionNotFound(id))?;

    if current.event.deleted_at.is_some() {
        return Err(Error::TransactionDeleted(id));
    }

    if current.event.kind != expected {
        return Err(Error::KindMismatch {
            id,
            expected,
            actual: current.event.kind,
        });
    }

    Ok(current)
}

struct WalletLeg {
    posting_id: PostingId,
    wallet_id: WalletId,
    amount_idr: i64,
}

/// The single wallet posting of an expense or income.
fn single_wallet_leg(current: &TransactionWithPostings) -> Result<WalletLeg, Error> {
    match current.postings.as_slice() {
        [posting] => match posting.target {
            PostingTarget::Wallet(wallet_id) => Ok(WalletLeg {
                posting_id: posting.id,
                wallet_id,
                amount_idr: posting.amount_idr,
            }),
            PostingTarget::Bucket(_) => Err(Error::CorruptPostings(current.event.id)),
        },
        _ => Err(Error::CorruptPostings(current.event.id)),
    }
}

struct TransferLegs {
    from_posting_id: PostingId,
    from_wallet_id: WalletId,
    to_posting_id: PostingId,
    to_wallet_id: WalletId,
    amount_idr: i64,
}

/// The two wallet postings of a transfer: the negative "from" leg and the
/// positive "to" leg.
fn transfer_legs(current: &TransactionWithPostings) -> Result<TransferLegs, Error> {
    let from = current
        .postings
        .iter()
        .find(|posting| posting.amount_idr < 0);
    let to = current
        .postings
        .iter()
        .find(|posting| posting.amount_idr > 0);

    match (from, to) {
        (Some(from), Some(to)) if current.postings.len() == 2 => {
            match (from.target, to.target) {
                (PostingTarget::Wallet(from_wallet_id), PostingTarget::Wallet(to_wallet_id)) => {
                    Ok(TransferLegs {
                        from_posting_id: from.id,
                        from_wallet_id,
                        to_posting_id: to.id,
                        to_wallet_id,
                        amount_idr: to.amount_idr,
                    })
                }
                _ => Err(Error::CorruptPostings(current.event.id)),
            }
        }
        _ => Err(Error::CorruptPostings(current.event.id)),
    }
}

struct SavingsLegs {
    wallet_posting_id: PostingId,
    wallet_id: WalletId,
    bucket_posting_id: PostingId,
    bucket_id: SavingsBucketId,
    amount_idr: i64,
}

/// The wallet and bucket postings of a savings movement.
fn savings_legs(current: &TransactionWithPostings) -> Result<SavingsLegs, Error> {
    let wallet = current
        .postings
        .iter()
        .find_map(|posting| match posting.target {
            PostingTarget::Wallet(wallet_id) => Some((posting, wallet_id)),
            PostingTarget::Bucket(_) => None,
        });
    let bucket = current
        .postings
        .iter()
        .find_map(|posting| match posting.target {
            PostingTarget::Bucket(bucket_id) => Some((posting, bucket_id)),
            PostingTarget::Wallet(_) => None,
        });

    match (wallet, bucket) {
        (Some((wallet_posting, wallet_id)), Some((bucket_posting, bucket_id)))
            if current.postings.len() == 2 =>
        {
            Ok(SavingsLegs {
                wallet_posting_id: wallet_posting.id,
                wallet_id,
                bucket_posting_id: bucket_posting.id,
                bucket_id,
                amount_idr: bucket_posting.amount_idr.abs(),
            })
        }
        _ => Err(Error::CorruptPostings(current.event.id)),
    }
}

/// The merged event-level fields an update writes.
struct EventPatch {
    occurred_at: Option<OffsetDateTime>,
    note: Option<Option<String>>,
    payee: Option<Option<String>>,
    category_id: Option<CategoryId>,
}

/// One posting rewrite: the new target and signed amount for a posting row.
struct PostingChange {
    posting_id: PostingId,
    target: PostingTarget,
    amount_idr: i64,
}

/// Keep the current value unless the patch provides one; `Some(None)`
/// clears.
fn merge<T>(patch: Option<Option<T>>, current: Option<T>) -> Option<T> {
    match patch {
        Some(value) => value,
        None => current,
    }
}

/// Write the merged event fields and rewritten postings in one transaction,
/// then re-read the committed record.
fn apply_update(
    current: &TransactionWithPostings,
    patch: EventPatch,
    changes: &[PostingChange],
    connection: &Connection,
) -> Result<TransactionWithPostings, Error> {
    let now = OffsetDateTime::now_utc();
    let occurred_at = patch
        .occurred_at
        .map(|timestamp| timestamp.to_offset(UtcOffset::UTC))
        .unwrap_or(current.event.occurred_at);
    let note = merge(patch.note, current.event.note.clone());
    let payee = merge(patch.payee, current.event.payee.clone());

    let tx = connection.unchecked_transaction()?;

    tx.execute(
        "UPDATE transaction_event
         SET occurred_at = ?1, note = ?2, payee = ?3, category_id = ?4, updated_at = ?5
         WHERE id = ?6",
        (
            occurred_at,
            &note,
            &payee,
            patch.category_id,
            now,
            current.event.id,
        ),
    )?;

    for change in changes {
        tx.execute(
            "UPDATE posting SET wallet_id = ?1, savings_bucket_id = ?2, amount_idr = ?3
             WHERE id = ?4",
            (
                change.target.wallet_id(),
                change.target.bucket_id(),
                change.amount_idr,
                change.posting_id,
            ),
        )?;
    }

    tx.commit()?;

    get_transaction(current.event.id, connection)?.ok_or(Error::NotFound)
}
