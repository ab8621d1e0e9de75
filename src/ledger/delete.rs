//! Soft delete, restore, and permanent removal of ledger events.

use std::collections::{HashMap, HashSet};

use rusqlite::{Connection, ToSql, params_from_iter};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::EventId,
    ledger::{models::TransactionWithPostings, query::get_transaction},
};

/// The most ids a single [bulk_delete] call will accept, bounding the size
/// of the batch write.
pub const BULK_DELETE_MAX_IDS: usize = 100;

/// The per-call outcome of [bulk_delete].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkDeleteOutcome {
    /// How many transactions this call soft-deleted.
    pub deleted_count: usize,
    /// The ids that were not found or were already deleted, in input order.
    pub failed_ids: Vec<EventId>,
}

/// Soft-delete a batch of transactions.
///
/// This is a best-effort batch: every id is classified up front, the
/// deletable subset is soft-deleted in one atomic write, and ids that were
/// missing or already deleted come back in `failed_ids` instead of failing
/// the call. Duplicate ids collapse to their first occurrence.
///
/// # Errors
/// This function will return an:
/// - [Error::Validation] if `ids` is empty or holds more than
///   [BULK_DELETE_MAX_IDS] ids,
/// - or [Error::SqlError] if there is an SQL error.
pub fn bulk_delete(ids: &[EventId], connection: &Connection) -> Result<BulkDeleteOutcome, Error> {
    if ids.is_empty() {
        return Err(Error::validation(
            "ids",
            "at least one transaction id is required",
        ));
    }
    if ids.len() > BULK_DELETE_MAX_IDS {
        return Err(Error::validation(
            "ids",
            format!(
                "at most {BULK_DELETE_MAX_IDS} transactions may be deleted per call, got {}",
                ids.len()
            ),
        ));
    }

    let placeholders = (1..=ids.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT id, deleted_at IS NOT NULL FROM transaction_event WHERE id IN ({placeholders})"
    );
    let found: HashMap<EventId, bool> = connection
        .prepare(&sql)?
        .query_map(params_from_iter(ids.iter()), |row| {
            Ok((row.get::<_, EventId>(0)?, row.get::<_, bool>(1)?))
        })?
        .collect::<Result<_, _>>()?;

    let mut seen = HashSet::new();
    let mut deletable = Vec::new();
    let mut failed_ids = Vec::new();
    for &id in ids {
        if !seen.insert(id) {
            continue;
        }
        match found.get(&id) {
            Some(false) => deletable.push(id),
            // Missing and already-deleted ids fail individually.
            Some(true) | None => failed_ids.push(id),
        }
    }

    let mut deleted_count = 0;
    if !deletable.is_empty() {
        let now = OffsetDateTime::now_utc();
        let placeholders = (2..=deletable.len() + 1)
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE transaction_event SET deleted_at = ?1, updated_at = ?1
             WHERE id IN ({placeholders}) AND deleted_at IS NULL"
        );

        let tx = connection.unchecked_transaction()?;
        deleted_count = tx.execute(
            &sql,
            params_from_iter(
                std::iter::once(&now as &dyn ToSql)
                    .chain(deletable.iter().map(|id| id as &dyn ToSql)),
            ),
        )?;
        tx.commit()?;
    }

    if !failed_ids.is_empty() {
        tracing::debug!(
            "bulk delete skipped {} of {} transactions (missing or already deleted)",
            failed_ids.len(),
            seen.len()
        );
    }

    Ok(BulkDeleteOutcome {
        deleted_count,
        failed_ids,
    })
}

/// Clear the soft-delete marker on a transaction, making it visible to
/// listings again.
///
/// Restoring a transaction that is not deleted is a no-op returning the
/// current record.
///
/// # Errors
/// This function will return an:
/// - [Error::TransactionNotFound] if `id` does not refer to a transaction,
/// - or [Error::SqlError] if there is an SQL error.
pub fn restore_transaction(
    id: EventId,
    connection: &Connection,
) -> Result<TransactionWithPostings, Error> {
    let now = OffsetDateTime::now_utc();
    connection.execute(
        "UPDATE transaction_event SET deleted_at = NULL, updated_at = ?1
         WHERE id = ?2 AND deleted_at IS NOT NULL",
        (now, id),
    )?;

    get_transaction(id, connection)?.ok_or(Error::TransactionNotFound(id))
}

/// Permanently remove a transaction and its postings.
///
/// This is an administrative escape hatch, not reachable from normal user
/// flows; soft delete is the user-facing operation. Postings are removed
/// before the event to satisfy referential ordering.
///
/// # Errors
/// This function will return an:
/// - [Error::TransactionNotFound] if `id` does not refer to a transaction,
/// - or [Error::SqlError] if there is an SQL error.
pub fn purge_transaction(id: EventId, connection: &Connection) -> Result<(), Error> {
    let tx = connection.unchecked_transaction()?;

    tx.execute("DELETE FROM posting WHERE event_id = ?1", [id])?;
    let rows_affected = tx.execute("DELETE FROM transaction_event WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::TransactionNotFound(id));
    }

    tx.commit()?;

    Ok(())
}
