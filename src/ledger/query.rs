//! Read-side queries: single-event lookup and the filtered transaction
//! listing with its derived display fields.

use std::collections::HashMap;

use rusqlite::{
    Connection, OptionalExtension, ToSql,
    types::{ToSqlOutput, Value},
};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

use crate::{
    Error,
    database_id::{CategoryId, EventId, WalletId},
    ledger::models::{
        Posting, TransactionEvent, TransactionKind, TransactionWithPostings, map_event_row,
        map_posting_row,
    },
    reference::CategoryKind,
};

/// The page size used when a listing does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 50;
/// The largest page size a listing may ask for.
pub const MAX_PAGE_SIZE: u32 = 100;

const UNKNOWN_WALLET: &str = "Unknown Wallet";
const UNKNOWN_BUCKET: &str = "Unknown Bucket";

/// Defines how transactions should be fetched from [list_transactions].
///
/// Every field defaults to "no filter"; deleted transactions are always
/// excluded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionListQuery {
    /// Include transactions that occurred at or after this time.
    pub occurred_from: Option<OffsetDateTime>,
    /// Include transactions that occurred at or before this time.
    pub occurred_to: Option<OffsetDateTime>,
    /// Include only transactions of this kind.
    pub kind: Option<TransactionKind>,
    /// Include only transactions with a posting against this wallet.
    pub wallet_id: Option<WalletId>,
    /// Include only transactions in this category.
    pub category_id: Option<CategoryId>,
    /// Include only transactions whose category is of this kind.
    pub category_kind: Option<CategoryKind>,
    /// Page size, 1 to [MAX_PAGE_SIZE]. Defaults to [DEFAULT_PAGE_SIZE].
    pub limit: Option<u32>,
    /// Number of transactions to skip before the page starts.
    pub offset: u64,
}

/// One row of the transaction listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionListItem {
    /// The event itself.
    pub event: TransactionEvent,
    /// The name of the event's category, when it has one.
    pub category_name: Option<String>,
    /// The magnitude the listing should show: the wallet leg for
    /// expense/income, the "from" leg for transfers, the bucket leg for
    /// savings movements. Always positive.
    pub display_amount_idr: i64,
    /// A human-readable account label for the listing.
    pub display_account: String,
}

/// Retrieve a transaction with its postings and category name by its `id`.
///
/// Soft-deleted transactions are returned too; a direct lookup is the only
/// way to see them.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error. A missing id is
/// `Ok(None)`, not an error.
pub fn get_transaction(
    id: EventId,
    connection: &Connection,
) -> Result<Option<TransactionWithPostings>, Error> {
    let found = connection
        .prepare(
            "SELECT e.id, e.kind, e.occurred_at, e.note, e.payee, e.category_id,
                    e.deleted_at, e.idempotency_key, e.created_at, e.updated_at, c.name
             FROM transaction_event e
             LEFT JOIN category c ON c.id = e.category_id
             WHERE e.id = :id",
        )?
        .query_row(&[(":id", &id)], |row| {
            let event = map_event_row(row)?;
            let category_name: Option<String> = row.get(10)?;
            Ok((event, category_name))
        })
        .optional()?;

    let Some((event, category_name)) = found else {
        return Ok(None);
    };

    let postings = get_postings(event.id, connection)?;

    Ok(Some(TransactionWithPostings {
        event,
        postings,
        category_name,
    }))
}

/// Retrieve the postings owned by an event, in insertion order.
pub(crate) fn get_postings(
    event_id: EventId,
    connection: &Connection,
) -> Result<Vec<Posting>, Error> {
    connection
        .prepare(
            "SELECT id, event_id, wallet_id, savings_bucket_id, amount_idr, created_at
             FROM posting WHERE event_id = :id ORDER BY id ASC",
        )?
        .query_map(&[(":id", &event_id)], map_posting_row)?
        .map(|maybe_posting| maybe_posting.map_err(Error::from))
        .collect()
}

/// List transactions matching `query`, newest first.
///
/// # Errors
/// Returns an:
/// - [Error::Validation] if the page size is out of range,
/// - or [Error::SqlError] if there is an SQL error.
pub fn list_transactions(
    query: &TransactionListQuery,
    connection: &Connection,
) -> Result<Vec<TransactionListItem>, Error> {
    let limit = resolve_limit(query.limit)?;
    let (where_clause, params) = build_filters(query)?;

    let sql = format!(
        "SELECT e.id, e.kind, e.occurred_at, e.note, e.payee, e.category_id,
                e.deleted_at, e.idempotency_key, e.created_at, e.updated_at, c.name
         FROM transaction_event e
         LEFT JOIN category c ON c.id = e.category_id
         WHERE {where_clause}
         ORDER BY e.occurred_at DESC, e.id DESC
         LIMIT {limit} OFFSET {}",
        query.offset
    );

    let events: Vec<(TransactionEvent, Option<String>)> = connection
        .prepare(&sql)?
        .query_map(rusqlite::params_from_iter(params.iter()), |row| {
            let event = map_event_row(row)?;
            let category_name: Option<String> = row.get(10)?;
            Ok((event, category_name))
        })?
        .map(|maybe_row| maybe_row.map_err(Error::from))
        .collect::<Result<_, _>>()?;

    let event_ids: Vec<EventId> = events.iter().map(|(event, _)| event.id).collect();
    let mut legs_by_event = fetch_display_legs(&event_ids, connection)?;

    let items = events
        .into_iter()
        .map(|(event, category_name)| {
            let legs = legs_by_event.remove(&event.id).unwrap_or_default();
            let (display_amount_idr, display_account) = display_fields(event.kind, &legs);

            TransactionListItem {
                event,
                category_name,
                display_amount_idr,
                display_account,
            }
        })
        .collect();

    Ok(items)
}

/// Count the transactions matching `query`, ignoring pagination.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn count_transactions(
    query: &TransactionListQuery,
    connection: &Connection,
) -> Result<u64, Error> {
    let (where_clause, params) = build_filters(query)?;

    let sql = format!(
        "SELECT COUNT(*)
         FROM transaction_event e
         LEFT JOIN category c ON c.id = e.category_id
         WHERE {where_clause}"
    );

    connection
        .prepare(&sql)?
        .query_row(rusqlite::params_from_iter(params.iter()), |row| {
            row.get::<_, i64>(0).map(|count| count as u64)
        })
        .map_err(|error| error.into())
}

/// Convert a timestamp into the TEXT value rusqlite stores, normalized to
/// UTC so range filters compare chronologically.
pub(crate) fn timestamp_value(timestamp: OffsetDateTime) -> Result<Value, Error> {
    match timestamp.to_offset(UtcOffset::UTC).to_sql()? {
        ToSqlOutput::Owned(value) => Ok(value),
        ToSqlOutput::Borrowed(value) => Ok(value.into()),
        other => Err(rusqlite::Error::ToSqlConversionFailure(
            format!("unexpected SQL representation for a timestamp: {other:?}").into(),
        )
        .into()),
    }
}

fn resolve_limit(limit: Option<u32>) -> Result<u32, Error> {
    match limit {
        None => Ok(DEFAULT_PAGE_SIZE),
        Some(limit) if (1..=MAX_PAGE_SIZE).contains(&limit) => Ok(limit),
        Some(limit) => Err(Error::validation(
            "limit",
            format!("page size must be between 1 and {MAX_PAGE_SIZE}, got {limit}"),
        )),
    }
}

/// Build the WHERE clause and its parameters shared by listing and counting.
fn build_filters(query: &TransactionListQuery) -> Result<(String, Vec<Value>), Error> {
    let mut clauses = vec!["e.deleted_at IS NULL".to_owned()];
    let mut params: Vec<Value> = Vec::new();

    if let Some(from) = query.occurred_from {
        params.push(timestamp_value(from)?);
        clauses.push(format!("e.occurred_at >= ?{}", params.len()));
    }

    if let Some(to) = query.occurred_to {
        params.push(timestamp_value(to)?);
        clauses.push(format!("e.occurred_at <= ?{}", params.len()));
    }

    if let Some(kind) = query.kind {
        params.push(Value::Text(kind.as_str().to_owned()));
        clauses.push(format!("e.kind = ?{}", params.len()));
    }

    if let Some(wallet_id) = query.wallet_id {
        params.push(Value::Integer(wallet_id));
        clauses.push(format!(
            "EXISTS (SELECT 1 FROM posting p WHERE p.event_id = e.id AND p.wallet_id = ?{})",
            params.len()
        ));
    }

    if let Some(category_id) = query.category_id {
        params.push(Value::Integer(category_id));
        clauses.push(format!("e.category_id = ?{}", params.len()));
    }

    if let Some(category_kind) = query.category_kind {
        params.push(Value::Text(category_kind.as_str().to_owned()));
        clauses.push(format!("c.kind = ?{}", params.len()));
    }

    Ok((clauses.join(" AND "), params))
}

/// One posting with the resolved name of its account, for display purposes.
/// `name` is `None` when the account is missing or archived.
struct DisplayLeg {
    is_wallet: bool,
    amount_idr: i64,
    name: Option<String>,
}

/// Fetch the postings for a page of events with their account names joined
/// in, keyed by event.
fn fetch_display_legs(
    event_ids: &[EventId],
    connection: &Connection,
) -> Result<HashMap<EventId, Vec<DisplayLeg>>, Error> {
    let mut legs_by_event: HashMap<EventId, Vec<DisplayLeg>> = HashMap::new();
    if event_ids.is_empty() {
        return Ok(legs_by_event);
    }

    let placeholders = (1..=event_ids.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!(
        "SELECT p.event_id, p.wallet_id IS NOT NULL, p.amount_idr,
                CASE WHEN w.archived_at IS NULL THEN w.name END,
                CASE WHEN b.archived_at IS NULL THEN b.name END
         FROM posting p
         LEFT JOIN wallet w ON w.id = p.wallet_id
         LEFT JOIN savings_bucket b ON b.id = p.savings_bucket_id
         WHERE p.event_id IN ({placeholders})
         ORDER BY p.event_id, p.id"
    );

    let mut statement = connection.prepare(&sql)?;
    let rows = statement.query_map(
        rusqlite::params_from_iter(event_ids.iter()),
        |row| {
            let event_id: EventId = row.get(0)?;
            let is_wallet: bool = row.get(1)?;
            let amount_idr: i64 = row.get(2)?;
            let wallet_name: Option<String> = row.get(3)?;
            let bucket_name: Option<String> = row.get(4)?;

            Ok((
                event_id,
                DisplayLeg {
                    is_wallet,
                    amount_idr,
                    name: if is_wallet { wallet_name } else { bucket_name },
                },
            ))
        },
    )?;

    for row in rows {
        let (event_id, leg) = row?;
        legs_by_event.entry(event_id).or_default().push(leg);
    }

    Ok(legs_by_event)
}

/// Derive the display amount and account label for one event from its legs.
///
/// Falls back to the unknown-account labels rather than failing when a leg
/// or its account is missing.
fn display_fields(kind: TransactionKind, legs: &[DisplayLeg]) -> (i64, String) {
    match kind {
        TransactionKind::Expense | TransactionKind::Income => {
            match legs.iter().find(|leg| leg.is_wallet) {
                Some(leg) => (
                    leg.amount_idr.abs(),
                    leg.name.clone().unwrap_or_else(|| UNKNOWN_WALLET.to_owned()),
                ),
                None => (0, UNKNOWN_WALLET.to_owned()),
            }
        }
        TransactionKind::Transfer => {
            let from = legs.iter().find(|leg| leg.is_wallet && leg.amount_idr < 0);
            let to = legs.iter().find(|leg| leg.is_wallet && leg.amount_idr > 0);

            let amount = from.map(|leg| leg.amount_idr.abs()).unwrap_or(0);
            let from_name = from
                .and_then(|leg| leg.name.clone())
                .unwrap_or_else(|| UNKNOWN_WALLET.to_owned());
            let to_name = to
                .and_then(|leg| leg.name.clone())
                .unwrap_or_else(|| UNKNOWN_WALLET.to_owned());

            (amount, format!("{from_name} → {to_name}"))
        }
        TransactionKind::SavingsContribution => {
            let bucket = legs.iter().find(|leg| !leg.is_wallet);
            let amount = bucket.map(|leg| leg.amount_idr.abs()).unwrap_or(0);
            let name = bucket
                .and_then(|leg| leg.name.clone())
                .unwrap_or_else(|| UNKNOWN_BUCKET.to_owned());

            (amount, format!("To: {name}"))
        }
        TransactionKind::SavingsWithdrawal => {
            let bucket = legs.iter().find(|leg| !leg.is_wallet);
            let amount = bucket.map(|leg| leg.amount_idr.abs()).unwrap_or(0);
            let name = bucket
                .and_then(|leg| leg.name.clone())
                .unwrap_or_else(|| UNKNOWN_BUCKET.to_owned());

            (amount, format!("From: {name}"))
        }
    }
}

#[cfg(test)]
mod query_tests {
    use time::macros::datetime;

    use crate::{
        Error,
        ledger::{
            create::{
                NewExpense, NewIncome, NewSavingsContribution, NewSavingsWithdrawal, NewTransfer,
                create_expense, create_income, create_savings_contribution,
                create_savings_withdrawal, create_transfer,
            },
            delete::bulk_delete,
            models::{PostingTarget, TransactionKind},
            query::{TransactionListQuery, count_transactions, get_transaction, list_transactions},
        },
        reference::CategoryKind,
        test_utils::{
            archive_wallet, create_test_bucket, create_test_category, create_test_wallet,
            get_test_connection,
        },
    };

    fn expense_on(
        occurred_at: time::OffsetDateTime,
        wallet_id: i64,
        category_id: i64,
        amount_idr: i64,
    ) -> NewExpense {
        NewExpense {
            occurred_at,
            wallet_id,
            category_id,
            amount_idr,
            note: None,
            payee: None,
            idempotency_key: None,
        }
    }

    #[test]
    fn get_transaction_returns_none_for_missing_id() {
        let connection = get_test_connection();

        let result = get_transaction(42, &connection);

        assert_eq!(result, Ok(None));
    }

    #[test]
    fn get_transaction_round_trips_a_created_expense() {
        let connection = get_test_connection();
        let wallet_id = create_test_wallet("Cash", &connection);
        let category_id = create_test_category("Food", CategoryKind::Expense, &connection);

        let created = create_expense(
            expense_on(datetime!(2025-03-01 12:00 UTC), wallet_id, category_id, 50_000),
            &connection,
        )
        .expect("Could not create expense");

        let fetched = get_transaction(created.event.id, &connection)
            .expect("Could not get transaction")
            .expect("Transaction should exist");

        assert_eq!(fetched, created);
        assert_eq!(fetched.postings[0].amount_idr, -50_000);
        assert_eq!(
            fetched.postings[0].target,
            PostingTarget::Wallet(wallet_id)
        );
    }

    #[test]
    fn get_transaction_returns_soft_deleted_events() {
        let connection = get_test_connection();
        let wallet_id = create_test_wallet("Cash", &connection);
        let category_id = create_test_category("Food", CategoryKind::Expense, &connection);
        let created = create_expense(
            expense_on(datetime!(2025-03-01 12:00 UTC), wallet_id, category_id, 50_000),
            &connection,
        )
        .expect("Could not create expense");

        bulk_delete(&[created.event.id], &connection).expect("Could not delete");

        let fetched = get_transaction(created.event.id, &connection)
            .expect("Could not get transaction")
            .expect("Deleted transaction should still be fetchable by id");

        assert!(fetched.event.deleted_at.is_some());
    }

    #[test]
    fn list_orders_by_occurrence_date_descending() {
        let connection = get_test_connection();
        let wallet_id = create_test_wallet("Cash", &connection);
        let category_id = create_test_category("Food", CategoryKind::Expense, &connection);

        let dates = [
            datetime!(2025-03-03 09:00 UTC),
            datetime!(2025-03-01 09:00 UTC),
            datetime!(2025-03-02 09:00 UTC),
        ];
        for date in dates {
            create_expense(expense_on(date, wallet_id, category_id, 10_000), &connection)
                .expect("Could not create expense");
        }

        let items = list_transactions(&TransactionListQuery::default(), &connection)
            .expect("Could not list transactions");

        let got_dates: Vec<_> = items.iter().map(|item| item.event.occurred_at).collect();
        assert_eq!(
            got_dates,
            vec![
                datetime!(2025-03-03 09:00 UTC),
                datetime!(2025-03-02 09:00 UTC),
                datetime!(2025-03-01 09:00 UTC),
            ]
        );
    }

    #[test]
    fn list_excludes_soft_deleted_events() {
        let connection = get_test_connection();
        let wallet_id = create_test_wallet("Cash", &connection);
        let category_id = create_test_category("Food", CategoryKind::Expense, &connection);

        let keep = create_expense(
            expense_on(datetime!(2025-03-01 12:00 UTC), wallet_id, category_id, 10_000),
            &connection,
        )
        .expect("Could not create expense");
        let remove = create_expense(
            expense_on(datetime!(2025-03-02 12:00 UTC), wallet_id, category_id, 20_000),
            &connection,
        )
        .expect("Could not create expense");

        bulk_delete(&[remove.event.id], &connection).expect("Could not delete");

        let items = list_transactions(&TransactionListQuery::default(), &connection)
            .expect("Could not list transactions");

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].event.id, keep.event.id);
    }

    #[test]
    fn list_filters_by_kind_and_date_range() {
        let connection = get_test_connection();
        let wallet_id = create_test_wallet("Cash", &connection);
        let category_id = create_test_category("Food", CategoryKind::Expense, &connection);

        create_expense(
            expense_on(datetime!(2025-03-01 12:00 UTC), wallet_id, category_id, 10_000),
            &connection,
        )
        .expect("Could not create expense");
        create_income(
            NewIncome {
                occurred_at: datetime!(2025-03-02 12:00 UTC),
                wallet_id,
                category_id: None,
                amount_idr: 5_000_000,
                note: None,
                payee: None,
                idempotency_key: None,
            },
            &connection,
        )
        .expect("Could not create income");
        create_expense(
            expense_on(datetime!(2025-05-01 12:00 UTC), wallet_id, category_id, 30_000),
            &connection,
        )
        .expect("Could not create expense");

        let query = TransactionListQuery {
            kind: Some(TransactionKind::Expense),
            occurred_from: Some(datetime!(2025-02-28 00:00 UTC)),
            occurred_to: Some(datetime!(2025-03-31 23:59 UTC)),
            ..Default::default()
        };
        let items = list_transactions(&query, &connection).expect("Could not list transactions");

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].display_amount_idr, 10_000);
    }

    #[test]
    fn list_filters_by_wallet_participation() {
        let connection = get_test_connection();
        let bank_id = create_test_wallet("Bank", &connection);
        let cash_id = create_test_wallet("Cash", &connection);
        let other_id = create_test_wallet("Other", &connection);

        let transfer = create_transfer(
            NewTransfer {
                occurred_at: datetime!(2025-03-02 08:30 UTC),
                from_wallet_id: bank_id,
                to_wallet_id: cash_id,
                amount_idr: 200_000,
                note: None,
                idempotency_key: None,
            },
            &connection,
        )
        .expect("Could not create transfer");

        // The transfer is listed for both endpoint wallets but not others.
        for wallet_id in [bank_id, cash_id] {
            let items = list_transactions(
                &TransactionListQuery {
                    wallet_id: Some(wallet_id),
                    ..Default::default()
                },
                &connection,
            )
            .expect("Could not list transactions");

            assert_eq!(items.len(), 1);
            assert_eq!(items[0].event.id, transfer.event.id);
        }

        let items = list_transactions(
            &TransactionListQuery {
                wallet_id: Some(other_id),
                ..Default::default()
            },
            &connection,
        )
        .expect("Could not list transactions");
        assert!(items.is_empty());
    }

    #[test]
    fn list_filters_by_category_kind() {
        let connection = get_test_connection();
        let wallet_id = create_test_wallet("Cash", &connection);
        let food_id = create_test_category("Food", CategoryKind::Expense, &connection);
        let salary_id = create_test_category("Salary", CategoryKind::Income, &connection);

        create_expense(
            expense_on(datetime!(2025-03-01 12:00 UTC), wallet_id, food_id, 10_000),
            &connection,
        )
        .expect("Could not create expense");
        create_income(
            NewIncome {
                occurred_at: datetime!(2025-03-25 09:00 UTC),
                wallet_id,
                category_id: Some(salary_id),
                amount_idr: 8_000_000,
                note: None,
                payee: None,
                idempotency_key: None,
            },
            &connection,
        )
        .expect("Could not create income");

        let items = list_transactions(
            &TransactionListQuery {
                category_kind: Some(CategoryKind::Income),
                ..Default::default()
            },
            &connection,
        )
        .expect("Could not list transactions");

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].category_name.as_deref(), Some("Salary"));
    }

    #[test]
    fn list_display_fields_per_kind() {
        let connection = get_test_connection();
        let bank_id = create_test_wallet("Bank", &connection);
        let cash_id = create_test_wallet("Cash", &connection);
        let bucket_id = create_test_bucket("Emergency Fund", &connection);
        let category_id = create_test_category("Food", CategoryKind::Expense, &connection);

        create_expense(
            expense_on(datetime!(2025-03-01 12:00 UTC), cash_id, category_id, 50_000),
            &connection,
        )
        .expect("Could not create expense");
        create_transfer(
            NewTransfer {
                occurred_at: datetime!(2025-03-02 08:30 UTC),
                from_wallet_id: bank_id,
                to_wallet_id: cash_id,
                amount_idr: 200_000,
                note: None,
                idempotency_key: None,
            },
            &connection,
        )
        .expect("Could not create transfer");
        create_savings_contribution(
            NewSavingsContribution {
                occurred_at: datetime!(2025-03-03 19:00 UTC),
                wallet_id: bank_id,
                savings_bucket_id: bucket_id,
                amount_idr: 1_000_000,
                note: None,
                idempotency_key: None,
            },
            &connection,
        )
        .expect("Could not create contribution");
        create_savings_withdrawal(
            NewSavingsWithdrawal {
                occurred_at: datetime!(2025-03-04 10:00 UTC),
                wallet_id: cash_id,
                savings_bucket_id: bucket_id,
                amount_idr: 250_000,
                note: None,
                idempotency_key: None,
            },
            &connection,
        )
        .expect("Could not create withdrawal");

        let items = list_transactions(&TransactionListQuery::default(), &connection)
            .expect("Could not list transactions");

        // Newest first.
        assert_eq!(items.len(), 4);
        assert_eq!(items[0].display_amount_idr, 250_000);
        assert_eq!(items[0].display_account, "From: Emergency Fund");
        assert_eq!(items[1].display_amount_idr, 1_000_000);
        assert_eq!(items[1].display_account, "To: Emergency Fund");
        assert_eq!(items[2].display_amount_idr, 200_000);
        assert_eq!(items[2].display_account, "Bank → Cash");
        assert_eq!(items[3].display_amount_idr, 50_000);
        assert_eq!(items[3].display_account, "Cash");
    }

    #[test]
    fn list_falls_back_to_unknown_wallet_when_archived() {
        let connection = get_test_connection();
        let wallet_id = create_test_wallet("Cash", &connection);
        let category_id = create_test_category("Food", CategoryKind::Expense, &connection);

        create_expense(
            expense_on(datetime!(2025-03-01 12:00 UTC), wallet_id, category_id, 50_000),
            &connection,
        )
        .expect("Could not create expense");
        archive_wallet(wallet_id, &connection);

        let items = list_transactions(&TransactionListQuery::default(), &connection)
            .expect("Could not list transactions");

        assert_eq!(items[0].display_account, "Unknown Wallet");
        assert_eq!(items[0].display_amount_idr, 50_000);
    }

    #[test]
    fn list_rejects_out_of_range_page_sizes() {
        let connection = get_test_connection();

        for limit in [0, 101] {
            let result = list_transactions(
                &TransactionListQuery {
                    limit: Some(limit),
                    ..Default::default()
                },
                &connection,
            );

            assert!(
                matches!(result, Err(Error::Validation { field: "limit", .. })),
                "limit {limit} should be rejected"
            );
        }
    }

    #[test]
    fn list_paginates_with_default_page_size() {
        let connection = get_test_connection();
        let wallet_id = create_test_wallet("Cash", &connection);
        let category_id = create_test_category("Food", CategoryKind::Expense, &connection);

        for _ in 0..60 {
            create_expense(
                expense_on(datetime!(2025-03-01 12:00 UTC), wallet_id, category_id, 10_000),
                &connection,
            )
            .expect("Could not create expense");
        }

        let first_page = list_transactions(&TransactionListQuery::default(), &connection)
            .expect("Could not list transactions");
        assert_eq!(first_page.len(), 50);

        let second_page = list_transactions(
            &TransactionListQuery {
                offset: 50,
                ..Default::default()
            },
            &connection,
        )
        .expect("Could not list transactions");
        assert_eq!(second_page.len(), 10);

        let total = count_transactions(&TransactionListQuery::default(), &connection)
            .expect("Could not count transactions");
        assert_eq!(total, 60);
    }

    #[test]
    fn count_respects_filters() {
        let connection = get_test_connection();
        let wallet_id = create_test_wallet("Cash", &connection);
        let category_id = create_test_category("Food", CategoryKind::Expense, &connection);

        create_expense(
            expense_on(datetime!(2025-03-01 12:00 UTC), wallet_id, category_id, 10_000),
            &connection,
        )
        .expect("Could not create expense");
        create_income(
            NewIncome {
                occurred_at: datetime!(2025-03-25 09:00 UTC),
                wallet_id,
                category_id: None,
                amount_idr: 8_000_000,
                note: None,
                payee: None,
                idempotency_key: None,
            },
            &connection,
        )
        .expect("Could not create income");

        let count = count_transactions(
            &TransactionListQuery {
                kind: Some(TransactionKind::Income),
                ..Default::default()
            },
            &connection,
        )
        .expect("Could not count transactions");

        assert_eq!(count, 1);
    }
}
