//! Aggregate statistics over the ledger.

use rusqlite::{Connection, params_from_iter, types::Value};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    ledger::{models::TransactionKind, query::timestamp_value},
};

/// Counts and absolute-value sums per transaction kind over a date window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionStats {
    /// Sum of income magnitudes.
    pub total_income: i64,
    /// Sum of expense magnitudes.
    pub total_expense: i64,
    /// Sum of transfer magnitudes.
    pub total_transfers: i64,
    /// Sum of savings contribution magnitudes.
    pub total_savings_contributions: i64,
    /// Sum of savings withdrawal magnitudes.
    pub total_savings_withdrawals: i64,
    /// How many non-deleted transactions the window holds.
    pub transaction_count: u64,
}

/// Compute per-kind totals and counts for non-deleted transactions.
///
/// Absent bounds mean unbounded; a window with no events returns zeros for
/// every field. Each event contributes the magnitude of exactly one leg (both
/// legs of a two-posting event share one magnitude), so transfers and
/// savings movements are not double-counted.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn transaction_stats(
    from: Option<OffsetDateTime>,
    to: Option<OffsetDateTime>,
    connection: &Connection,
) -> Result<TransactionStats, Error> {
    let mut clauses = vec!["e.deleted_at IS NULL".to_owned()];
    let mut params: Vec<Value> = Vec::new();

    if let Some(from) = from {
        params.push(timestamp_value(from)?);
        clauses.push(format!("e.occurred_at >= ?{}", params.len()));
    }
    if let Some(to) = to {
        params.push(timestamp_value(to)?);
        clauses.push(format!("e.occurred_at <= ?{}", params.len()));
    }

    let sql = format!(
        "SELECT kind, COUNT(*), COALESCE(SUM(magnitude), 0)
         FROM (SELECT e.id, e.kind AS kind, MAX(ABS(p.amount_idr)) AS magnitude
               FROM transaction_event e
               INNER JOIN posting p ON p.event_id = e.id
               WHERE {}
               GROUP BY e.id)
         GROUP BY kind",
        clauses.join(" AND ")
    );

    let mut statement = connection.prepare(&sql)?;
    let rows = statement
        .query_map(params_from_iter(params.iter()), |row| {
            let kind_text: String = row.get(0)?;
            let kind = TransactionKind::from_column(&kind_text, 0)?;
            Ok((kind, row.get::<_, i64>(1)? as u64, row.get::<_, i64>(2)?))
        })?;

    let mut stats = TransactionStats::default();
    for row in rows {
        let (kind, count, total) = row?;
        stats.transaction_count += count;
        match kind {
            TransactionKind::Income => stats.total_income = total,
            TransactionKind::Expense => stats.total_expense = total,
            TransactionKind::Transfer => stats.total_transfers = total,
            TransactionKind::SavingsContribution => stats.total_savings_contributions = total,
            TransactionKind::SavingsWithdrawal => stats.total_savings_withdrawals = total,
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod stats_tests {
    use time::macros::datetime;

    use crate::{
        ledger::{
            create::{
                NewExpense, NewIncome, NewSavingsContribution, NewTransfer, create_expense,
                create_income, create_savings_contribution, create_transfer,
            },
            delete::bulk_delete,
            stats::{TransactionStats, transaction_stats},
        },
        reference::CategoryKind,
        test_utils::{
            create_test_bucket, create_test_category, create_test_wallet, get_test_connection,
        },
    };

    #[test]
    fn stats_sum_income_and_expense_over_a_window() {
        let connection = get_test_connection();
        let wallet_id = create_test_wallet("Bank", &connection);
        let category_id = create_test_category("Food", CategoryKind::Expense, &connection);

        create_income(
            NewIncome {
                occurred_at: datetime!(2025-03-25 09:00 UTC),
                wallet_id,
                category_id: None,
                amount_idr: 500_000,
                note: None,
                payee: None,
                idempotency_key: None,
            },
            &connection,
        )
        .expect("Could not create income");
        create_expense(
            NewExpense {
                occurred_at: datetime!(2025-03-25 18:00 UTC),
                wallet_id,
                category_id,
                amount_idr: 100_000,
                note: None,
                payee: None,
                idempotency_key: None,
            },
            &connection,
        )
        .expect("Could not create expense");

        let stats = transaction_stats(
            Some(datetime!(2025-03-24 00:00 UTC)),
            Some(datetime!(2025-03-26 00:00 UTC)),
            &connection,
        )
        .expect("Could not compute stats");

        assert_eq!(stats.total_income, 500_000);
        assert_eq!(stats.total_expense, 100_000);
        assert_eq!(stats.transaction_count, 2);
    }

    #[test]
    fn stats_count_one_leg_per_transfer() {
        let connection = get_test_connection();
        let from_wallet_id = create_test_wallet("Bank", &connection);
        let to_wallet_id = create_test_wallet("Cash", &connection);

        create_transfer(
            NewTransfer {
                occurred_at: datetime!(2025-03-02 08:30 UTC),
                from_wallet_id,
                to_wallet_id,
                amount_idr: 200_000,
                note: None,
                idempotency_key: None,
            },
            &connection,
        )
        .expect("Could not create transfer");

        let stats = transaction_stats(None, None, &connection).expect("Could not compute stats");

        // Summing both legs would report 400,000.
        assert_eq!(stats.total_transfers, 200_000);
        assert_eq!(stats.transaction_count, 1);
    }

    #[test]
    fn stats_ignore_deleted_transactions() {
        let connection = get_test_connection();
        let wallet_id = create_test_wallet("Bank", &connection);
        let bucket_id = create_test_bucket("Emergency Fund", &connection);

        let transaction = create_savings_contribution(
            NewSavingsContribution {
                occurred_at: datetime!(2025-03-05 19:00 UTC),
                wallet_id,
                savings_bucket_id: bucket_id,
                amount_idr: 1_000_000,
                note: None,
                idempotency_key: None,
            },
            &connection,
        )
        .expect("Could not create contribution");

        bulk_delete(&[transaction.event.id], &connection).expect("Could not delete");

        let stats = transaction_stats(None, None, &connection).expect("Could not compute stats");

        assert_eq!(stats, TransactionStats::default());
    }

    #[test]
    fn stats_return_zeros_for_an_empty_window() {
        let connection = get_test_connection();

        let stats = transaction_stats(
            Some(datetime!(2030-01-01 00:00 UTC)),
            Some(datetime!(2030-12-31 00:00 UTC)),
            &connection,
        )
        .expect("Could not compute stats");

        assert_eq!(stats, TransactionStats::default());
    }
}
