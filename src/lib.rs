//! Saku is the double-entry transaction ledger engine behind a
//! personal-finance tracker.
//!
//! Financial events (spending, income, transfers, savings movements) are
//! recorded as balanced sets of signed postings against wallets and savings
//! buckets. The engine guarantees idempotent and atomic writes, enforces
//! referential and kind invariants, supports soft delete and restore with
//! best-effort bulk semantics, and computes per-kind aggregate statistics.
//!
//! The crate is invoked as a library: callers pass a
//! [`rusqlite::Connection`] into every operation, so there is no shared
//! in-process state and tests can run against isolated in-memory databases.
//! Wallet, category, and savings bucket lifecycle management, HTTP routing,
//! and rendering all live outside this crate.

#![warn(missing_docs)]

mod database_id;
mod db;
mod error;
mod ledger;
mod reference;
#[cfg(test)]
mod test_utils;

pub use database_id::{
    CategoryId, DatabaseId, EventId, PostingId, SavingsBucketId, WalletId,
};
pub use db::initialize;
pub use error::Error;
pub use ledger::{
    BULK_DELETE_MAX_IDS, BulkDeleteOutcome, DEFAULT_PAGE_SIZE, IDEMPOTENCY_KEY_MAX_LENGTH,
    MAX_PAGE_SIZE, MINIMUM_AMOUNT_IDR, NewExpense, NewIncome, NewSavingsContribution,
    NewSavingsWithdrawal, NewTransfer, Posting, PostingTarget, TransactionEvent, TransactionKind,
    TransactionListItem, TransactionListQuery, TransactionStats, TransactionWithPostings,
    UpdateExpense, UpdateIncome, UpdateSavingsMovement, UpdateTransfer, bulk_delete,
    count_transactions, create_expense, create_income, create_savings_contribution,
    create_savings_withdrawal, create_transfer, get_transaction, list_transactions,
    purge_transaction, restore_transaction, transaction_stats, update_expense, update_income,
    update_savings_contribution, update_savings_withdrawal, update_transfer,
};
pub use reference::{
    CategoryKind, CategoryRef, SavingsBucketRef, WalletRef, get_category, get_savings_bucket,
    get_wallet, require_active_bucket, require_active_wallet, require_category,
};
