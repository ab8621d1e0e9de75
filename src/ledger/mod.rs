//! The transaction ledger for the personal-finance tracker.
//!
//! This module contains everything related to ledger events:
//! - The `TransactionEvent` and `Posting` models and their tables
//! - Command handlers for creating and updating each transaction kind
//! - Soft delete, restore, and permanent removal
//! - The filtered transaction listing and single-event lookup
//! - Per-kind aggregate statistics

mod create;
mod delete;
pub(crate) mod models;
mod query;
mod stats;
mod update;

pub use create::{
    MINIMUM_AMOUNT_IDR, NewExpense, NewIncome, NewSavingsContribution, NewSavingsWithdrawal,
    NewTransfer, create_expense, create_income, create_savings_contribution,
    create_savings_withdrawal, create_transfer,
};
pub use delete::{
    BULK_DELETE_MAX_IDS, BulkDeleteOutcome, bulk_delete, purge_transaction, restore_transaction,
};
pub use models::{
    IDEMPOTENCY_KEY_MAX_LENGTH, Posting, PostingTarget, TransactionEvent, TransactionKind,
    TransactionWithPostings,
};
pub use query::{
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, TransactionListItem, TransactionListQuery,
    count_transactions, get_transaction, list_transactions,
};
pub use stats::{TransactionStats, transaction_stats};
pub use update::{
    UpdateExpense, UpdateIncome, UpdateSavingsMovement, UpdateTransfer, update_expense,
    update_income, update_savings_contribution, update_savings_withdrawal, update_transfer,
};
