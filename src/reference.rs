//! Read-only lookups against the wallet, category, and savings bucket
//! collaborators.
//!
//! Wallet, category, and savings bucket lifecycle management lives outside
//! the ledger; this module only reads the columns the ledger needs to
//! validate references before a write begins.

use std::fmt;

use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    database_id::{CategoryId, SavingsBucketId, WalletId},
};

/// Whether a category records money spent or money earned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    /// The category is used for expense transactions.
    Expense,
    /// The category is used for income transactions.
    Income,
}

impl CategoryKind {
    /// The column value the kind is stored as.
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Expense => "expense",
            CategoryKind::Income => "income",
        }
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A wallet as the ledger sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct WalletRef {
    /// The ID of the wallet.
    pub id: WalletId,
    /// The display name of the wallet.
    pub name: String,
    /// Whether the wallet has been archived.
    pub archived: bool,
}

/// A category as the ledger sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRef {
    /// The ID of the category.
    pub id: CategoryId,
    /// The display name of the category.
    pub name: String,
    /// The kind of transactions the category is declared for.
    pub kind: CategoryKind,
}

/// A savings bucket as the ledger sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct SavingsBucketRef {
    /// The ID of the bucket.
    pub id: SavingsBucketId,
    /// The display name of the bucket.
    pub name: String,
    /// Whether the bucket has been archived.
    pub archived: bool,
}

/// Retrieve a wallet by its `id`.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_wallet(id: WalletId, connection: &Connection) -> Result<Option<WalletRef>, Error> {
    connection
        .prepare("SELECT id, name, archived_at IS NOT NULL FROM wallet WHERE id = :id")?
        .query_row(&[(":id", &id)], map_wallet_row)
        .optional()
        .map_err(|error| error.into())
}

/// Retrieve a category by its `id`.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_category(
    id: CategoryId,
    connection: &Connection,
) -> Result<Option<CategoryRef>, Error> {
    connection
        .prepare("SELECT id, name, kind FROM category WHERE id = :id")?
        .query_row(&[(":id", &id)], map_category_row)
        .optional()
        .map_err(|error| error.into())
}

/// Retrieve a savings bucket by its `id`.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_savings_bucket(
    id: SavingsBucketId,
    connection: &Connection,
) -> Result<Option<SavingsBucketRef>, Error> {
    connection
        .prepare("SELECT id, name, archived_at IS NOT NULL FROM savings_bucket WHERE id = :id")?
        .query_row(&[(":id", &id)], map_bucket_row)
        .optional()
        .map_err(|error| error.into())
}

/// Confirm the wallet `id` exists and is not archived.
///
/// # Errors
/// Returns an [Error::WalletNotFound] if the wallet is missing or archived,
/// or an [Error::SqlError] if there is an SQL error.
pub fn require_active_wallet(id: WalletId, connection: &Connection) -> Result<(), Error> {
    match get_wallet(id, connection)? {
        Some(wallet) if !wallet.archived => Ok(()),
        _ => Err(Error::WalletNotFound(id)),
    }
}

/// Confirm the category `id` exists and is declared for `kind` transactions.
///
/// A category of the wrong kind is reported the same way as a missing one,
/// since recording a transaction against it would break the category-kind
/// invariant either way.
///
/// # Errors
/// Returns an [Error::Validation] on the `category_id` field if the category
/// is missing or of the wrong kind, or an [Error::SqlError] if there is an
/// SQL error.
pub fn require_category(
    id: CategoryId,
    kind: CategoryKind,
    connection: &Connection,
) -> Result<(), Error> {
    match get_category(id, connection)? {
        Some(category) if category.kind == kind => Ok(()),
        _ => Err(Error::validation(
            "category_id",
            format!("category {id} does not exist or is not an {kind} category"),
        )),
    }
}

/// Confirm the savings bucket `id` exists and is not archived.
///
/// Archival is only enforced here, on the write path; historical postings
/// against an archived bucket stay readable.
///
/// # Errors
/// Returns an [Error::BucketNotFound] if the bucket is missing or archived,
/// or an [Error::SqlError] if there is an SQL error.
pub fn require_active_bucket(id: SavingsBucketId, connection: &Connection) -> Result<(), Error> {
    match get_savings_bucket(id, connection)? {
        Some(bucket) if !bucket.archived => Ok(()),
        _ => Err(Error::BucketNotFound(id)),
    }
}

/// Create the collaborator tables the ledger references.
///
/// # Errors
/// Returns an error if the tables cannot be created or if there is an SQL
/// error.
pub(crate) fn create_reference_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS wallet (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            archived_at TEXT
        );

        CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            kind TEXT NOT NULL CHECK(kind IN ('expense', 'income'))
        );

        CREATE TABLE IF NOT EXISTS savings_bucket (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            archived_at TEXT
        );",
    )?;

    Ok(())
}

fn map_wallet_row(row: &Row) -> Result<WalletRef, rusqlite::Error> {
    Ok(WalletRef {
        id: row.get(0)?,
        name: row.get(1)?,
        archived: row.get(2)?,
    })
}

fn map_category_row(row: &Row) -> Result<CategoryRef, rusqlite::Error> {
    let kind_text: String = row.get(2)?;

    let kind = match kind_text.as_str() {
        "expense" => CategoryKind::Expense,
        "income" => CategoryKind::Income,
        other => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                format!("unknown category kind \"{other}\"").into(),
            ));
        }
    };

    Ok(CategoryRef {
        id: row.get(0)?,
        name: row.get(1)?,
        kind,
    })
}

fn map_bucket_row(row: &Row) -> Result<SavingsBucketRef, rusqlite::Error> {
    Ok(SavingsBucketRef {
        id: row.get(0)?,
        name: row.get(1)?,
        archived: row.get(2)?,
    })
}
