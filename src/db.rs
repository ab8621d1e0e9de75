/*! Database initialization for the ledger and its collaborator tables. */

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{Error, ledger::models::create_ledger_tables, reference::create_reference_tables};

/// Create every table and index the ledger needs.
///
/// Foreign key enforcement is enabled first; SQLite leaves it off per
/// connection by default. The table creation runs inside one exclusive
/// transaction so a half-initialized schema is never visible.
///
/// # Errors
/// Returns an [Error::SqlError] if a table cannot be created or if there is
/// some other SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", true)?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_reference_tables(&transaction)?;
    create_ledger_tables(&transaction)?;

    transaction.commit()?;

    Ok(())
}
