//! Shared fixtures for ledger tests.

use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    database_id::{CategoryId, SavingsBucketId, WalletId},
    db::initialize,
    reference::CategoryKind,
};

/// Open a fresh in-memory database with the full schema.
pub(crate) fn get_test_connection() -> Connection {
    let connection = Connection::open_in_memory().expect("Could not open in-memory database");
    initialize(&connection).expect("Could not initialize database");
    connection
}

/// Install a logging subscriber for tests that want tracing output.
///
/// Safe to call from multiple tests; only the first call installs.
pub(crate) fn init_test_logging() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Insert a wallet row. Wallet lifecycle lives outside the ledger, so tests
/// write the collaborator table directly.
pub(crate) fn create_test_wallet(name: &str, connection: &Connection) -> WalletId {
    connection
        .execute("INSERT INTO wallet (name) VALUES (?1)", (name,))
        .expect("Could not create test wallet");
    connection.last_insert_rowid()
}

/// Mark a wallet archived.
pub(crate) fn archive_wallet(id: WalletId, connection: &Connection) {
    connection
        .execute(
            "UPDATE wallet SET archived_at = ?1 WHERE id = ?2",
            (OffsetDateTime::now_utc(), id),
        )
        .expect("Could not archive test wallet");
}

/// Insert a category row of the given kind.
pub(crate) fn create_test_category(
    name: &str,
    kind: CategoryKind,
    connection: &Connection,
) -> CategoryId {
    connection
        .execute(
            "INSERT INTO category (name, kind) VALUES (?1, ?2)",
            (name, kind.as_str()),
        )
        .expect("Could not create test category");
    connection.last_insert_rowid()
}

/// Insert a savings bucket row.
pub(crate) fn create_test_bucket(name: &str, connection: &Connection) -> SavingsBucketId {
    connection
        .execute("INSERT INTO savings_bucket (name) VALUES (?1)", (name,))
        .expect("Could not create test bucket");
    connection.last_insert_rowid()
}

/// Mark a savings bucket archived.
pub(crate) fn archive_bucket(id: SavingsBucketId, connection: &Connection) {
    connection
        .execute(
            "UPDATE savings_bucket SET archived_at = ?1 WHERE id = ?2",
            (OffsetDateTime::now_utc(), id),
        )
        .expect("Could not archive test bucket");
}
