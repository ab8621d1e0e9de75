//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;

/// The ID of a ledger event row.
pub type EventId = DatabaseId;
/// The ID of a posting row.
pub type PostingId = DatabaseId;
/// The ID of a wallet row.
pub type WalletId = DatabaseId;
/// The ID of a category row.
pub type CategoryId = DatabaseId;
/// The ID of a savings bucket row.
pub type SavingsBucketId = DatabaseId;
