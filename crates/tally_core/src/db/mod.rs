//! Embedded key-value storage for tracker documents.
//!
//! # Responsibility
//! - Open and configure the SQLite file backing the local store.
//! - Apply schema migrations in deterministic order.
//! - Expose the `events` and `records` collections through atomic,
//!   collection-scoped transactions.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - No collection is read or written before migrations succeed.
//! - A transaction either commits every write made in its body or none.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod kv;
pub mod migrations;
mod open;

pub use kv::{Collection, Document, Store, Transaction, TxMode};
pub use open::{open_store, open_store_in_memory};

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure raised by the storage backend.
#[derive(Debug)]
pub enum StoreError {
    /// The backing file could not be opened or created.
    Unavailable(String),
    /// The transaction was aborted or failed to commit; no writes are visible.
    TransactionAborted(String),
    /// Underlying SQLite read/write failure.
    Io(rusqlite::Error),
    /// A stored document could not be encoded or decoded.
    InvalidData(String),
    CollectionNotInScope(Collection),
    ReadOnlyTransaction(Collection),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "local store unavailable: {message}"),
            Self::TransactionAborted(message) => write!(f, "transaction aborted: {message}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid stored document: {message}"),
            Self::CollectionNotInScope(collection) => write!(
                f,
                "collection `{}` is not in transaction scope",
                collection.name()
            ),
            Self::ReadOnlyTransaction(collection) => write!(
                f,
                "cannot write `{}` in a read-only transaction",
                collection.name()
            ),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "store schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidData(value.to_string())
    }
}
