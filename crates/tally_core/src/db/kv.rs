//! Collection-scoped key-value transactions over SQLite.
//!
//! # Responsibility
//! - Map the `events` and `records` collections onto document tables.
//! - Run caller bodies inside one SQLite transaction with explicit scope/mode.
//!
//! # Invariants
//! - Documents are stored as JSON keyed by `Document::key()`.
//! - A body returning `Err` or calling `abort()` leaves no writes behind.
//! - Access outside the declared collections is rejected, never widened.

use super::{StoreError, StoreResult};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Named collection inside the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Events,
    Records,
}

impl Collection {
    /// Stable collection name, also used as the backing table name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Events => "events",
            Self::Records => "records",
        }
    }
}

/// Access mode requested for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxMode {
    ReadOnly,
    ReadWrite,
}

/// A value that can be persisted in a collection under its own key.
pub trait Document: Serialize + DeserializeOwned {
    fn key(&self) -> &str;
}

/// Owned handle to an opened local store.
///
/// The handle is created by `open_store`/`open_store_in_memory` and passed to
/// whoever needs it; there is no process-wide instance.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub(super) fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Runs `body` inside one transaction scoped to `collections`.
    ///
    /// # Contract
    /// - `Ok` from `body` commits every write made through the handle.
    /// - `Err` from `body` rolls back and returns that error unchanged.
    /// - `Transaction::abort` rolls back and yields
    ///   `StoreError::TransactionAborted`, even when `body` returned `Ok`.
    /// - `ReadWrite` transactions take the write lock up front.
    pub fn run_transaction<T, E, F>(
        &mut self,
        collections: &[Collection],
        mode: TxMode,
        body: F,
    ) -> Result<T, E>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<T, E>,
        E: From<StoreError>,
    {
        let behavior = match mode {
            TxMode::ReadOnly => TransactionBehavior::Deferred,
            TxMode::ReadWrite => TransactionBehavior::Immediate,
        };
        let tx = self
            .conn
            .transaction_with_behavior(behavior)
            .map_err(StoreError::from)?;

        let mut handle = Transaction {
            tx,
            scope: collections.to_vec(),
            mode,
            aborted: None,
        };

        // Dropping `handle` on the error path rolls the SQLite transaction back.
        let output = body(&mut handle)?;
        handle.finish()?;
        Ok(output)
    }
}

/// Collection-scoped view of an in-flight transaction.
pub struct Transaction<'conn> {
    tx: rusqlite::Transaction<'conn>,
    scope: Vec<Collection>,
    mode: TxMode,
    aborted: Option<String>,
}

impl Transaction<'_> {
    /// Reads one document by key.
    pub fn get<D: Document>(&self, collection: Collection, id: &str) -> StoreResult<Option<D>> {
        self.ensure_readable(collection)?;

        let value: Option<String> = self
            .tx
            .query_row(
                &format!("SELECT value FROM {} WHERE id = ?1;", collection.name()),
                [id],
                |row| row.get(0),
            )
            .optional()?;

        value.map(|text| decode(collection, &text)).transpose()
    }

    /// Reads every document in the collection. Order is unspecified.
    pub fn get_all<D: Document>(&self, collection: Collection) -> StoreResult<Vec<D>> {
        self.ensure_readable(collection)?;

        let mut stmt = self
            .tx
            .prepare(&format!("SELECT value FROM {};", collection.name()))?;
        let mut rows = stmt.query([])?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next()? {
            let text: String = row.get(0)?;
            documents.push(decode(collection, &text)?);
        }

        Ok(documents)
    }

    /// Inserts the document or overwrites the one stored under the same key.
    pub fn put<D: Document>(&mut self, collection: Collection, document: &D) -> StoreResult<()> {
        self.ensure_writable(collection)?;

        let value = serde_json::to_string(document)?;
        self.tx.execute(
            &format!(
                "INSERT INTO {} (id, value) VALUES (?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET value = excluded.value;",
                collection.name()
            ),
            params![document.key(), value],
        )?;

        Ok(())
    }

    /// Deletes the document stored under `id`. Missing keys are a no-op.
    pub fn delete(&mut self, collection: Collection, id: &str) -> StoreResult<()> {
        self.ensure_writable(collection)?;

        self.tx.execute(
            &format!("DELETE FROM {} WHERE id = ?1;", collection.name()),
            [id],
        )?;

        Ok(())
    }

    /// Marks the transaction for rollback. Later calls on this handle fail.
    pub fn abort(&mut self, reason: impl Into<String>) {
        if self.aborted.is_none() {
            self.aborted = Some(reason.into());
        }
    }

    fn finish(self) -> StoreResult<()> {
        if let Some(reason) = self.aborted {
            debug!("event=tx_abort module=db status=rolled_back reason={reason}");
            self.tx.rollback()?;
            return Err(StoreError::TransactionAborted(reason));
        }

        self.tx
            .commit()
            .map_err(|err| StoreError::TransactionAborted(err.to_string()))
    }

    fn ensure_readable(&self, collection: Collection) -> StoreResult<()> {
        if let Some(reason) = self.aborted.as_ref() {
            return Err(StoreError::TransactionAborted(reason.clone()));
        }
        if !self.scope.contains(&collection) {
            return Err(StoreError::CollectionNotInScope(collection));
        }
        Ok(())
    }

    fn ensure_writable(&self, collection: Collection) -> StoreResult<()> {
        self.ensure_readable(collection)?;
        if self.mode == TxMode::ReadOnly {
            return Err(StoreError::ReadOnlyTransaction(collection));
        }
        Ok(())
    }
}

fn decode<D: DeserializeOwned>(collection: Collection, text: &str) -> StoreResult<D> {
    serde_json::from_str(text).map_err(|err| {
        StoreError::InvalidData(format!("{} document: {err}", collection.name()))
    })
}

#[cfg(test)]
mod tests {
    use super::{Collection, Document, TxMode};
    use crate::db::{open_store_in_memory, StoreError};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: String,
        body: String,
    }

    impl Document for Note {
        fn key(&self) -> &str {
            &self.id
        }
    }

    fn note(id: &str, body: &str) -> Note {
        Note {
            id: id.to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn put_then_get_returns_stored_document() {
        let mut store = open_store_in_memory().expect("store should open");
        store
            .run_transaction(&[Collection::Events], TxMode::ReadWrite, |tx| {
                tx.put(Collection::Events, &note("a", "first"))
            })
            .expect("put should commit");

        let loaded: Option<Note> = store
            .run_transaction(&[Collection::Events], TxMode::ReadOnly, |tx| {
                tx.get(Collection::Events, "a")
            })
            .expect("get should succeed");
        assert_eq!(loaded, Some(note("a", "first")));
    }

    #[test]
    fn put_overwrites_existing_key() {
        let mut store = open_store_in_memory().expect("store should open");
        store
            .run_transaction(&[Collection::Records], TxMode::ReadWrite, |tx| {
                tx.put(Collection::Records, &note("a", "first"))?;
                tx.put(Collection::Records, &note("a", "second"))
            })
            .expect("puts should commit");

        let all: Vec<Note> = store
            .run_transaction(&[Collection::Records], TxMode::ReadOnly, |tx| {
                tx.get_all(Collection::Records)
            })
            .expect("get_all should succeed");
        assert_eq!(all, vec![note("a", "second")]);
    }

    #[test]
    fn collections_are_isolated() {
        let mut store = open_store_in_memory().expect("store should open");
        store
            .run_transaction(
                &[Collection::Events, Collection::Records],
                TxMode::ReadWrite,
                |tx| tx.put(Collection::Events, &note("shared", "event")),
            )
            .expect("put should commit");

        let record: Option<Note> = store
            .run_transaction(&[Collection::Records], TxMode::ReadOnly, |tx| {
                tx.get(Collection::Records, "shared")
            })
            .expect("get should succeed");
        assert!(record.is_none());
    }

    #[test]
    fn explicit_abort_discards_writes() {
        let mut store = open_store_in_memory().expect("store should open");
        let err = store
            .run_transaction(&[Collection::Events], TxMode::ReadWrite, |tx| {
                tx.put(Collection::Events, &note("a", "first"))?;
                tx.abort("caller changed its mind");
                Ok::<_, StoreError>(())
            })
            .expect_err("aborted transaction should fail");
        assert!(matches!(err, StoreError::TransactionAborted(_)));

        let all: Vec<Note> = store
            .run_transaction(&[Collection::Events], TxMode::ReadOnly, |tx| {
                tx.get_all(Collection::Events)
            })
            .expect("get_all should succeed");
        assert!(all.is_empty());
    }

    #[test]
    fn failing_body_rolls_back_writes() {
        let mut store = open_store_in_memory().expect("store should open");
        let err = store
            .run_transaction(
                &[Collection::Events, Collection::Records],
                TxMode::ReadWrite,
                |tx| {
                    tx.put(Collection::Events, &note("a", "first"))?;
                    tx.put(Collection::Records, &note("b", "second"))?;
                    Err::<(), _>(StoreError::InvalidData("body failed".to_string()))
                },
            )
            .expect_err("failing body should surface its error");
        assert!(matches!(err, StoreError::InvalidData(reason) if reason == "body failed"));

        let (events, records): (Vec<Note>, Vec<Note>) = store
            .run_transaction(
                &[Collection::Events, Collection::Records],
                TxMode::ReadOnly,
                |tx| {
                    let events = tx.get_all(Collection::Events)?;
                    let records = tx.get_all(Collection::Records)?;
                    Ok::<_, StoreError>((events, records))
                },
            )
            .expect("get_all should succeed");
        assert!(events.is_empty());
        assert!(records.is_empty());
    }

    #[test]
    fn operations_after_abort_fail() {
        let mut store = open_store_in_memory().expect("store should open");
        let err = store
            .run_transaction(&[Collection::Events], TxMode::ReadWrite, |tx| {
                tx.abort("stop");
                tx.put(Collection::Events, &note("a", "first"))
            })
            .expect_err("put after abort should fail");
        assert!(matches!(err, StoreError::TransactionAborted(reason) if reason == "stop"));
    }

    #[test]
    fn read_only_transaction_rejects_writes() {
        let mut store = open_store_in_memory().expect("store should open");
        let err = store
            .run_transaction(&[Collection::Events], TxMode::ReadOnly, |tx| {
                tx.delete(Collection::Events, "a")
            })
            .expect_err("write in read-only transaction should fail");
        assert!(matches!(
            err,
            StoreError::ReadOnlyTransaction(Collection::Events)
        ));
    }

    #[test]
    fn out_of_scope_collection_is_rejected() {
        let mut store = open_store_in_memory().expect("store should open");
        let err = store
            .run_transaction(&[Collection::Events], TxMode::ReadWrite, |tx| {
                tx.get::<Note>(Collection::Records, "a")
            })
            .expect_err("out-of-scope read should fail");
        assert!(matches!(
            err,
            StoreError::CollectionNotInScope(Collection::Records)
        ));
    }

    #[test]
    fn delete_of_missing_key_is_noop() {
        let mut store = open_store_in_memory().expect("store should open");
        store
            .run_transaction(&[Collection::Records], TxMode::ReadWrite, |tx| {
                tx.delete(Collection::Records, "missing")
            })
            .expect("delete of missing key should succeed");
    }
}
