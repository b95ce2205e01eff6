//! Core storage and domain logic for the tally event tracker.
//! Owns the event/record invariants for both local and remote backends.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod remote;
pub mod service;

pub use config::{ConfigError, LogSettings, TrackerConfig};
pub use db::{open_store, open_store_in_memory, Store, StoreError, StoreResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::event::{Event, EventDetail, EventId, EventWithCurrentRecord, Record, RecordId};
pub use model::input::{
    CompleteEventInput, CompleteRecordInput, CreateEventInput, CreateRecordInput, InputError,
};
pub use remote::{
    NoSession, OfflineRemote, RemoteError, RemoteErrorKind, RemoteEventApi, RemoteResult,
    SessionProvider, UserId,
};
pub use service::dispatcher::{Backend, FallbackDispatcher};
pub use service::event_store::LocalEventStore;
pub use service::{TrackerError, TrackerResult};

/// Opens the local store described by `config`.
///
/// Uses an in-memory store when no `store_path` is configured.
pub fn open_local_store(config: &TrackerConfig) -> StoreResult<LocalEventStore> {
    let store = match config.store_path.as_ref() {
        Some(path) => open_store(path)?,
        None => open_store_in_memory()?,
    };
    Ok(LocalEventStore::new(store))
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
