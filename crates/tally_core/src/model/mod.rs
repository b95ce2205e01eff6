//! Event/record domain model and operation inputs.
//!
//! # Responsibility
//! - Define the documents persisted in the `events` and `records` collections.
//! - Define the read models and inputs shared by local and remote backends.
//!
//! # Invariants
//! - Events are the aggregate root; records belong to exactly one event.
//! - Deleting an event removes its records (hard delete, no tombstones).

pub mod event;
pub mod input;
