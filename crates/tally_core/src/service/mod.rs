//! Tracker use-case services.
//!
//! # Responsibility
//! - Implement the event/record operations over the local store.
//! - Route each operation between the remote backend and the local store.
//!
//! # Invariants
//! - Inputs are validated before any storage access.
//! - Each local operation runs inside exactly one store transaction.

use crate::db::StoreError;
use crate::model::input::InputError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod dispatcher;
pub mod event_store;

pub type TrackerResult<T> = Result<T, TrackerError>;

/// Failure returned by tracker operations.
#[derive(Debug)]
pub enum TrackerError {
    InvalidInput(InputError),
    NotFound(String),
    /// The operation would open a second active record, or none is active.
    Conflict(String),
    Store(StoreError),
}

impl TrackerError {
    pub(crate) fn event_not_found(id: &str) -> Self {
        Self::NotFound(format!("event not found: {id}"))
    }

    pub(crate) fn record_not_found(id: &str) -> Self {
        Self::NotFound(format!("record not found: {id}"))
    }
}

impl Display for TrackerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(err) => write!(f, "invalid input: {err}"),
            Self::NotFound(message) => write!(f, "{message}"),
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TrackerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidInput(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::NotFound(_) | Self::Conflict(_) => None,
        }
    }
}

impl From<InputError> for TrackerError {
    fn from(value: InputError) -> Self {
        Self::InvalidInput(value)
    }
}

impl From<StoreError> for TrackerError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}
