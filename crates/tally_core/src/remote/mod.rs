//! Remote backend contracts.
//!
//! # Responsibility
//! - Define the session lookup and remote event API consumed by the dispatcher.
//! - Map remote rows onto the shared domain shapes.
//!
//! # Invariants
//! - Remote data is always scoped to the owning user passed to each call.
//! - Remote failures are values (`RemoteError`), never panics.

use crate::model::event::{EventDetail, EventWithCurrentRecord};
use crate::model::input::{
    CompleteEventInput, CompleteRecordInput, CreateEventInput, CreateRecordInput,
};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod rows;

/// Identifier of the authenticated remote user.
pub type UserId = String;

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Coarse classification used for routing and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    Unauthenticated,
    Unreachable,
    Rejected,
}

impl RemoteErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Unreachable => "unreachable",
            Self::Rejected => "rejected",
        }
    }
}

/// Failure reported by the remote backend or the session source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// No active session, or the session was refused.
    Unauthenticated,
    /// Transport-level failure talking to the backend.
    Unreachable(String),
    /// The backend answered but refused or failed the request.
    Rejected(String),
}

impl RemoteError {
    pub fn kind(&self) -> RemoteErrorKind {
        match self {
            Self::Unauthenticated => RemoteErrorKind::Unauthenticated,
            Self::Unreachable(_) => RemoteErrorKind::Unreachable,
            Self::Rejected(_) => RemoteErrorKind::Rejected,
        }
    }
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "no active session"),
            Self::Unreachable(message) => write!(f, "remote backend unreachable: {message}"),
            Self::Rejected(message) => write!(f, "remote backend rejected request: {message}"),
        }
    }
}

impl Error for RemoteError {}

/// Source of the current authenticated session.
pub trait SessionProvider {
    /// Returns the signed-in user, or `None` when no session is active.
    fn current_user(&self) -> RemoteResult<Option<UserId>>;
}

/// Row-oriented remote backend holding the same events and records.
///
/// Implementations must scope every read and write to `user`.
pub trait RemoteEventApi {
    fn list_events(&self, user: &str) -> RemoteResult<Vec<EventWithCurrentRecord>>;
    fn get_event(&self, user: &str, event_id: &str) -> RemoteResult<EventDetail>;
    fn create_event(
        &self,
        user: &str,
        input: &CreateEventInput,
    ) -> RemoteResult<EventWithCurrentRecord>;
    fn complete_event(
        &self,
        user: &str,
        input: &CompleteEventInput,
    ) -> RemoteResult<EventWithCurrentRecord>;
    fn create_record(
        &self,
        user: &str,
        input: &CreateRecordInput,
    ) -> RemoteResult<EventWithCurrentRecord>;
    fn complete_record(
        &self,
        user: &str,
        input: &CompleteRecordInput,
    ) -> RemoteResult<EventWithCurrentRecord>;
    fn delete_event(&self, user: &str, event_id: &str) -> RemoteResult<()>;
}

/// Session source for builds without a remote backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSession;

impl SessionProvider for NoSession {
    fn current_user(&self) -> RemoteResult<Option<UserId>> {
        Ok(None)
    }
}

/// Remote API stand-in that is never reachable.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineRemote;

impl OfflineRemote {
    fn offline<T>() -> RemoteResult<T> {
        Err(RemoteError::Unreachable("no remote backend configured".to_string()))
    }
}

impl RemoteEventApi for OfflineRemote {
    fn list_events(&self, _user: &str) -> RemoteResult<Vec<EventWithCurrentRecord>> {
        Self::offline()
    }

    fn get_event(&self, _user: &str, _event_id: &str) -> RemoteResult<EventDetail> {
        Self::offline()
    }

    fn create_event(
        &self,
        _user: &str,
        _input: &CreateEventInput,
    ) -> RemoteResult<EventWithCurrentRecord> {
        Self::offline()
    }

    fn complete_event(
        &self,
        _user: &str,
        _input: &CompleteEventInput,
    ) -> RemoteResult<EventWithCurrentRecord> {
        Self::offline()
    }

    fn create_record(
        &self,
        _user: &str,
        _input: &CreateRecordInput,
    ) -> RemoteResult<EventWithCurrentRecord> {
        Self::offline()
    }

    fn complete_record(
        &self,
        _user: &str,
        _input: &CompleteRecordInput,
    ) -> RemoteResult<EventWithCurrentRecord> {
        Self::offline()
    }

    fn delete_event(&self, _user: &str, _event_id: &str) -> RemoteResult<()> {
        Self::offline()
    }
}
