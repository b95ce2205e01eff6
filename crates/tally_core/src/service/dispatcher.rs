//! Remote-first operation routing with local fallback.
//!
//! # Responsibility
//! - Pick the backend for every tracker operation based on session presence.
//! - Fall back to the local store when the remote attempt fails.
//!
//! # Invariants
//! - At most one remote attempt and one local attempt per call.
//! - No validation happens here; both backends validate on their own.
//! - Local and remote data are never reconciled or dual-written.

use crate::model::event::{EventDetail, EventWithCurrentRecord};
use crate::model::input::{
    CompleteEventInput, CompleteRecordInput, CreateEventInput, CreateRecordInput,
};
use crate::remote::{RemoteError, RemoteErrorKind, RemoteEventApi, RemoteResult, SessionProvider};
use crate::service::event_store::LocalEventStore;
use crate::service::TrackerResult;
use log::{debug, warn};

/// Backend that served a dispatched call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Remote,
    Local,
}

/// Routes tracker operations to the remote backend when a session exists,
/// otherwise (or on any remote failure) to the local store.
pub struct FallbackDispatcher<S, R> {
    session: S,
    remote: R,
    local: LocalEventStore,
    last_backend: Option<Backend>,
}

impl<S: SessionProvider, R: RemoteEventApi> FallbackDispatcher<S, R> {
    pub fn new(session: S, remote: R, local: LocalEventStore) -> Self {
        Self {
            session,
            remote,
            local,
            last_backend: None,
        }
    }

    /// Backend that answered the most recent call, if any call completed routing.
    pub fn last_backend(&self) -> Option<Backend> {
        self.last_backend
    }

    pub fn list_events(&mut self) -> TrackerResult<Vec<EventWithCurrentRecord>> {
        self.dispatch(
            "list_events",
            |remote, user| remote.list_events(user),
            |local| local.list_events(),
        )
    }

    pub fn get_event(&mut self, event_id: &str) -> TrackerResult<EventDetail> {
        self.dispatch(
            "get_event",
            |remote, user| remote.get_event(user, event_id),
            |local| local.get_event(event_id),
        )
    }

    pub fn create_event(
        &mut self,
        input: &CreateEventInput,
    ) -> TrackerResult<EventWithCurrentRecord> {
        self.dispatch(
            "create_event",
            |remote, user| remote.create_event(user, input),
            |local| local.create_event(input),
        )
    }

    pub fn complete_event(
        &mut self,
        input: &CompleteEventInput,
    ) -> TrackerResult<EventWithCurrentRecord> {
        self.dispatch(
            "complete_event",
            |remote, user| remote.complete_event(user, input),
            |local| local.complete_event(input),
        )
    }

    pub fn create_record(
        &mut self,
        input: &CreateRecordInput,
    ) -> TrackerResult<EventWithCurrentRecord> {
        self.dispatch(
            "create_record",
            |remote, user| remote.create_record(user, input),
            |local| local.create_record(input),
        )
    }

    pub fn complete_record(
        &mut self,
        input: &CompleteRecordInput,
    ) -> TrackerResult<EventWithCurrentRecord> {
        self.dispatch(
            "complete_record",
            |remote, user| remote.complete_record(user, input),
            |local| local.complete_record(input),
        )
    }

    pub fn delete_event(&mut self, event_id: &str) -> TrackerResult<()> {
        self.dispatch(
            "delete_event",
            |remote, user| remote.delete_event(user, event_id),
            |local| local.delete_event(event_id),
        )
    }

    fn dispatch<T>(
        &mut self,
        operation: &'static str,
        remote_call: impl FnOnce(&R, &str) -> RemoteResult<T>,
        local_call: impl FnOnce(&mut LocalEventStore) -> TrackerResult<T>,
    ) -> TrackerResult<T> {
        match self.try_remote(remote_call) {
            Ok(value) => {
                debug!("event=dispatch module=service status=ok operation={operation} backend=remote");
                self.last_backend = Some(Backend::Remote);
                return Ok(value);
            }
            Err(err) if err.kind() == RemoteErrorKind::Unauthenticated => {
                debug!(
                    "event=dispatch module=service status=fallback operation={operation} backend=local reason=unauthenticated"
                );
            }
            Err(err) => {
                warn!(
                    "event=dispatch module=service status=fallback operation={} backend=local reason={} error={}",
                    operation,
                    err.kind().as_str(),
                    err
                );
            }
        }

        self.last_backend = Some(Backend::Local);
        local_call(&mut self.local)
    }

    fn try_remote<T>(
        &self,
        remote_call: impl FnOnce(&R, &str) -> RemoteResult<T>,
    ) -> RemoteResult<T> {
        let user = self
            .session
            .current_user()?
            .ok_or(RemoteError::Unauthenticated)?;
        remote_call(&self.remote, &user)
    }
}
