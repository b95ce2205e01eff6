//! Event and record domain model.
//!
//! # Responsibility
//! - Define the persisted `Event`/`Record` documents.
//! - Define read models joining an event with its current record/history.
//!
//! # Invariants
//! - `id` is generated once and never reused for another entity.
//! - `Event::current_record_id`, when set, names a record of the same event.
//! - At most one record per event has `completed == false`.

use crate::db::Document;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque event identifier. Local ids are UUID text, remote ids are numeric text.
pub type EventId = String;
/// Opaque record identifier.
pub type RecordId = String;

/// A trackable recurring commitment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    /// Trimmed, non-empty display title. Never changed after creation.
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Record currently open for this event, if any.
    pub current_record_id: Option<RecordId>,
    pub completed: bool,
}

impl Event {
    /// Creates an open event with no record attached yet.
    pub fn new(title: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            created_at: now,
            updated_at: now,
            current_record_id: None,
            completed: false,
        }
    }

    /// Re-points the event at `record` as its active record.
    pub fn attach_record(&mut self, record: &Record, now: DateTime<Utc>) {
        self.current_record_id = Some(record.id.clone());
        self.updated_at = now;
    }

    /// Returns whether the event currently has an open record.
    pub fn has_active_record(&self) -> bool {
        self.current_record_id.is_some()
    }

    /// Joins the event with its current record, looked up in `records`.
    pub fn with_current_record(self, records: &[Record]) -> EventWithCurrentRecord {
        let current_record = self.current_record_id.as_deref().and_then(|current_id| {
            records
                .iter()
                .find(|record| record.id == current_id)
                .cloned()
        });

        EventWithCurrentRecord {
            event: self,
            current_record,
        }
    }
}

impl Document for Event {
    fn key(&self) -> &str {
        &self.id
    }
}

/// One measured cycle of an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: RecordId,
    pub event_id: EventId,
    /// Finite, non-negative. Fixed at creation.
    pub count: f64,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record {
    /// Creates an active (not completed) record for `event_id`.
    pub fn open(event_id: impl Into<EventId>, count: f64, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_id: event_id.into(),
            count,
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns whether this record is still open.
    pub fn is_active(&self) -> bool {
        !self.completed
    }
}

impl Document for Record {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Event joined with its resolved current record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventWithCurrentRecord {
    #[serde(flatten)]
    pub event: Event,
    pub current_record: Option<Record>,
}

/// Event with its current record and full record history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetail {
    #[serde(flatten)]
    pub event: Event,
    pub current_record: Option<Record>,
    /// Every record of the event, newest created first.
    pub records: Vec<Record>,
}

/// Sorts newest-created first. Ties keep a stable order by id.
pub(crate) fn sort_newest_first<T>(
    items: &mut [T],
    key: impl Fn(&T) -> (DateTime<Utc>, &str),
) {
    items.sort_by(|left, right| {
        let (left_at, left_id) = key(left);
        let (right_at, right_id) = key(right);
        right_at.cmp(&left_at).then_with(|| left_id.cmp(right_id))
    });
}
