//! Remote table rows and their mapping onto domain shapes.
//!
//! # Invariants
//! - Numeric row ids become their decimal string form.
//! - Nullable flags map to `false`, nullable counts to `0`, nullable titles to
//!   an empty string.
//! - Timestamps are passed through unchanged.

use crate::model::event::{Event, EventDetail, EventWithCurrentRecord, Record};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Row of the remote `records` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordRow {
    pub id: i64,
    pub event_id: i64,
    pub creator_id: String,
    pub count: Option<f64>,
    pub completed: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row of the remote `events` table, optionally joined with its current record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRow {
    pub id: i64,
    pub creator_id: String,
    pub title: Option<String>,
    pub completed: Option<bool>,
    pub current_record_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub current_record: Option<RecordRow>,
}

impl From<RecordRow> for Record {
    fn from(row: RecordRow) -> Self {
        Self {
            id: row.id.to_string(),
            event_id: row.event_id.to_string(),
            count: row.count.unwrap_or(0.0),
            completed: row.completed.unwrap_or(false),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl EventRow {
    fn split(self) -> (Event, Option<Record>) {
        let event = Event {
            id: self.id.to_string(),
            title: self.title.unwrap_or_default(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            current_record_id: self.current_record_id.map(|id| id.to_string()),
            completed: self.completed.unwrap_or(false),
        };
        (event, self.current_record.map(Record::from))
    }

    /// Maps the row and its joined current record.
    pub fn into_event_with_current(self) -> EventWithCurrentRecord {
        let (event, current_record) = self.split();
        EventWithCurrentRecord {
            event,
            current_record,
        }
    }

    /// Maps the row plus its record rows, already ordered newest first.
    pub fn into_detail(self, records: Vec<RecordRow>) -> EventDetail {
        let (event, current_record) = self.split();
        EventDetail {
            event,
            current_record,
            records: records.into_iter().map(Record::from).collect(),
        }
    }
}
