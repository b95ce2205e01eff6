//! Local event/record store.
//!
//! # Responsibility
//! - Provide the seven tracker operations on top of the local `Store`.
//! - Keep event/record invariants intact across every write.
//!
//! # Invariants
//! - Validation happens before a transaction is opened.
//! - Checks and writes of one operation share a single transaction.
//! - Timestamps issued by one handle strictly increase.
//! - Deleting an event removes every record carrying its id.

use crate::db::{Collection, Store, TxMode};
use crate::model::event::{
    sort_newest_first, Event, EventDetail, EventWithCurrentRecord, Record,
};
use crate::model::input::{
    validate_count, CompleteEventInput, CompleteRecordInput, CreateEventInput, CreateRecordInput,
};
use crate::service::{TrackerError, TrackerResult};
use chrono::{DateTime, Duration, Utc};
use log::info;
use std::slice;

const ALL_COLLECTIONS: [Collection; 2] = [Collection::Events, Collection::Records];

/// Tracker operations backed by the embedded local store.
pub struct LocalEventStore {
    store: Store,
    last_stamp: Option<DateTime<Utc>>,
}

impl LocalEventStore {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            last_stamp: None,
        }
    }

    /// Lists all events, newest created first, with their current record.
    pub fn list_events(&mut self) -> TrackerResult<Vec<EventWithCurrentRecord>> {
        self.store
            .run_transaction(&ALL_COLLECTIONS, TxMode::ReadOnly, |tx| {
                let mut events: Vec<Event> = tx.get_all(Collection::Events)?;
                let records: Vec<Record> = tx.get_all(Collection::Records)?;
                sort_newest_first(&mut events, |event| (event.created_at, event.id.as_str()));

                Ok(events
                    .into_iter()
                    .map(|event| event.with_current_record(&records))
                    .collect())
            })
    }

    /// Gets one event with its full record history, newest created first.
    pub fn get_event(&mut self, event_id: &str) -> TrackerResult<EventDetail> {
        self.store
            .run_transaction(&ALL_COLLECTIONS, TxMode::ReadOnly, |tx| {
                let event: Event = tx
                    .get(Collection::Events, event_id)?
                    .ok_or_else(|| TrackerError::event_not_found(event_id))?;
                let mut records: Vec<Record> = tx
                    .get_all::<Record>(Collection::Records)?
                    .into_iter()
                    .filter(|record| record.event_id == event.id)
                    .collect();
                sort_newest_first(&mut records, |record| {
                    (record.created_at, record.id.as_str())
                });

                let EventWithCurrentRecord {
                    event,
                    current_record,
                } = event.with_current_record(&records);
                Ok(EventDetail {
                    event,
                    current_record,
                    records,
                })
            })
    }

    /// Creates an event together with its first active record.
    ///
    /// # Errors
    /// - `InvalidInput` when the title trims to empty or the count is not a
    ///   finite non-negative number.
    pub fn create_event(
        &mut self,
        input: &CreateEventInput,
    ) -> TrackerResult<EventWithCurrentRecord> {
        let (title, count) = input.validate()?;
        let now = self.next_timestamp();

        let mut event = Event::new(title, now);
        let record = Record::open(event.id.clone(), count, now);
        event.attach_record(&record, now);

        self.store
            .run_transaction(&ALL_COLLECTIONS, TxMode::ReadWrite, |tx| {
                tx.put(Collection::Events, &event)?;
                tx.put(Collection::Records, &record)?;
                Ok::<_, TrackerError>(())
            })?;

        info!(
            "event=event_create module=service status=ok event_id={} record_id={}",
            event.id, record.id
        );
        Ok(event.with_current_record(slice::from_ref(&record)))
    }

    /// Marks an event as completed. Records are left untouched.
    ///
    /// Completing an already completed event only refreshes `updated_at`.
    pub fn complete_event(
        &mut self,
        input: &CompleteEventInput,
    ) -> TrackerResult<EventWithCurrentRecord> {
        let now = self.next_timestamp();
        let event_id = input.event_id.as_str();

        let updated = self
            .store
            .run_transaction(&ALL_COLLECTIONS, TxMode::ReadWrite, |tx| {
                let mut event: Event = tx
                    .get(Collection::Events, event_id)?
                    .ok_or_else(|| TrackerError::event_not_found(event_id))?;
                event.completed = true;
                event.updated_at = now;
                tx.put(Collection::Events, &event)?;

                let current: Option<Record> = match event.current_record_id.as_deref() {
                    Some(record_id) => tx.get(Collection::Records, record_id)?,
                    None => None,
                };
                Ok::<_, TrackerError>(event.with_current_record(current.as_slice()))
            })?;

        info!("event=event_complete module=service status=ok event_id={event_id}");
        Ok(updated)
    }

    /// Opens a new record for an event that has none active.
    ///
    /// # Errors
    /// - `InvalidInput` for a negative or non-finite count.
    /// - `NotFound` when the event does not exist.
    /// - `Conflict` when the event already has an active record or is completed.
    pub fn create_record(
        &mut self,
        input: &CreateRecordInput,
    ) -> TrackerResult<EventWithCurrentRecord> {
        let count = validate_count(input.count)?;
        let now = self.next_timestamp();
        let event_id = input.event_id.as_str();

        let updated = self
            .store
            .run_transaction(&ALL_COLLECTIONS, TxMode::ReadWrite, |tx| {
                let mut event: Event = tx
                    .get(Collection::Events, event_id)?
                    .ok_or_else(|| TrackerError::event_not_found(event_id))?;
                if event.has_active_record() {
                    return Err(TrackerError::Conflict(format!(
                        "event {event_id} already has an active record"
                    )));
                }
                if event.completed {
                    return Err(TrackerError::Conflict(format!(
                        "event {event_id} is completed"
                    )));
                }

                let record = Record::open(event.id.clone(), count, now);
                event.attach_record(&record, now);
                tx.put(Collection::Records, &record)?;
                tx.put(Collection::Events, &event)?;
                Ok::<_, TrackerError>(event.with_current_record(slice::from_ref(&record)))
            })?;

        info!(
            "event=record_create module=service status=ok event_id={} record_id={}",
            event_id,
            updated.event.current_record_id.as_deref().unwrap_or_default()
        );
        Ok(updated)
    }

    /// Completes the active record, optionally opening its successor.
    ///
    /// Without a successor the event keeps `completed == false` and has no
    /// active record until `create_record` is called.
    ///
    /// # Errors
    /// - `InvalidInput` for a negative successor count.
    /// - `NotFound` when the event or its current record is missing.
    /// - `Conflict` when the event has no active record, or when a successor
    ///   is requested for a completed event.
    pub fn complete_record(
        &mut self,
        input: &CompleteRecordInput,
    ) -> TrackerResult<EventWithCurrentRecord> {
        let successor_count = input.successor_count()?;
        let now = self.next_timestamp();
        let event_id = input.event_id.as_str();

        let updated = self
            .store
            .run_transaction(&ALL_COLLECTIONS, TxMode::ReadWrite, |tx| {
                let mut event: Event = tx
                    .get(Collection::Events, event_id)?
                    .ok_or_else(|| TrackerError::event_not_found(event_id))?;
                let current_id = event.current_record_id.clone().ok_or_else(|| {
                    TrackerError::Conflict(format!("event {event_id} has no active record"))
                })?;
                if successor_count.is_some() && event.completed {
                    return Err(TrackerError::Conflict(format!(
                        "event {event_id} is completed"
                    )));
                }
                let mut current: Record = tx
                    .get(Collection::Records, &current_id)?
                    .ok_or_else(|| TrackerError::record_not_found(&current_id))?;

                current.completed = true;
                current.updated_at = now;
                tx.put(Collection::Records, &current)?;

                let successor = match successor_count {
                    Some(count) => {
                        let next = Record::open(event.id.clone(), count, now);
                        tx.put(Collection::Records, &next)?;
                        event.attach_record(&next, now);
                        Some(next)
                    }
                    None => {
                        event.current_record_id = None;
                        event.updated_at = now;
                        None
                    }
                };
                tx.put(Collection::Events, &event)?;

                Ok::<_, TrackerError>(event.with_current_record(successor.as_slice()))
            })?;

        info!(
            "event=record_complete module=service status=ok event_id={} create_next={}",
            event_id, input.create_next
        );
        Ok(updated)
    }

    /// Deletes an event and every record that belongs to it.
    pub fn delete_event(&mut self, event_id: &str) -> TrackerResult<()> {
        let removed = self
            .store
            .run_transaction(&ALL_COLLECTIONS, TxMode::ReadWrite, |tx| {
                if tx.get::<Event>(Collection::Events, event_id)?.is_none() {
                    return Err(TrackerError::event_not_found(event_id));
                }

                let owned: Vec<Record> = tx
                    .get_all::<Record>(Collection::Records)?
                    .into_iter()
                    .filter(|record| record.event_id == event_id)
                    .collect();
                for record in &owned {
                    tx.delete(Collection::Records, &record.id)?;
                }
                tx.delete(Collection::Events, event_id)?;
                Ok::<_, TrackerError>(owned.len())
            })?;

        info!(
            "event=event_delete module=service status=ok event_id={event_id} records_removed={removed}"
        );
        Ok(())
    }

    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_stamp {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_stamp = Some(now);
        now
    }
}
