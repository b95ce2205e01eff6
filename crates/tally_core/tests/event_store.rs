use chrono::Utc;
use tally_core::db::{open_store, Collection, TxMode};
use tally_core::{
    open_store_in_memory, CompleteEventInput, CompleteRecordInput, CreateEventInput,
    CreateRecordInput, Event, InputError, LocalEventStore, Record, TrackerError,
};

fn local_store() -> LocalEventStore {
    LocalEventStore::new(open_store_in_memory().unwrap())
}

fn complete_record(
    event_id: &str,
    create_next: bool,
    next_count: Option<f64>,
) -> CompleteRecordInput {
    CompleteRecordInput {
        event_id: event_id.to_string(),
        create_next,
        next_count,
    }
}

#[test]
fn create_event_opens_first_record() {
    let mut store = local_store();

    let created = store
        .create_event(&CreateEventInput::new("  Morning run ", 3.0))
        .unwrap();

    assert_eq!(created.event.title, "Morning run");
    assert!(!created.event.completed);
    let record = created.current_record.unwrap();
    assert_eq!(created.event.current_record_id.as_deref(), Some(record.id.as_str()));
    assert_eq!(record.event_id, created.event.id);
    assert_eq!(record.count, 3.0);
    assert!(!record.completed);
}

#[test]
fn create_event_rejects_invalid_input() {
    let mut store = local_store();

    for input in [
        CreateEventInput::new("", 1.0),
        CreateEventInput::new("   ", 1.0),
        CreateEventInput::new("Read", -1.0),
        CreateEventInput::new("Read", f64::NAN),
    ] {
        let err = store.create_event(&input).unwrap_err();
        assert!(matches!(err, TrackerError::InvalidInput(_)), "{input:?}");
    }

    assert!(store.list_events().unwrap().is_empty());
}

#[test]
fn get_event_round_trips_created_record() {
    let mut store = local_store();
    let created = store
        .create_event(&CreateEventInput::new("Pushups", 20.0))
        .unwrap();

    let detail = store.get_event(&created.event.id).unwrap();

    assert_eq!(detail.event, created.event);
    assert_eq!(detail.current_record, created.current_record);
    assert_eq!(detail.records.len(), 1);
    assert_eq!(Some(&detail.records[0]), created.current_record.as_ref());
}

#[test]
fn get_event_unknown_id_is_not_found() {
    let mut store = local_store();
    let err = store.get_event("missing").unwrap_err();
    assert!(matches!(err, TrackerError::NotFound(_)));
}

#[test]
fn list_events_returns_newest_first_with_current_record() {
    let mut store = local_store();
    let first = store.create_event(&CreateEventInput::new("First", 1.0)).unwrap();
    let second = store.create_event(&CreateEventInput::new("Second", 2.0)).unwrap();
    let third = store.create_event(&CreateEventInput::new("Third", 3.0)).unwrap();

    let listed = store.list_events().unwrap();
    let ids: Vec<_> = listed.iter().map(|item| item.event.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            third.event.id.as_str(),
            second.event.id.as_str(),
            first.event.id.as_str()
        ]
    );
    assert_eq!(listed[1].current_record.as_ref().unwrap().count, 2.0);
}

#[test]
fn complete_record_without_successor_clears_current_record() {
    let mut store = local_store();
    let created = store.create_event(&CreateEventInput::new("Plank", 4.0)).unwrap();
    let first_record = created.current_record.unwrap();

    let updated = store
        .complete_record(&complete_record(&created.event.id, false, None))
        .unwrap();

    assert!(updated.event.current_record_id.is_none());
    assert!(updated.current_record.is_none());
    assert!(!updated.event.completed);

    let detail = store.get_event(&created.event.id).unwrap();
    assert_eq!(detail.records.len(), 1);
    assert!(detail.records[0].completed);
    assert_eq!(detail.records[0].count, first_record.count);
    assert!(detail.event.updated_at > created.event.updated_at);
}

#[test]
fn complete_record_with_successor_opens_next_record() {
    let mut store = local_store();
    let created = store.create_event(&CreateEventInput::new("Squats", 10.0)).unwrap();
    let first_record = created.current_record.unwrap();

    let updated = store
        .complete_record(&complete_record(&created.event.id, true, Some(5.0)))
        .unwrap();

    let next = updated.current_record.unwrap();
    assert_ne!(next.id, first_record.id);
    assert_eq!(next.count, 5.0);
    assert!(!next.completed);
    assert_eq!(updated.event.current_record_id.as_deref(), Some(next.id.as_str()));

    let detail = store.get_event(&created.event.id).unwrap();
    assert_eq!(detail.records.len(), 2);
    assert_eq!(detail.records[0].id, next.id);
    assert_eq!(detail.records[1].id, first_record.id);
    assert!(detail.records[1].completed);
    let active: Vec<_> = detail.records.iter().filter(|record| record.is_active()).collect();
    assert_eq!(active.len(), 1);
}

#[test]
fn complete_record_successor_defaults_count_to_zero() {
    let mut store = local_store();
    let created = store.create_event(&CreateEventInput::new("Lunges", 8.0)).unwrap();

    let updated = store
        .complete_record(&complete_record(&created.event.id, true, Some(f64::INFINITY)))
        .unwrap();

    assert_eq!(updated.current_record.unwrap().count, 0.0);
}

#[test]
fn complete_record_without_active_record_conflicts() {
    let mut store = local_store();
    let created = store.create_event(&CreateEventInput::new("Yoga", 1.0)).unwrap();
    store
        .complete_record(&complete_record(&created.event.id, false, None))
        .unwrap();

    let err = store
        .complete_record(&complete_record(&created.event.id, false, None))
        .unwrap_err();
    assert!(matches!(err, TrackerError::Conflict(_)));

    let err = store
        .complete_record(&complete_record("missing", false, None))
        .unwrap_err();
    assert!(matches!(err, TrackerError::NotFound(_)));
}

#[test]
fn create_record_conflicts_while_record_is_active() {
    let mut store = local_store();
    let created = store.create_event(&CreateEventInput::new("Swim", 2.0)).unwrap();

    let err = store
        .create_record(&CreateRecordInput {
            event_id: created.event.id.clone(),
            count: 1.0,
        })
        .unwrap_err();
    assert!(matches!(err, TrackerError::Conflict(_)));

    let detail = store.get_event(&created.event.id).unwrap();
    assert_eq!(detail.records.len(), 1);
}

#[test]
fn create_record_after_completion_opens_new_record() {
    let mut store = local_store();
    let created = store.create_event(&CreateEventInput::new("Bike", 12.0)).unwrap();
    store
        .complete_record(&complete_record(&created.event.id, false, None))
        .unwrap();

    let updated = store
        .create_record(&CreateRecordInput {
            event_id: created.event.id.clone(),
            count: 7.5,
        })
        .unwrap();

    let record = updated.current_record.unwrap();
    assert_eq!(record.count, 7.5);
    assert_eq!(updated.event.current_record_id.as_deref(), Some(record.id.as_str()));
}

#[test]
fn create_record_validates_input_and_event() {
    let mut store = local_store();
    let created = store.create_event(&CreateEventInput::new("Walk", 1.0)).unwrap();
    store
        .complete_record(&complete_record(&created.event.id, false, None))
        .unwrap();

    let err = store
        .create_record(&CreateRecordInput {
            event_id: created.event.id.clone(),
            count: -3.0,
        })
        .unwrap_err();
    assert!(matches!(
        err,
        TrackerError::InvalidInput(InputError::InvalidCount(_))
    ));

    let err = store
        .create_record(&CreateRecordInput {
            event_id: "missing".to_string(),
            count: 1.0,
        })
        .unwrap_err();
    assert!(matches!(err, TrackerError::NotFound(_)));
}

#[test]
fn complete_event_twice_keeps_event_completed() {
    let mut store = local_store();
    let created = store.create_event(&CreateEventInput::new("Meditate", 1.0)).unwrap();
    let input = CompleteEventInput {
        event_id: created.event.id.clone(),
    };

    let first = store.complete_event(&input).unwrap();
    let second = store.complete_event(&input).unwrap();

    assert!(first.event.completed);
    assert!(second.event.completed);
    assert!(second.event.updated_at >= first.event.updated_at);
    assert_eq!(second.current_record, created.current_record);

    let detail = store.get_event(&created.event.id).unwrap();
    assert!(detail.event.completed);
    assert!(!detail.records[0].completed);
}

#[test]
fn complete_event_unknown_id_is_not_found() {
    let mut store = local_store();
    let err = store
        .complete_event(&CompleteEventInput {
            event_id: "missing".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, TrackerError::NotFound(_)));
}

#[test]
fn completed_event_does_not_open_records() {
    let mut store = local_store();
    let created = store.create_event(&CreateEventInput::new("Journal", 1.0)).unwrap();
    store
        .complete_record(&complete_record(&created.event.id, false, None))
        .unwrap();
    store
        .complete_event(&CompleteEventInput {
            event_id: created.event.id.clone(),
        })
        .unwrap();

    let err = store
        .create_record(&CreateRecordInput {
            event_id: created.event.id.clone(),
            count: 1.0,
        })
        .unwrap_err();
    assert!(matches!(err, TrackerError::Conflict(_)));
}

#[test]
fn completed_event_does_not_open_successor_record() {
    let mut store = local_store();
    let created = store.create_event(&CreateEventInput::new("Journal", 1.0)).unwrap();
    let first_record = created.current_record.unwrap();
    store
        .complete_event(&CompleteEventInput {
            event_id: created.event.id.clone(),
        })
        .unwrap();

    let err = store
        .complete_record(&complete_record(&created.event.id, true, Some(3.0)))
        .unwrap_err();
    assert!(matches!(err, TrackerError::Conflict(_)));

    let detail = store.get_event(&created.event.id).unwrap();
    assert_eq!(detail.records.len(), 1);
    assert!(!detail.records[0].completed);
    assert_eq!(detail.current_record.as_ref(), Some(&first_record));

    let updated = store
        .complete_record(&complete_record(&created.event.id, false, None))
        .unwrap();
    assert!(updated.event.completed);
    assert!(updated.current_record.is_none());
    let detail = store.get_event(&created.event.id).unwrap();
    assert_eq!(detail.records.len(), 1);
    assert!(detail.records[0].completed);
}

#[test]
fn failing_transaction_leaves_events_and_records_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tally.sqlite3");
    let created = {
        let mut store = LocalEventStore::new(open_store(&path).unwrap());
        store.create_event(&CreateEventInput::new("Stable", 2.0)).unwrap()
    };

    let mut raw = open_store(&path).unwrap();
    let err = raw
        .run_transaction(
            &[Collection::Events, Collection::Records],
            TxMode::ReadWrite,
            |tx| {
                let mut event: Event = tx.get(Collection::Events, &created.event.id)?.unwrap();
                let next = Record::open(event.id.clone(), 5.0, Utc::now());
                tx.put(Collection::Records, &next)?;
                event.attach_record(&next, Utc::now());
                tx.put(Collection::Events, &event)?;
                Err::<(), _>(TrackerError::Conflict("late failure".to_string()))
            },
        )
        .unwrap_err();
    assert!(matches!(err, TrackerError::Conflict(_)));
    drop(raw);

    let mut reopened = LocalEventStore::new(open_store(&path).unwrap());
    let detail = reopened.get_event(&created.event.id).unwrap();
    assert_eq!(detail.event, created.event);
    assert_eq!(detail.records, vec![created.current_record.unwrap()]);
    assert_eq!(reopened.list_events().unwrap().len(), 1);
}

#[test]
fn delete_event_cascades_records() {
    let mut store = local_store();
    let kept = store.create_event(&CreateEventInput::new("Keep", 1.0)).unwrap();
    let doomed = store.create_event(&CreateEventInput::new("Drop", 1.0)).unwrap();
    store
        .complete_record(&complete_record(&doomed.event.id, true, Some(2.0)))
        .unwrap();

    store.delete_event(&doomed.event.id).unwrap();

    let listed = store.list_events().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].event.id, kept.event.id);
    assert!(matches!(
        store.get_event(&doomed.event.id).unwrap_err(),
        TrackerError::NotFound(_)
    ));
    assert_eq!(store.get_event(&kept.event.id).unwrap().records.len(), 1);
    assert!(matches!(
        store.delete_event(&doomed.event.id).unwrap_err(),
        TrackerError::NotFound(_)
    ));
}

#[test]
fn data_survives_reopening_store_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tally.sqlite3");

    let created = {
        let mut store = LocalEventStore::new(open_store(&path).unwrap());
        store.create_event(&CreateEventInput::new("Persist", 9.0)).unwrap()
    };

    let mut reopened = LocalEventStore::new(open_store(&path).unwrap());
    let detail = reopened.get_event(&created.event.id).unwrap();
    assert_eq!(detail.event, created.event);
    assert_eq!(detail.current_record, created.current_record);
}
