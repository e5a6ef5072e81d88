//! Behavior of records and the store through the public API.

use std::sync::{Arc, Mutex};

use guardrail_records::prelude::*;
use guardrail_records::record::STATUS_DISABLED;
use serde_json::{Value, json};

fn bag(value: Value) -> AttributeBag {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

/// Observer that records a one-line summary of each event.
fn recorder() -> (Arc<Mutex<Vec<String>>>, impl RecordObserver + 'static) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    let observer = FnObserver::new(move |event: &RecordEvent<'_>| {
        let line = match event {
            RecordEvent::FieldChanged { key, new, .. } => format!("changed {key}={new}"),
            RecordEvent::FieldRemoved { key, .. } => format!("removed {key}"),
            RecordEvent::Updated { changed, .. } => format!("updated {}", changed.join(",")),
        };
        sink.lock().unwrap().push(line);
    });
    (log, observer)
}

// ── Construction ──

#[test]
fn every_attribute_is_readable() {
    let attrs = bag(json!({
        "id": 7,
        "response": "Blocked.",
        "description": "Default",
        "status": 1,
        "tenantId": "acme",
        "custom": {"nested": [1, 2]}
    }));
    let record = ResponseTemplateRecord::new(attrs.clone(), RecordOptions::default()).unwrap();
    for (key, value) in &attrs {
        assert_eq!(record.get(key), Some(value), "field {key}");
    }
    assert_eq!(record.id(), Some(RecordId::Int(7)));
}

#[test]
fn empty_bag_is_a_new_record() {
    let record = ResponseTemplateRecord::new(AttributeBag::new(), RecordOptions::default()).unwrap();
    assert!(record.attributes().is_empty());
    assert_eq!(record.id(), None);
    assert!(record.is_new());
    assert!(record.is_enabled());
}

#[test]
fn unknown_fields_are_kept() {
    let record = ResponseTemplateRecord::from_json(json!({"id": "rt-1", "name": "Deny"})).unwrap();
    assert_eq!(record.get("name"), Some(&json!("Deny")));
    assert_eq!(record.id(), Some(RecordId::Str("rt-1".into())));
}

#[test]
fn attributes_overwrite_defaults() {
    let options = RecordOptions::default()
        .with_default("status", json!(1))
        .with_default("description", json!("(none)"));
    let record =
        ResponseTemplateRecord::from_json_with(json!({"status": 0, "response": "x"}), options)
            .unwrap();
    assert_eq!(record.status(), Some(STATUS_DISABLED));
    assert_eq!(record.description(), Some("(none)"));
    assert!(!record.is_enabled());
}

#[test]
fn same_bag_gives_equal_but_distinct_records() {
    let attrs = bag(json!({"id": 1, "response": "Blocked."}));
    let mut a = ResponseTemplateRecord::new(attrs.clone(), RecordOptions::default()).unwrap();
    let b = ResponseTemplateRecord::new(attrs, RecordOptions::default()).unwrap();

    assert_eq!(a, b);
    assert_ne!(a.cid(), b.cid());
    assert!(!a.same_instance(&b));

    a.set("response", "Changed.");
    assert_eq!(b.response(), Some("Blocked."));
    assert_ne!(a, b);
}

#[test]
fn missing_required_field_aborts_construction() {
    let options = RecordOptions::default().with_required("response");
    let err = ResponseTemplateRecord::from_json_with(json!({"id": 1}), options.clone()).unwrap_err();
    assert!(matches!(err, RecordError::MissingField(ref f) if f == "response"));

    let err = ResponseTemplateRecord::from_json_with(json!({"response": null}), options).unwrap_err();
    assert!(matches!(err, RecordError::MissingField(_)));
}

#[test]
fn schema_violation_aborts_construction() {
    let options = RecordOptions::default().with_template_schema();
    let err = ResponseTemplateRecord::from_json_with(json!({"response": 42}), options.clone())
        .unwrap_err();
    assert!(matches!(err, RecordError::SchemaViolation(_)));

    let ok = ResponseTemplateRecord::from_json_with(json!({"response": "fine"}), options);
    assert!(ok.is_ok());
}

#[test]
fn non_object_json_is_rejected() {
    let err = ResponseTemplateRecord::from_json(json!(["response"])).unwrap_err();
    assert!(matches!(err, RecordError::NotAnObject("array")));
}

// ── Observation ──

#[test]
fn observer_sees_set_before_it_returns() {
    let mut record = ResponseTemplateRecord::from_json(json!({"response": "a"})).unwrap();
    let (log, observer) = recorder();
    record.subscribe(observer);

    assert!(record.set("response", "b"));
    assert_eq!(*log.lock().unwrap(), vec![r#"changed response="b""#.to_string()]);
}

#[test]
fn equal_value_emits_nothing() {
    let mut record = ResponseTemplateRecord::from_json(json!({"status": 1})).unwrap();
    let (log, observer) = recorder();
    record.subscribe(observer);

    assert!(!record.set("status", 1));
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn update_emits_field_events_then_one_summary() {
    let mut record =
        ResponseTemplateRecord::from_json(json!({"response": "a", "status": 1})).unwrap();
    let (log, observer) = recorder();
    record.subscribe(observer);

    let changed = record.update(bag(json!({"response": "b", "status": 1, "description": "d"})));
    assert_eq!(changed, vec!["description".to_string(), "response".to_string()]);
    assert_eq!(
        *log.lock().unwrap(),
        vec![
            r#"changed description="d""#.to_string(),
            r#"changed response="b""#.to_string(),
            "updated description,response".to_string(),
        ]
    );
}

#[test]
fn unsubscribed_observer_stops_receiving() {
    let mut record = ResponseTemplateRecord::from_json(json!({})).unwrap();
    let (log, observer) = recorder();
    let id = record.subscribe(observer);
    record.set("response", "a");
    assert!(record.unsubscribe(id));
    record.unset("response");
    assert_eq!(log.lock().unwrap().len(), 1);
    assert_eq!(record.observer_count(), 0);
}

#[test]
fn field_observer_tracks_one_field() {
    let seen = Arc::new(Mutex::new(Vec::<Option<Value>>::new()));
    let observer = FieldObserver::with_state(seen.clone())
        .on("response", |seen, value| seen.push(value.cloned()))
        .build();

    let mut record = ResponseTemplateRecord::from_json(json!({"response": "a"})).unwrap();
    record.subscribe(observer);
    record.set("status", 0);
    record.set("response", "b");
    record.unset("response");

    assert_eq!(*seen.lock().unwrap(), vec![Some(json!("b")), None]);
}

// ── Typed projection ──

#[test]
fn typed_projection_round_trips() {
    let template = ResponseTemplate::new("Blocked.")
        .with_description("Default")
        .with_status(1);
    let record = template.clone().into_record(RecordOptions::default()).unwrap();
    assert_eq!(record.response(), Some("Blocked."));
    assert_eq!(record.to_template().unwrap(), template);
}

#[test]
fn typed_projection_requires_response() {
    let record = ResponseTemplateRecord::from_json(json!({"description": "draft"})).unwrap();
    assert!(matches!(record.to_template(), Err(RecordError::Shape(_))));
}

// ── Store ──

#[test]
fn store_accepts_array_and_envelope() {
    let array = r#"[{"id": 1, "response": "a"}, {"id": 2, "response": "b"}]"#;
    let store = TemplateStore::from_json_str(array, RecordOptions::default()).unwrap();
    assert_eq!(store.len(), 2);
    assert!(store.page().is_none());

    let envelope = r#"{
        "content": [{"id": 1, "response": "a"}],
        "totalElements": 11, "totalPages": 2, "number": 0, "size": 10
    }"#;
    let store = TemplateStore::from_json_str(envelope, RecordOptions::default()).unwrap();
    assert_eq!(store.len(), 1);
    assert_eq!(store.page().and_then(|p| p.total_elements), Some(11));
}

#[test]
fn store_upsert_merges_by_id_and_notifies() {
    let doc = r#"[{"id": 1, "response": "a"}, {"id": 2, "response": "b"}]"#;
    let mut store = TemplateStore::from_json_str(doc, RecordOptions::default()).unwrap();

    let (log, observer) = recorder();
    store.get_mut(&RecordId::Int(1)).unwrap().subscribe(observer);

    let outcome = store.upsert(bag(json!({"id": 1, "response": "a2"}))).unwrap();
    assert_eq!(
        outcome,
        UpsertOutcome::Merged {
            index: 0,
            changed: vec!["response".into()]
        }
    );
    assert_eq!(log.lock().unwrap().len(), 2);

    let outcome = store.upsert(bag(json!({"id": 3, "response": "c"}))).unwrap();
    assert_eq!(outcome, UpsertOutcome::Inserted(2));

    let ids: Vec<_> = store.iter().filter_map(|r| r.id()).collect();
    assert_eq!(ids, vec![RecordId::Int(1), RecordId::Int(2), RecordId::Int(3)]);
}

#[test]
fn store_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("templates.json");

    let mut store = TemplateStore::new(RecordOptions::default());
    store.upsert(bag(json!({"id": 1, "response": "a"}))).unwrap();
    store.upsert(bag(json!({"response": "unsaved draft"}))).unwrap();
    store.save(&path).unwrap();

    let loaded = TemplateStore::load(&path, RecordOptions::default()).unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.get(&RecordId::Int(1)).unwrap().response(), Some("a"));
}
