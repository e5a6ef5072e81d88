//! The guardrail response template record and its typed projection.
//!
//! [`ResponseTemplateRecord`] is the open-ended, observable model a
//! presentation layer binds to. [`ResponseTemplate`] is the typed shape of
//! the same data as the backend defines it, produced on demand.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::AttributeBag;
use crate::error::{RecordError, json_type_name};

use super::base::{BaseRecord, RecordId};
use super::events::{RecordObserver, SubscriptionId};
use super::options::RecordOptions;

/// `status` value of an enabled template.
pub const STATUS_ENABLED: i64 = 1;
/// `status` value of a disabled template.
pub const STATUS_DISABLED: i64 = 0;

// ── Record ─────────────────────────────────────────────────────────

/// One guardrail response template, observable field by field.
///
/// Built from an attribute bag: the base record is initialized first, then
/// every attribute is copied on top, overwriting same-named defaults.
///
/// ```
/// use guardrail_records::record::ResponseTemplateRecord;
/// use serde_json::json;
///
/// let record = ResponseTemplateRecord::from_json(json!({"id": "rt-1", "name": "Deny"})).unwrap();
/// assert_eq!(record.get("name"), Some(&json!("Deny")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResponseTemplateRecord {
    base: BaseRecord,
}

impl ResponseTemplateRecord {
    /// Construct a record. Base-record failures propagate unchanged.
    pub fn new(attributes: AttributeBag, options: RecordOptions) -> Result<Self, RecordError> {
        let mut base = BaseRecord::initialize(&attributes, options)?;
        let count = attributes.len();
        for (key, value) in attributes {
            base.assign(key, value);
        }
        trace!(cid = base.cid(), attributes = count, "Response template record constructed");
        Ok(Self { base })
    }

    /// Construct from a JSON object with default options.
    pub fn from_json(value: Value) -> Result<Self, RecordError> {
        Self::from_json_with(value, RecordOptions::default())
    }

    /// Construct from a JSON object with the given options.
    pub fn from_json_with(value: Value, options: RecordOptions) -> Result<Self, RecordError> {
        match value {
            Value::Object(attributes) => Self::new(attributes, options),
            other => Err(RecordError::NotAnObject(json_type_name(&other))),
        }
    }

    // ── Fields ──

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.base.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.base.has(key)
    }

    pub fn attributes(&self) -> &AttributeBag {
        self.base.attributes()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.base.keys()
    }

    /// Assign a field. Observers see the change before this returns.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        self.base.set(key, value.into())
    }

    pub fn unset(&mut self, key: &str) -> Option<Value> {
        self.base.unset(key)
    }

    /// Merge a bag of fields, as after a re-fetch or an edit form submit.
    pub fn update(&mut self, bag: AttributeBag) -> Vec<String> {
        self.base.update(bag)
    }

    // ── Identity ──

    pub fn id(&self) -> Option<RecordId> {
        self.base.id()
    }

    pub fn cid(&self) -> &str {
        self.base.cid()
    }

    /// A record without an identifier has not been saved yet.
    pub fn is_new(&self) -> bool {
        self.id().is_none()
    }

    /// `true` only for the very same instance, unlike `==`.
    pub fn same_instance(&self, other: &Self) -> bool {
        self.cid() == other.cid()
    }

    pub fn options(&self) -> &RecordOptions {
        self.base.options()
    }

    // ── Template fields ──

    /// Text returned to the caller when a guardrail intervenes.
    pub fn response(&self) -> Option<&str> {
        self.get("response").and_then(Value::as_str)
    }

    pub fn description(&self) -> Option<&str> {
        self.get("description").and_then(Value::as_str)
    }

    pub fn status(&self) -> Option<i64> {
        self.get("status").and_then(Value::as_i64)
    }

    /// Templates without a status are treated as enabled.
    pub fn is_enabled(&self) -> bool {
        self.status().unwrap_or(STATUS_ENABLED) != STATUS_DISABLED
    }

    // ── Observation ──

    pub fn subscribe(&mut self, observer: impl RecordObserver + 'static) -> SubscriptionId {
        self.base.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.base.unsubscribe(id)
    }

    pub fn observer_count(&self) -> usize {
        self.base.observer_count()
    }

    // ── Projection ──

    /// Project the attributes into the typed template shape.
    pub fn to_template(&self) -> Result<ResponseTemplate, RecordError> {
        serde_json::from_value(Value::Object(self.attributes().clone())).map_err(RecordError::Shape)
    }
}

impl TryFrom<AttributeBag> for ResponseTemplateRecord {
    type Error = RecordError;

    fn try_from(attributes: AttributeBag) -> Result<Self, Self::Error> {
        Self::new(attributes, RecordOptions::default())
    }
}

/// Records compare by attribute values, not by instance.
impl PartialEq for ResponseTemplateRecord {
    fn eq(&self, other: &Self) -> bool {
        self.attributes() == other.attributes()
    }
}

impl Serialize for ResponseTemplateRecord {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.attributes().serialize(serializer)
    }
}

// ── Typed projection ───────────────────────────────────────────────

/// Typed view of a guardrail response template, as the backend defines it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResponseTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// Text returned when a guardrail blocks or alters content.
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `1` enabled, `0` disabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
}

impl ResponseTemplate {
    /// A new, unsaved template with only a response text.
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            id: None,
            response: response.into(),
            description: None,
            status: None,
            tenant_id: None,
            create_time: None,
            update_time: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_status(mut self, status: i64) -> Self {
        self.status = Some(status);
        self
    }

    /// Wire-format attribute bag for this template.
    pub fn to_attributes(&self) -> Result<AttributeBag, RecordError> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(RecordError::NotAnObject(json_type_name(&other))),
        }
    }

    /// Build an observable record from this template.
    pub fn into_record(self, options: RecordOptions) -> Result<ResponseTemplateRecord, RecordError> {
        ResponseTemplateRecord::new(self.to_attributes()?, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FnObserver, RecordEvent};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[test]
    fn attributes_are_copied_verbatim() {
        let input = json!({
            "id": "rt-1",
            "name": "Deny",
            "nested": {"a": [1, 2, 3]},
            "flag": false,
            "none": null
        });
        let record = ResponseTemplateRecord::from_json(input.clone()).unwrap();
        for (key, value) in input.as_object().unwrap() {
            assert_eq!(record.get(key), Some(value), "field {key}");
        }
        assert_eq!(record.id(), Some(RecordId::from("rt-1")));
    }

    #[test]
    fn empty_bag_has_no_fields_and_no_id() {
        let record = ResponseTemplateRecord::default();
        assert!(record.attributes().is_empty());
        assert_eq!(record.id(), None);
        assert!(record.is_new());
    }

    #[test]
    fn attributes_overwrite_defaults() {
        let options = RecordOptions::default()
            .with_default("status", json!(1))
            .with_default("description", json!(""));
        let record =
            ResponseTemplateRecord::from_json_with(json!({"status": 0}), options).unwrap();
        assert_eq!(record.status(), Some(0));
        assert_eq!(record.description(), Some(""));
        assert!(!record.is_enabled());
    }

    #[test]
    fn base_failure_propagates() {
        let options = RecordOptions::default().with_required("response");
        let err = ResponseTemplateRecord::from_json_with(json!({"id": 3}), options).unwrap_err();
        assert!(matches!(err, RecordError::MissingField(_)));
    }

    #[test]
    fn non_object_json_is_rejected() {
        let err = ResponseTemplateRecord::from_json(json!(["x"])).unwrap_err();
        assert!(matches!(err, RecordError::NotAnObject("array")));
    }

    #[test]
    fn equal_by_value_distinct_by_instance() {
        let input = json!({"id": 1, "response": "No."});
        let mut a = ResponseTemplateRecord::from_json(input.clone()).unwrap();
        let b = ResponseTemplateRecord::from_json(input).unwrap();
        assert_eq!(a, b);
        assert!(!a.same_instance(&b));
        assert!(a.same_instance(&a));
        assert!(!a.same_instance(&a.clone()));

        a.set("response", "Changed.");
        assert_ne!(a, b);
        assert_eq!(b.response(), Some("No."));
    }

    #[test]
    fn mutation_is_observed_before_set_returns() {
        let seen = Arc::new(Mutex::new(None));
        let s = seen.clone();

        let mut record = ResponseTemplateRecord::from_json(json!({"name": "Deny"})).unwrap();
        record.subscribe(FnObserver::new(move |event: &RecordEvent<'_>| {
            if let RecordEvent::FieldChanged { new, .. } = event {
                *s.lock().unwrap() = Some((*new).clone());
            }
        }));

        record.set("name", "Refuse");
        assert_eq!(*seen.lock().unwrap(), Some(json!("Refuse")));
        assert_eq!(record.get("name"), Some(&json!("Refuse")));
    }

    #[test]
    fn typed_accessors() {
        let record = ResponseTemplateRecord::from_json(json!({
            "response": "This request violates policy.",
            "description": "Default refusal",
            "status": 1
        }))
        .unwrap();
        assert_eq!(record.response(), Some("This request violates policy."));
        assert_eq!(record.description(), Some("Default refusal"));
        assert!(record.is_enabled());
        assert!(ResponseTemplateRecord::default().is_enabled());
    }

    #[test]
    fn projects_to_typed_template() {
        let record = ResponseTemplateRecord::from_json(json!({
            "id": 12,
            "response": "Blocked.",
            "status": 1,
            "tenantId": "1",
            "createTime": "2025-04-14T15:53:25Z",
            "extra": "ignored by the projection"
        }))
        .unwrap();

        let template = record.to_template().unwrap();
        assert_eq!(template.id, Some(RecordId::Int(12)));
        assert_eq!(template.response, "Blocked.");
        assert_eq!(template.tenant_id.as_deref(), Some("1"));
        assert!(template.create_time.is_some());
        assert!(template.update_time.is_none());
    }

    #[test]
    fn projection_requires_response() {
        let record = ResponseTemplateRecord::from_json(json!({"id": 1})).unwrap();
        assert!(matches!(record.to_template(), Err(RecordError::Shape(_))));
    }

    #[test]
    fn status_values_other_than_disabled_are_enabled() {
        let mut record = ResponseTemplateRecord::from_json(json!({"status": STATUS_ENABLED})).unwrap();
        assert!(record.is_enabled());
        record.set("status", STATUS_DISABLED);
        assert!(!record.is_enabled());
        record.set("status", 2);
        assert!(record.is_enabled());
        record.unset("status");
        assert!(record.is_enabled());
    }

    #[test]
    fn typed_template_into_record() {
        let record = ResponseTemplate::new("Not allowed.")
            .with_description("Short refusal")
            .with_status(STATUS_DISABLED)
            .into_record(RecordOptions::default())
            .unwrap();
        assert_eq!(record.response(), Some("Not allowed."));
        assert_eq!(record.get("description"), Some(&json!("Short refusal")));
        assert!(!record.has("id"));
        assert!(!record.is_enabled());
    }

    #[test]
    fn record_serializes_as_attributes() {
        let record = ResponseTemplateRecord::from_json(json!({"id": 2, "response": "x"})).unwrap();
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"id": 2, "response": "x"})
        );
    }
}
