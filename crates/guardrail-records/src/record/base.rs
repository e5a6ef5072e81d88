//! The base-record capability shared by every model.
//!
//! [`BaseRecord`] is composed into concrete records rather than inherited
//! from. It owns the attribute storage, applies the [`RecordOptions`],
//! derives the identifier, assigns the client id, and dispatches change
//! events to the [`ObserverRegistry`].
//!
//! Construction is two-phase: [`BaseRecord::initialize`] establishes the
//! base invariants first (defaults, required fields, schema, client id),
//! then the concrete record applies its own fields with [`BaseRecord::assign`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::AttributeBag;
use crate::error::RecordError;

use super::events::{ObserverRegistry, RecordEvent, RecordObserver, SubscriptionId};
use super::options::RecordOptions;

/// Process-wide source of client ids.
static NEXT_CID: AtomicU64 = AtomicU64::new(1);

fn next_cid() -> String {
    format!("c{}", NEXT_CID.fetch_add(1, Ordering::Relaxed))
}

// ── Identifier ─────────────────────────────────────────────────────

/// Server-assigned record identifier: an integer or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Str(String),
}

impl RecordId {
    /// Derive an id from an attribute value. Integers (including integral
    /// floats such as `1.0`) within the `i64` range and strings are ids.
    /// Anything else, larger integers included, is "no id".
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().or_else(|| integral_f64(n.as_f64()?)).map(Self::Int),
            Value::String(s) => Some(Self::Str(s.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Int(n) => Value::from(*n),
            Self::Str(s) => Value::from(s.as_str()),
        }
    }

    /// Parse user input: integers become `Int`, everything else `Str`.
    pub fn parse(input: &str) -> Self {
        match input.parse::<i64>() {
            Ok(n) => Self::Int(n),
            Err(_) => Self::Str(input.to_string()),
        }
    }
}

fn integral_f64(f: f64) -> Option<i64> {
    (f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64).then_some(f as i64)
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

// ── BaseRecord ─────────────────────────────────────────────────────

/// Attribute storage plus the shared model behaviors.
#[derive(Debug)]
pub struct BaseRecord {
    cid: String,
    attributes: AttributeBag,
    options: RecordOptions,
    observers: ObserverRegistry,
}

impl BaseRecord {
    /// Establish base invariants for a record about to be built from
    /// `attributes`.
    ///
    /// The returned record holds only the option defaults; the caller
    /// applies the attributes afterwards. Fails if the options are
    /// unusable, a required field is missing or null, or the merged view
    /// violates the configured schema.
    pub fn initialize(attributes: &AttributeBag, options: RecordOptions) -> Result<Self, RecordError> {
        if options.id_attribute.trim().is_empty() {
            return Err(RecordError::InvalidOptions(
                "id_attribute must not be empty".to_string(),
            ));
        }

        let mut merged = options.defaults.clone();
        merged.extend(attributes.iter().map(|(k, v)| (k.clone(), v.clone())));
        check_attributes(&merged, &options)?;

        let cid = next_cid();
        trace!(cid = %cid, defaults = options.defaults.len(), "Base record initialized");

        Ok(Self {
            cid,
            attributes: options.defaults.clone(),
            options,
            observers: ObserverRegistry::new(),
        })
    }

    /// Write a field without notifying observers. Used while a record is
    /// being constructed, before anyone can observe it.
    pub fn assign(&mut self, key: String, value: Value) {
        self.attributes.insert(key, value);
    }

    // ── Reads ──

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    pub fn attributes(&self) -> &AttributeBag {
        &self.attributes
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// Identifier derived from the configured id attribute.
    pub fn id(&self) -> Option<RecordId> {
        self.attributes
            .get(&self.options.id_attribute)
            .and_then(RecordId::from_value)
    }

    /// Process-unique instance id (`c1`, `c2`, ...).
    pub fn cid(&self) -> &str {
        &self.cid
    }

    pub fn options(&self) -> &RecordOptions {
        &self.options
    }

    // ── Writes ──

    /// Assign a field and notify observers. Returns `false` (and notifies
    /// nobody) when the field already holds an equal value.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> bool {
        let key = key.into();
        if self.attributes.get(&key) == Some(&value) {
            return false;
        }
        let old = self.attributes.insert(key.clone(), value);
        self.notify_changed(&key, old.as_ref());
        true
    }

    /// Remove a field and notify observers. Returns the removed value.
    pub fn unset(&mut self, key: &str) -> Option<Value> {
        let old = self.attributes.remove(key)?;
        self.observers.notify(&RecordEvent::FieldRemoved {
            cid: &self.cid,
            key,
            old: &old,
        });
        Some(old)
    }

    /// Apply several fields at once. Each changed field fires its own
    /// event, then a single `Updated` event lists them. Returns the
    /// changed field names in application order.
    pub fn update(&mut self, bag: AttributeBag) -> Vec<String> {
        let mut changed = Vec::new();
        for (key, value) in bag {
            if self.attributes.get(&key) == Some(&value) {
                continue;
            }
            let old = self.attributes.insert(key.clone(), value);
            self.notify_changed(&key, old.as_ref());
            changed.push(key);
        }
        if !changed.is_empty() {
            self.observers.notify(&RecordEvent::Updated {
                cid: &self.cid,
                changed: &changed,
            });
        }
        changed
    }

    fn notify_changed(&self, key: &str, old: Option<&Value>) {
        if let Some(new) = self.attributes.get(key) {
            self.observers.notify(&RecordEvent::FieldChanged {
                cid: &self.cid,
                key,
                old,
                new,
            });
        }
    }

    // ── Observation ──

    pub fn subscribe(&mut self, observer: impl RecordObserver + 'static) -> SubscriptionId {
        self.observers.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}

/// A clone is a new instance: fresh client id, same attributes and
/// options, no observers.
impl Clone for BaseRecord {
    fn clone(&self) -> Self {
        Self {
            cid: next_cid(),
            attributes: self.attributes.clone(),
            options: self.options.clone(),
            observers: ObserverRegistry::new(),
        }
    }
}

/// An empty record with default options.
impl Default for BaseRecord {
    fn default() -> Self {
        Self {
            cid: next_cid(),
            attributes: AttributeBag::new(),
            options: RecordOptions::default(),
            observers: ObserverRegistry::new(),
        }
    }
}

/// Check a complete attribute view against the `required` fields and the
/// schema of `options`. A null counts as missing.
pub fn check_attributes(attributes: &AttributeBag, options: &RecordOptions) -> Result<(), RecordError> {
    for field in &options.required {
        if matches!(attributes.get(field), None | Some(Value::Null)) {
            debug!(field = %field, "Required field missing");
            return Err(RecordError::MissingField(field.clone()));
        }
    }

    if let Some(schema) = &options.schema {
        validate_against_schema(schema, &Value::Object(attributes.clone()))?;
    }
    Ok(())
}

/// Validate `instance` against a JSON Schema, collecting every violation.
pub fn validate_against_schema(schema: &Value, instance: &Value) -> Result<(), RecordError> {
    let validator = jsonschema::validator_for(schema)
        .map_err(|e| RecordError::InvalidSchema(e.to_string()))?;

    let errors: Vec<String> = validator
        .iter_errors(instance)
        .map(|e| format!("{}: {e}", e.instance_path()))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        debug!(violations = errors.len(), "Schema validation failed");
        Err(RecordError::SchemaViolation(errors))
    }
}
