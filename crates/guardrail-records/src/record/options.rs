//! Construction options forwarded to [`BaseRecord::initialize`](super::BaseRecord::initialize).
//!
//! A record never interprets its options; the base record does. Everything
//! has a usable default, so `RecordOptions::default()` is the common case.
//!
//! # Examples
//!
//! Builder methods for the usual settings:
//!
//! ```
//! use guardrail_records::record::RecordOptions;
//! use serde_json::json;
//!
//! let options = RecordOptions::default()
//!     .with_default("status", json!(1))
//!     .with_required("response");
//! assert_eq!(options.id_attribute, "id");
//! ```
//!
//! Loading from a JSON file (all keys optional):
//!
//! ```json
//! { "id_attribute": "id", "defaults": { "status": 1 }, "required": ["response"] }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RecordError;
use crate::record::ResponseTemplate;
use crate::{AttributeBag, json_schema_for};

/// Default name of the attribute that carries the server identifier.
pub const DEFAULT_ID_ATTRIBUTE: &str = "id";

/// Options recognized by the base record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordOptions {
    /// Attribute the record identifier is derived from. Default: `"id"`.
    pub id_attribute: String,
    /// Values seeded before the attribute bag is applied. Same-named
    /// attributes overwrite them.
    pub defaults: AttributeBag,
    /// Fields that must be present and non-null after defaults are applied.
    pub required: Vec<String>,
    /// Optional JSON Schema the merged attributes must satisfy.
    pub schema: Option<serde_json::Value>,
}

impl Default for RecordOptions {
    fn default() -> Self {
        Self {
            id_attribute: DEFAULT_ID_ATTRIBUTE.to_string(),
            defaults: AttributeBag::new(),
            required: Vec::new(),
            schema: None,
        }
    }
}

impl RecordOptions {
    /// Use a different attribute as the record identifier.
    pub fn with_id_attribute(mut self, name: impl Into<String>) -> Self {
        self.id_attribute = name.into();
        self
    }

    /// Add a single default value.
    pub fn with_default(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.defaults.insert(key.into(), value);
        self
    }

    /// Replace all defaults.
    pub fn with_defaults(mut self, defaults: AttributeBag) -> Self {
        self.defaults = defaults;
        self
    }

    /// Require a field to be present and non-null.
    pub fn with_required(mut self, key: impl Into<String>) -> Self {
        self.required.push(key.into());
        self
    }

    /// Validate attributes against a JSON Schema at construction.
    pub fn with_schema(mut self, schema: serde_json::Value) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Validate attributes against the [`ResponseTemplate`] schema.
    pub fn with_template_schema(self) -> Self {
        self.with_schema(json_schema_for::<ResponseTemplate>())
    }

    /// Load options from a JSON file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RecordError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
