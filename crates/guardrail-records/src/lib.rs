//! Observable guardrail response template records.
//!
//! `guardrail-records` models the guardrail response template as a client
//! application sees it: a record built from an untyped attribute bag,
//! carrying shared base-record behavior (identifier derivation, defaults,
//! optional validation) and notifying observers of every change so a
//! presentation layer can stay in sync.
//!
//! # Getting started
//!
//! ```
//! use std::sync::{Arc, Mutex};
//!
//! use guardrail_records::prelude::*;
//! use serde_json::json;
//!
//! let mut record = ResponseTemplateRecord::from_json(json!({
//!     "id": 1,
//!     "response": "This request violates the content policy.",
//!     "status": 1
//! }))?;
//!
//! // Bind a view to the `response` field.
//! let renders = Arc::new(Mutex::new(0u32));
//! let r = renders.clone();
//! record.subscribe(FieldObserver::new().on("response", move |_| *r.lock().unwrap() += 1));
//!
//! record.set("response", "Blocked by policy.");
//! assert_eq!(*renders.lock().unwrap(), 1);
//!
//! let typed = record.to_template()?;
//! assert_eq!(typed.response, "Blocked by policy.");
//! # Ok::<(), guardrail_records::RecordError>(())
//! ```
//!
//! # Where to find things
//!
//! - **Build and mutate a record:** [`ResponseTemplateRecord`](record::ResponseTemplateRecord),
//!   configured with [`RecordOptions`](record::RecordOptions).
//! - **Shared model behavior:** [`BaseRecord`](record::BaseRecord), which
//!   every record embeds.
//! - **React to changes:** implement [`RecordObserver`](record::RecordObserver)
//!   or use [`FnObserver`](record::FnObserver),
//!   [`FieldObserver`](record::FieldObserver),
//!   [`CompositeObserver`](record::CompositeObserver), and
//!   [`LoggingObserver`](record::LoggingObserver).
//! - **Typed fields:** [`ResponseTemplate`](record::ResponseTemplate) and
//!   its schema via [`json_schema_for`].
//! - **Hold many records:** [`TemplateStore`](store::TemplateStore).

pub mod error;
pub mod prelude;
pub mod record;
pub mod store;

use schemars::JsonSchema;

pub use error::RecordError;

// Re-export schemars for downstream crates.
pub use schemars;

/// Untyped field-name → value mapping a record is built from.
pub type AttributeBag = serde_json::Map<String, serde_json::Value>;

/// Generate a JSON Schema `serde_json::Value` from a type that implements
/// `schemars::JsonSchema`.
///
/// # Example
///
/// ```
/// use guardrail_records::json_schema_for;
/// use guardrail_records::record::ResponseTemplate;
///
/// let schema = json_schema_for::<ResponseTemplate>();
/// assert_eq!(schema["type"], "object");
/// assert!(schema["required"].as_array().unwrap().contains(&"response".into()));
/// ```
pub fn json_schema_for<T: JsonSchema>() -> serde_json::Value {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(schema)
        .unwrap_or_else(|_| serde_json::json!({"type": "object", "properties": {}}))
}

/// Parse user-supplied text as a JSON value, falling back to a plain
/// string when it is not valid JSON.
///
/// ```
/// use guardrail_records::parse_value;
/// use serde_json::json;
///
/// assert_eq!(parse_value("1"), json!(1));
/// assert_eq!(parse_value("Blocked."), json!("Blocked."));
/// ```
pub fn parse_value(input: &str) -> serde_json::Value {
    serde_json::from_str(input).unwrap_or_else(|_| serde_json::Value::String(input.to_string()))
}
