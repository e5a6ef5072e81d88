//! Error type for record construction, projection, and document I/O.
//!
//! [`ResponseTemplateRecord`](crate::record::ResponseTemplateRecord) raises
//! nothing on its own. Every variant here originates in the base-record
//! initialization, the typed projection, or the [`TemplateStore`](crate::store::TemplateStore).

use thiserror::Error;

/// Error type for guardrail-records operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RecordError {
    /// The construction options cannot be used (e.g. empty id attribute).
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// A field listed in `RecordOptions::required` is absent or null.
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// The configured JSON Schema does not compile.
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// The attributes do not satisfy the configured JSON Schema.
    #[error("Schema violation: {}", .0.join("; "))]
    SchemaViolation(Vec<String>),

    /// The attribute bag does not fit the typed template shape.
    #[error("Template shape error: {0}")]
    Shape(#[source] serde_json::Error),

    /// A JSON value that must be an object was something else.
    #[error("Expected a JSON object, found {0}")]
    NotAnObject(&'static str),

    /// A template document is neither an array nor a paged envelope.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// A JSON document could not be parsed or serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An I/O error while reading or writing a document.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Name of a JSON value's type, for error messages.
pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn schema_violation_joins_messages() {
        let err = RecordError::SchemaViolation(vec!["/a: bad".into(), "/b: worse".into()]);
        assert_eq!(err.to_string(), "Schema violation: /a: bad; /b: worse");
    }

    #[test]
    fn json_type_names() {
        assert_eq!(json_type_name(&json!(null)), "null");
        assert_eq!(json_type_name(&json!([1])), "array");
        assert_eq!(json_type_name(&json!("x")), "string");
        assert_eq!(json_type_name(&json!({})), "object");
    }
}
