//! Convenience re-exports for common `guardrail-records` types.
//!
//! ```ignore
//! use guardrail_records::prelude::*;
//! ```
//!
//! Specialized types (the observer registry, the stateful field-observer
//! builder, page metadata) are left out; import those from their modules.

pub use crate::{AttributeBag, RecordError, json_schema_for, parse_value};

// ── Records ─────────────────────────────────────────────────────────
pub use crate::record::{
    BaseRecord, RecordId, RecordOptions, ResponseTemplate, ResponseTemplateRecord,
};

// ── Observers ───────────────────────────────────────────────────────
pub use crate::record::{
    CompositeObserver, FieldObserver, FnObserver, LoggingObserver, NoopObserver, RecordEvent,
    RecordObserver, SubscriptionId,
};

// ── Collections ─────────────────────────────────────────────────────
pub use crate::store::{TemplateStore, UpsertOutcome};
