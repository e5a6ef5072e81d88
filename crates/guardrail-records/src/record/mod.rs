//! Observable records and the base-record capability they compose.
//!
//! # Architecture
//!
//! ```text
//! data-access layer ──attribute bag──▶ ResponseTemplateRecord ──events──▶ observers
//!                                        └── embeds BaseRecord
//! ```
//!
//! A record is built from an [`AttributeBag`](crate::AttributeBag) and a set
//! of [`RecordOptions`]. The embedded [`BaseRecord`] establishes defaults,
//! required fields, optional schema validation, and a client id; the record
//! then copies its attributes on top. Writes go through
//! [`set`](ResponseTemplateRecord::set) / [`update`](ResponseTemplateRecord::update)
//! so every change reaches the subscribed [`RecordObserver`]s.

mod base;
mod events;
mod options;
mod template;

pub use base::{BaseRecord, RecordId, check_attributes, validate_against_schema};
pub use events::{
    CompositeObserver, FieldObserver, FnObserver, LoggingObserver, NoopObserver, ObserverRegistry,
    RecordEvent, RecordObserver, StatefulFieldBuilder, SubscriptionId,
};
pub use options::{DEFAULT_ID_ATTRIBUTE, RecordOptions};
pub use template::{ResponseTemplate, ResponseTemplateRecord, STATUS_DISABLED, STATUS_ENABLED};
