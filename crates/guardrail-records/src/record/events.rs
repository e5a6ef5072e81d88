//! Change events, observers, and the per-record observer registry.
//!
//! Every effective write to a record produces a [`RecordEvent`] that is
//! delivered synchronously to each subscribed [`RecordObserver`], in
//! subscription order, before the write returns. Writing a value equal to
//! the current one is not a change and produces no event.
//!
//! # Choosing an observer
//!
//! | Observer | Use case |
//! |----------|----------|
//! | [`NoopObserver`] | Tests, placeholders |
//! | [`LoggingObserver`] | Structured logging via `tracing` |
//! | [`FnObserver`] | Quick closures for simple callbacks |
//! | [`FieldObserver`] | Per-field callbacks (e.g. re-render on `response`) |
//! | [`CompositeObserver`] | Compose multiple observers in order |
//! | Custom `impl RecordObserver` | Full control (view models, caches) |

use std::fmt;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::{debug, trace};

// ── Events ─────────────────────────────────────────────────────────

/// A change applied to a record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecordEvent<'a> {
    /// A field was assigned a new value. `old` is `None` when the field
    /// did not exist before.
    FieldChanged {
        cid: &'a str,
        key: &'a str,
        old: Option<&'a Value>,
        new: &'a Value,
    },
    /// A field was removed.
    FieldRemoved {
        cid: &'a str,
        key: &'a str,
        old: &'a Value,
    },
    /// A batch update finished. Fired once, after the per-field events,
    /// and only when at least one field changed.
    Updated { cid: &'a str, changed: &'a [String] },
}

impl RecordEvent<'_> {
    /// Client id of the record that changed.
    pub fn cid(&self) -> &str {
        match self {
            Self::FieldChanged { cid, .. }
            | Self::FieldRemoved { cid, .. }
            | Self::Updated { cid, .. } => *cid,
        }
    }

    /// The affected field, for single-field events.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::FieldChanged { key, .. } | Self::FieldRemoved { key, .. } => Some(*key),
            Self::Updated { .. } => None,
        }
    }
}

// ── Observer trait ─────────────────────────────────────────────────

/// Observer of record changes.
///
/// Implement this to keep a presentation layer, cache, or audit trail in
/// sync with a record. Observers are `Send + Sync` so their state can be
/// shared through `Arc<Mutex<_>>`; dispatch still happens on the thread
/// that performs the write.
///
/// # Example
///
/// ```
/// use guardrail_records::record::{RecordEvent, RecordObserver};
///
/// struct PrintObserver;
///
/// impl RecordObserver for PrintObserver {
///     fn on_event(&self, event: &RecordEvent<'_>) {
///         if let RecordEvent::FieldChanged { key, new, .. } = event {
///             println!("{key} = {new}");
///         }
///     }
/// }
/// ```
pub trait RecordObserver: Send + Sync {
    /// Called once per change event.
    fn on_event(&self, event: &RecordEvent<'_>) {
        let _ = event;
    }
}

/// Observer that ignores every event.
pub struct NoopObserver;
impl RecordObserver for NoopObserver {}

/// An observer backed by a closure.
///
/// ```
/// use guardrail_records::record::{FnObserver, RecordEvent};
///
/// let observer = FnObserver::new(|event: &RecordEvent<'_>| {
///     println!("changed: {:?}", event.key());
/// });
/// ```
pub struct FnObserver<F>(F)
where
    F: Fn(&RecordEvent<'_>) + Send + Sync;

impl<F> FnObserver<F>
where
    F: Fn(&RecordEvent<'_>) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> RecordObserver for FnObserver<F>
where
    F: Fn(&RecordEvent<'_>) + Send + Sync,
{
    fn on_event(&self, event: &RecordEvent<'_>) {
        (self.0)(event);
    }
}

/// An observer that forwards each event to several inner observers, in
/// registration order.
///
/// ```
/// use guardrail_records::record::{CompositeObserver, LoggingObserver, NoopObserver};
///
/// let observer = CompositeObserver::new()
///     .with(LoggingObserver)
///     .with_if(false, NoopObserver);
/// assert_eq!(observer.len(), 1);
/// ```
pub struct CompositeObserver {
    observers: Vec<Box<dyn RecordObserver>>,
}

impl CompositeObserver {
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    /// Add an observer to the chain.
    pub fn with(mut self, observer: impl RecordObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    /// Conditionally add an observer. `false` is a no-op.
    pub fn with_if(self, condition: bool, observer: impl RecordObserver + 'static) -> Self {
        if condition { self.with(observer) } else { self }
    }

    /// Add an observer from an `Option`. `None` is a no-op.
    pub fn with_opt(self, observer: Option<impl RecordObserver + 'static>) -> Self {
        match observer {
            Some(o) => self.with(o),
            None => self,
        }
    }

    /// Number of inner observers.
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl Default for CompositeObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordObserver for CompositeObserver {
    fn on_event(&self, event: &RecordEvent<'_>) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }
}

/// Boxed callback for a single field. Receives the new value, or `None`
/// when the field was removed.
type FieldCallback = Box<dyn Fn(Option<&Value>) + Send + Sync>;

/// An observer that dispatches single-field events to per-field callbacks.
///
/// Batch `Updated` events are ignored; the per-field events that precede
/// them already reach the callbacks.
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use guardrail_records::record::FieldObserver;
///
/// #[derive(Default)]
/// struct View { renders: u32 }
///
/// let view = Arc::new(Mutex::new(View::default()));
/// let observer = FieldObserver::with_state(view.clone())
///     .on("response", |v, _value| v.renders += 1)
///     .build();
/// ```
pub struct FieldObserver {
    callbacks: Vec<(String, FieldCallback)>,
}

impl FieldObserver {
    pub fn new() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }

    /// Register a callback for a field. Several callbacks may watch the
    /// same field; all of them fire.
    pub fn on(
        mut self,
        field: impl Into<String>,
        callback: impl Fn(Option<&Value>) + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.push((field.into(), Box::new(callback)));
        self
    }

    /// Start a builder whose callbacks all share one `Arc<Mutex<S>>`.
    pub fn with_state<S: Send + 'static>(state: Arc<Mutex<S>>) -> StatefulFieldBuilder<S> {
        StatefulFieldBuilder {
            state,
            observer: FieldObserver::new(),
        }
    }
}

impl Default for FieldObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordObserver for FieldObserver {
    fn on_event(&self, event: &RecordEvent<'_>) {
        let (key, value) = match event {
            RecordEvent::FieldChanged { key, new, .. } => (*key, Some(*new)),
            RecordEvent::FieldRemoved { key, .. } => (*key, None),
            RecordEvent::Updated { .. } => return,
        };
        for (field, callback) in &self.callbacks {
            if field == key {
                callback(value);
            }
        }
    }
}

/// Builder for a [`FieldObserver`] with shared state.
///
/// Created by [`FieldObserver::with_state`]. Each callback receives the
/// locked state and the new field value.
pub struct StatefulFieldBuilder<S: Send + 'static> {
    state: Arc<Mutex<S>>,
    observer: FieldObserver,
}

impl<S: Send + 'static> StatefulFieldBuilder<S> {
    /// Register a callback for a field.
    pub fn on(
        mut self,
        field: impl Into<String>,
        callback: impl Fn(&mut S, Option<&Value>) + Send + Sync + 'static,
    ) -> Self {
        let state = self.state.clone();
        self.observer = self.observer.on(field, move |value: Option<&Value>| {
            if let Ok(mut s) = state.lock() {
                callback(&mut s, value);
            }
        });
        self
    }

    pub fn build(self) -> FieldObserver {
        self.observer
    }
}

/// An observer that logs events via `tracing`.
pub struct LoggingObserver;

impl RecordObserver for LoggingObserver {
    fn on_event(&self, event: &RecordEvent<'_>) {
        match event {
            RecordEvent::FieldChanged { cid, key, old, new } => {
                debug!(cid = *cid, field = *key, "Field changed");
                let old = old.map_or_else(|| "<unset>".to_string(), |v| v.to_string());
                trace!("{cid}.{key}: {old} -> {new}");
            }
            RecordEvent::FieldRemoved { cid, key, .. } => {
                debug!(cid = *cid, field = *key, "Field removed");
            }
            RecordEvent::Updated { cid, changed } => {
                debug!(cid = *cid, count = changed.len(), "Record updated: {}", changed.join(", "));
            }
        }
    }
}

// ── Registry ───────────────────────────────────────────────────────

/// Handle returned by a subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Ordered set of observers attached to one record.
#[derive(Default)]
pub struct ObserverRegistry {
    next_id: u64,
    observers: Vec<(SubscriptionId, Box<dyn RecordObserver>)>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an observer. Ids are never reused within a registry.
    pub fn subscribe(&mut self, observer: impl RecordObserver + 'static) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Detach an observer. Returns `false` if the id is unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sid, _)| *sid != id);
        self.observers.len() != before
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Deliver an event to every observer in subscription order.
    pub fn notify(&self, event: &RecordEvent<'_>) {
        for (_, observer) in &self.observers {
            observer.on_event(event);
        }
    }
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observers", &self.observers.len())
            .finish()
    }
}
