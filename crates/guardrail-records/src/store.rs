//! Owning collection of response template records.
//!
//! [`TemplateStore`] is the parent store a presentation layer reads from.
//! It keeps records in insertion order, finds them by derived
//! [`RecordId`], and merges re-fetched attribute bags into the records it
//! already holds so their observers see the changes.
//!
//! Documents are plain JSON, either an array of attribute bags or the paged
//! envelope a list endpoint returns:
//!
//! ```json
//! { "content": [ { "id": 1, "response": "Blocked." } ],
//!   "totalElements": 1, "totalPages": 1, "number": 0, "size": 10 }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::AttributeBag;
use crate::error::{RecordError, json_type_name};
use crate::record::{RecordId, RecordOptions, ResponseTemplateRecord, check_attributes};

/// Pagination metadata carried by a paged envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageInfo {
    pub total_elements: Option<u64>,
    pub total_pages: Option<u64>,
    /// Zero-based page number.
    pub number: Option<u64>,
    pub size: Option<u64>,
}

/// What [`TemplateStore::upsert`] did with a bag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// A new record was appended at this index.
    Inserted(usize),
    /// An existing record was updated; lists the fields that changed.
    Merged { index: usize, changed: Vec<String> },
}

/// Records in insertion order, all built with the same options.
#[derive(Debug, Default)]
pub struct TemplateStore {
    options: RecordOptions,
    records: Vec<ResponseTemplateRecord>,
    page: Option<PageInfo>,
}

impl TemplateStore {
    pub fn new(options: RecordOptions) -> Self {
        Self {
            options,
            records: Vec::new(),
            page: None,
        }
    }

    /// Parse a document. Entries sharing an id are merged in order.
    pub fn from_json_str(json: &str, options: RecordOptions) -> Result<Self, RecordError> {
        let document: Value = serde_json::from_str(json)?;
        let (entries, page) = split_document(document)?;

        let mut store = Self::new(options);
        store.page = page;
        for entry in entries {
            match entry {
                Value::Object(bag) => {
                    store.upsert(bag)?;
                }
                other => return Err(RecordError::NotAnObject(json_type_name(&other))),
            }
        }
        debug!(records = store.len(), "Template document parsed");
        Ok(store)
    }

    /// Read a document from disk.
    pub fn load(path: impl AsRef<Path>, options: RecordOptions) -> Result<Self, RecordError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let store = Self::from_json_str(&json, options)?;
        info!(path = %path.display(), records = store.len(), "Loaded templates");
        Ok(store)
    }

    /// Serialize the records as a pretty JSON array. Page metadata is not
    /// written.
    pub fn to_json_string(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string_pretty(&self.records)?)
    }

    /// Atomic write: serialize to a temp file, then rename into place.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RecordError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "templates.json".to_string());
        let tmp_path = path.with_file_name(format!(".{file_name}.tmp"));

        std::fs::write(&tmp_path, self.to_json_string()?)?;
        std::fs::rename(&tmp_path, path)?;
        info!(path = %path.display(), records = self.len(), "Saved templates");
        Ok(())
    }

    // ── Mutation ──

    /// Merge a bag into the record with the same id, or append a new
    /// record. Bags without an id are always appended. A merge is checked
    /// against the store's required fields and schema before it is
    /// applied, so a failing bag leaves the record untouched.
    pub fn upsert(&mut self, bag: AttributeBag) -> Result<UpsertOutcome, RecordError> {
        let existing = bag
            .get(&self.options.id_attribute)
            .and_then(RecordId::from_value)
            .and_then(|id| self.position(&id));

        match existing {
            Some(index) => {
                let mut merged = self.records[index].attributes().clone();
                merged.extend(bag.iter().map(|(k, v)| (k.clone(), v.clone())));
                check_attributes(&merged, &self.options)?;

                let changed = self.records[index].update(bag);
                debug!(index, changed = changed.len(), "Merged template");
                Ok(UpsertOutcome::Merged { index, changed })
            }
            None => {
                let record = ResponseTemplateRecord::new(bag, self.options.clone())?;
                self.records.push(record);
                Ok(UpsertOutcome::Inserted(self.records.len() - 1))
            }
        }
    }

    /// Upsert each bag in order, as after a re-fetch. Stops at the first
    /// construction failure; bags before it stay applied.
    pub fn merge_all(
        &mut self,
        bags: impl IntoIterator<Item = AttributeBag>,
    ) -> Result<Vec<UpsertOutcome>, RecordError> {
        bags.into_iter().map(|bag| self.upsert(bag)).collect()
    }

    pub fn remove(&mut self, id: &RecordId) -> Option<ResponseTemplateRecord> {
        let index = self.position(id)?;
        debug!(id = %id, "Removed template");
        Some(self.records.remove(index))
    }

    // ── Reads ──

    /// Index of the first record with this id. Ids are not kept unique:
    /// writing `id` through [`get_mut`](Self::get_mut) can give two records
    /// the same one, and lookups then resolve to the earlier record.
    pub fn position(&self, id: &RecordId) -> Option<usize> {
        self.records
            .iter()
            .position(|r| r.id().as_ref() == Some(id))
    }

    pub fn get(&self, id: &RecordId) -> Option<&ResponseTemplateRecord> {
        self.position(id).map(|i| &self.records[i])
    }

    pub fn get_mut(&mut self, id: &RecordId) -> Option<&mut ResponseTemplateRecord> {
        let index = self.position(id)?;
        self.records.get_mut(index)
    }

    /// Find a record from user-typed id text. Numeric text matches an
    /// integer id first, then a string id with the same text.
    pub fn lookup(&self, input: &str) -> Option<&ResponseTemplateRecord> {
        self.lookup_position(input).map(|i| &self.records[i])
    }

    pub fn lookup_mut(&mut self, input: &str) -> Option<&mut ResponseTemplateRecord> {
        let index = self.lookup_position(input)?;
        self.records.get_mut(index)
    }

    fn lookup_position(&self, input: &str) -> Option<usize> {
        match RecordId::parse(input) {
            id @ RecordId::Int(_) => self
                .position(&id)
                .or_else(|| self.position(&RecordId::Str(input.to_string()))),
            id => self.position(&id),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResponseTemplateRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Page metadata from the last loaded envelope, if any.
    pub fn page(&self) -> Option<&PageInfo> {
        self.page.as_ref()
    }

    pub fn options(&self) -> &RecordOptions {
        &self.options
    }
}

impl<'a> IntoIterator for &'a TemplateStore {
    type Item = &'a ResponseTemplateRecord;
    type IntoIter = std::slice::Iter<'a, ResponseTemplateRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Split a document into its entries and optional page metadata.
fn split_document(document: Value) -> Result<(Vec<Value>, Option<PageInfo>), RecordError> {
    match document {
        Value::Array(entries) => Ok((entries, None)),
        Value::Object(mut envelope) => match envelope.remove("content") {
            Some(Value::Array(entries)) => {
                let page: PageInfo = serde_json::from_value(Value::Object(envelope))?;
                Ok((entries, Some(page)))
            }
            Some(other) => Err(RecordError::InvalidDocument(format!(
                "\"content\" must be an array, found {}",
                json_type_name(&other)
            ))),
            None => Err(RecordError::InvalidDocument(
                "object document has no \"content\" array".to_string(),
            )),
        },
        other => Err(RecordError::InvalidDocument(format!(
            "expected an array or a paged object, found {}",
            json_type_name(&other)
        ))),
    }
}
