//! Document store — schema-flexible JSON collections.
//!
//! The authoritative store holds plain JSON documents grouped into named
//! collections. [`JsonDocumentStore`] keeps collections in insertion order
//! (queries are deterministic across runs) and persists the whole store as a
//! single JSON file with an atomic `.tmp` + rename write: the file is either
//! fully replaced or left intact.
//!
//! Collections consumed by the reconciliation engine:
//! [`collections::TEAMS`], [`collections::MEMBERSHIPS`],
//! [`collections::USER_ROLES`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{io_err, StoreError};

/// Collection names used by the role-reconciliation documents.
pub mod collections {
    /// Teams: `_id`, `created_by`.
    pub const TEAMS: &str = "teams";
    /// Memberships: `user_id`, `team_id`.
    pub const MEMBERSHIPS: &str = "memberships";
    /// Role records: `_id`, `user_id`, `team_id`, `role_name`, `scope`,
    /// `is_active`, `created_by`, `created_at`.
    pub const USER_ROLES: &str = "user_roles";
}

/// Field that carries the store-assigned document identifier.
pub const ID_FIELD: &str = "_id";

/// A single JSON document.
pub type Document = serde_json::Map<String, Value>;

/// An equality filter: a document matches when every filter field is
/// present with an equal value.
pub type Filter = serde_json::Map<String, Value>;

/// Build a [`Document`] (or [`Filter`]) from field/value pairs.
pub fn fields<const N: usize>(pairs: [(&str, Value); N]) -> Document {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_owned(), value))
        .collect()
}

/// Uniform read/write interface over the document store.
pub trait DocumentStore {
    /// All documents in `collection` matching `filter`, in insertion order.
    fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError>;

    /// Insert one document, assigning an `_id` if absent. Returns the id.
    fn insert_one(&mut self, collection: &str, doc: Document) -> Result<String, StoreError>;

    /// Delete the first document matching `filter`. Returns whether one
    /// was deleted.
    fn delete_one(&mut self, collection: &str, filter: &Filter) -> Result<bool, StoreError>;

    /// Set each field of `patch` on the first document matching `filter`.
    /// Returns whether a document was updated.
    fn update_one(
        &mut self,
        collection: &str,
        filter: &Filter,
        patch: Document,
    ) -> Result<bool, StoreError>;
}

// ---------------------------------------------------------------------------
// JsonDocumentStore
// ---------------------------------------------------------------------------

/// On-disk payload of the store.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    collections: BTreeMap<String, Vec<Document>>,
}

/// JSON-file-backed document store.
///
/// Every mutation is written through to disk before it returns, so a crash
/// between actions never loses committed documents. `in_memory()` skips
/// persistence entirely for tests.
#[derive(Debug)]
pub struct JsonDocumentStore {
    path: Option<PathBuf>,
    collections: BTreeMap<String, Vec<Document>>,
}

impl JsonDocumentStore {
    /// Open the store at `path`, loading existing content if present.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let collections = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
            serde_json::from_str::<StoreFile>(&contents)?.collections
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path: Some(path),
            collections,
        })
    }

    /// A store with no backing file. Mutations stay in memory.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            collections: BTreeMap::new(),
        }
    }

    fn matches(doc: &Document, filter: &Filter) -> bool {
        filter
            .iter()
            .all(|(key, value)| doc.get(key) == Some(value))
    }

    fn save(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        let payload = StoreFile {
            collections: self.collections.clone(),
        };
        let json = serde_json::to_string_pretty(&payload)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
        std::fs::rename(&tmp, path).map_err(|e| io_err(path, e))?;
        Ok(())
    }
}

impl DocumentStore for JsonDocumentStore {
    fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        let docs = match self.collections.get(collection) {
            Some(docs) => docs
                .iter()
                .filter(|doc| Self::matches(doc, filter))
                .cloned()
                .collect(),
            None => Vec::new(),
        };
        Ok(docs)
    }

    fn insert_one(&mut self, collection: &str, mut doc: Document) -> Result<String, StoreError> {
        let id = match doc.get(ID_FIELD).and_then(Value::as_str) {
            Some(existing) => existing.to_owned(),
            None => {
                let generated = Uuid::new_v4().simple().to_string();
                doc.insert(ID_FIELD.to_owned(), Value::String(generated.clone()));
                generated
            }
        };
        self.collections
            .entry(collection.to_owned())
            .or_default()
            .push(doc);
        self.save()?;
        Ok(id)
    }

    fn delete_one(&mut self, collection: &str, filter: &Filter) -> Result<bool, StoreError> {
        let Some(docs) = self.collections.get_mut(collection) else {
            return Ok(false);
        };
        let Some(index) = docs.iter().position(|doc| Self::matches(doc, filter)) else {
            return Ok(false);
        };
        docs.remove(index);
        self.save()?;
        Ok(true)
    }

    fn update_one(
        &mut self,
        collection: &str,
        filter: &Filter,
        patch: Document,
    ) -> Result<bool, StoreError> {
        let Some(docs) = self.collections.get_mut(collection) else {
            return Ok(false);
        };
        let Some(doc) = docs.iter_mut().find(|doc| Self::matches(doc, filter)) else {
            return Ok(false);
        };
        for (key, value) in patch {
            doc.insert(key, value);
        }
        self.save()?;
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
