//! # rolemend-store
//!
//! The two backing stores behind the reconciliation engine: a JSON document
//! store (authoritative) and a SQLite relational projection. The engine only
//! sees the [`DocumentStore`] and [`RelationalStore`] traits, so the physical
//! backends can be swapped without touching reconciliation logic.

pub mod document;
pub mod error;
pub mod relational;

pub use document::{collections, fields, Document, DocumentStore, Filter, JsonDocumentStore};
pub use error::StoreError;
pub use relational::{RelationalStore, RoleRow, SqliteRoleStore};
