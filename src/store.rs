//! Stored field values, kept alongside the inverted index for hydrating
//! search results.

pub mod document;

pub use document::{DocumentStore, StoredDocument, StoredFields};
