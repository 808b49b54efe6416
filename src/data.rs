use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{LucerneError, Result};

/// How a field takes part in indexing and storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    /// Whether the field contributes terms to the inverted index.
    pub indexed: bool,

    /// Whether the value runs through the analyzer. An indexed field that is
    /// not tokenized is indexed as a single verbatim term.
    pub tokenized: bool,

    /// Whether the original value is kept in the document store.
    pub stored: bool,
}

impl FieldOption {
    /// Analyzed full-text field.
    pub fn text(stored: bool) -> Self {
        Self {
            indexed: true,
            tokenized: true,
            stored,
        }
    }

    /// Exact-match field indexed as one term (ids, codes, tags).
    pub fn string(stored: bool) -> Self {
        Self {
            indexed: true,
            tokenized: false,
            stored,
        }
    }

    /// Retrievable but not searchable.
    pub fn stored_only() -> Self {
        Self {
            indexed: false,
            tokenized: false,
            stored: true,
        }
    }
}

impl Default for FieldOption {
    fn default() -> Self {
        Self::text(true)
    }
}

/// A field value together with its indexing options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub value: String,
    pub option: FieldOption,
}

impl Field {
    pub fn new(value: impl Into<String>, option: FieldOption) -> Self {
        Self {
            value: value.into(),
            option,
        }
    }
}

/// A document submitted to the index writer.
///
/// A document is identified by a unique string id and owns a set of named
/// fields. Once indexed it is immutable; updating means deleting and
/// re-adding it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: BTreeMap<String, Field>,
}

impl Document {
    /// Create an empty document with a random (UUID v4) id.
    pub fn new() -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string())
    }

    /// Create an empty document with the given id.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Add a field with explicit options.
    pub fn add_field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    /// Add an analyzed text field.
    pub fn add_text(self, name: impl Into<String>, value: impl Into<String>, stored: bool) -> Self {
        self.add_field(name, Field::new(value, FieldOption::text(stored)))
    }

    /// Add a field indexed verbatim as one term.
    pub fn add_string(
        self,
        name: impl Into<String>,
        value: impl Into<String>,
        stored: bool,
    ) -> Self {
        self.add_field(name, Field::new(value, FieldOption::string(stored)))
    }

    /// Add a field that is only stored.
    pub fn add_stored(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_field(name, Field::new(value, FieldOption::stored_only()))
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Check the id and the flag consistency of every field.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(LucerneError::invalid_argument("document id must not be empty"));
        }
        for (name, field) in &self.fields {
            if name.is_empty() {
                return Err(LucerneError::invalid_argument(format!(
                    "document {} has a field with an empty name",
                    self.id
                )));
            }
            if !field.option.indexed && !field.option.stored {
                return Err(LucerneError::invalid_argument(format!(
                    "field {name} of document {} is neither indexed nor stored",
                    self.id
                )));
            }
            if field.option.tokenized && !field.option.indexed {
                return Err(LucerneError::invalid_argument(format!(
                    "field {name} of document {} is tokenized but not indexed",
                    self.id
                )));
            }
        }
        Ok(())
    }

    /// The stored subset of this document.
    pub fn stored_fields(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .filter(|(_, field)| field.option.stored)
            .map(|(name, field)| (name.clone(), field.value.clone()))
            .collect()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
