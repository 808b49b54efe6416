//! Field-qualified terms.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A normalized token bound to the field it was indexed in.
///
/// Ordering is by field first, then text, which is also the order of the
/// term dictionary inside a segment file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Term {
    field: String,
    text: String,
}

impl Term {
    pub fn new(field: impl Into<String>, text: impl Into<String>) -> Self {
        Term {
            field: field.into(),
            text: text.into(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ahash::AHashSet;

    #[test]
    fn test_equal_terms_hash_equal() {
        let mut set = AHashSet::new();
        set.insert(Term::new("name", "饭店"));
        assert!(set.contains(&Term::new("name", "饭店")));
        assert!(!set.contains(&Term::new("addr", "饭店")));
    }

    #[test]
    fn test_order_is_field_then_text() {
        let mut terms = vec![
            Term::new("name", "a"),
            Term::new("addr", "z"),
            Term::new("addr", "b"),
        ];
        terms.sort();
        assert_eq!(terms[0], Term::new("addr", "b"));
        assert_eq!(terms[2].to_string(), "name:a");
    }
}
