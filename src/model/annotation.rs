//! Key/value annotations attached to models, entities and relations.

use serde::{Deserialize, Serialize};

/// Well-known annotation keys.
pub mod keys {
    /// Human readable model title; required before saving.
    pub const TITLE: &str = "title";
    /// Id of a user who edited the annotated object.
    pub const CONTRIBUTOR: &str = "contributor";
    /// Creation date, `YYYY-MM-DD`.
    pub const DATE: &str = "date";
    /// Free-text comment.
    pub const COMMENT: &str = "comment";
    /// Curation state of a model.
    pub const STATE: &str = "state";

    /// Keys reported by `all-model-meta`.
    pub const MODEL_META: [&str; 5] = [TITLE, CONTRIBUTOR, DATE, STATE, COMMENT];
}

/// A single key/value annotation.
///
/// Annotations are kept in ordered sets, so adding the same pair twice is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Annotation {
    /// Annotation property, e.g. `comment`.
    pub key: String,
    /// Annotation value.
    pub value: String,
}

impl Annotation {
    /// Creates an annotation.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Returns true if the key matches.
    #[must_use]
    pub fn has_key(&self, key: &str) -> bool {
        self.key == key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotations_order_by_key_then_value() {
        let mut set = std::collections::BTreeSet::new();
        set.insert(Annotation::new(keys::TITLE, "b"));
        set.insert(Annotation::new(keys::COMMENT, "z"));
        set.insert(Annotation::new(keys::TITLE, "a"));
        set.insert(Annotation::new(keys::TITLE, "a"));

        let keys: Vec<_> = set.iter().map(|a| (a.key.as_str(), a.value.as_str())).collect();
        assert_eq!(keys, vec![("comment", "z"), ("title", "a"), ("title", "b")]);
    }
}
