//! Identifier lookup collaborator for out-of-taxonomy terms.
//!
//! Gene products and other foreign identifiers (`UniProtKB:P12345`) are not
//! part of the background taxonomy. Before such an id may appear in an
//! expression, an [`IdentifierLookup`] has to vouch for it, optionally scoped
//! by the model's organism/taxon context.

use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// One match returned by a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupEntry {
    /// Canonical id.
    pub id: String,
    /// Label, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Kind of entity, e.g. `protein`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Taxon the entry belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxon: Option<String>,
}

impl LookupEntry {
    /// Entry with only an id.
    #[must_use]
    pub fn id_only(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            kind: None,
            taxon: None,
        }
    }
}

/// Resolves foreign identifiers. An empty answer means "unknown".
pub trait IdentifierLookup: Send + Sync {
    /// Looks up an id within an optional taxon context.
    fn lookup(&self, id: &str, taxon: Option<&str>) -> Vec<LookupEntry>;
}

/// Lookup that knows nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLookup;

impl IdentifierLookup for NoLookup {
    fn lookup(&self, _id: &str, _taxon: Option<&str>) -> Vec<LookupEntry> {
        Vec::new()
    }
}

/// Fixed table of known identifiers.
#[derive(Debug, Clone, Default)]
pub struct StaticLookup {
    entries: HashMap<String, Vec<LookupEntry>>,
}

impl StaticLookup {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entry.
    #[must_use]
    pub fn with_entry(mut self, entry: LookupEntry) -> Self {
        self.entries.entry(entry.id.clone()).or_default().push(entry);
        self
    }

    /// Registers a bare id valid in every taxon.
    #[must_use]
    pub fn with_id(self, id: &str) -> Self {
        self.with_entry(LookupEntry::id_only(id))
    }
}

impl IdentifierLookup for StaticLookup {
    fn lookup(&self, id: &str, taxon: Option<&str>) -> Vec<LookupEntry> {
        self.entries
            .get(id)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| match (taxon, e.taxon.as_deref()) {
                        (Some(wanted), Some(have)) => wanted == have,
                        _ => true,
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Accepts every identifier matching one of a set of patterns.
#[derive(Debug, Clone, Default)]
pub struct PatternLookup {
    patterns: Vec<Regex>,
}

impl PatternLookup {
    /// Compiles the patterns.
    ///
    /// # Errors
    /// Returns the first pattern that fails to compile.
    pub fn new<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }
}

impl IdentifierLookup for PatternLookup {
    fn lookup(&self, id: &str, taxon: Option<&str>) -> Vec<LookupEntry> {
        if self.patterns.iter().any(|p| p.is_match(id)) {
            vec![LookupEntry {
                taxon: taxon.map(str::to_string),
                ..LookupEntry::id_only(id)
            }]
        } else {
            Vec::new()
        }
    }
}
