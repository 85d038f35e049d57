//! Entities (individuals) and relations (facts) of a model.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::expression::{Expression, TermId};

use super::{Annotation, ModelId};

/// Identifier of an entity, scoped to one model.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Wraps an existing id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh id under the given model.
    #[must_use]
    pub fn generate(model: &ModelId) -> Self {
        Self(format!("{model}/{}", Uuid::new_v4().simple()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A node of a model.
///
/// `types` holds every asserted type expression; both sets are unordered
/// in meaning and kept sorted for deterministic output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Stable id within the model.
    pub id: EntityId,
    /// Asserted type expressions.
    #[serde(default)]
    pub types: BTreeSet<Expression>,
    /// Entity annotations.
    #[serde(default)]
    pub annotations: BTreeSet<Annotation>,
}

impl Entity {
    /// Creates an untyped, unannotated entity.
    #[must_use]
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            types: BTreeSet::new(),
            annotations: BTreeSet::new(),
        }
    }

    /// Returns true if any type expression mentions the term.
    #[must_use]
    pub fn mentions(&self, term: &str) -> bool {
        self.types.iter().any(|t| t.mentions(term))
    }
}

/// Identity of a relation: one typed, directed edge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RelationKey {
    /// Source entity.
    pub subject: EntityId,
    /// Relation (object property) id.
    pub predicate: TermId,
    /// Target entity.
    pub object: EntityId,
}

impl RelationKey {
    /// Creates a key.
    #[must_use]
    pub fn new(subject: EntityId, predicate: TermId, object: EntityId) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// Returns true if either endpoint is the entity.
    #[must_use]
    pub fn touches(&self, entity: &EntityId) -> bool {
        &self.subject == entity || &self.object == entity
    }
}

impl fmt::Display for RelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)
    }
}

/// A relation together with its annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    /// Edge identity.
    #[serde(flatten)]
    pub key: RelationKey,
    /// Edge annotations.
    #[serde(default)]
    pub annotations: BTreeSet<Annotation>,
}

impl Relation {
    /// Creates an unannotated relation.
    #[must_use]
    pub fn new(key: RelationKey) -> Self {
        Self {
            key,
            annotations: BTreeSet::new(),
        }
    }
}
