//! Models: independently versioned graphs of entities, relations and annotations.
//!
//! A [`Model`] is only mutated through [`crate::undo::Change`] primitives so
//! that every edit has an exact inverse. The primitive mutators below report
//! whether they changed anything; no-ops never enter a change set.

mod annotation;
mod entity;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::expression::Expression;
use crate::undo::UndoLog;

pub use annotation::{keys, Annotation};
pub use entity::{Entity, EntityId, Relation, RelationKey};

/// Opaque, process-unique model identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    /// Wraps an existing id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh id with the given prefix.
    ///
    /// # Examples
    ///
    /// ```
    /// use causal_edit::ModelId;
    ///
    /// let a = ModelId::generate("gomodel:");
    /// let b = ModelId::generate("gomodel:");
    /// assert_ne!(a, b);
    /// assert!(a.as_str().starts_with("gomodel:"));
    /// ```
    #[must_use]
    pub fn generate(prefix: &str) -> Self {
        Self(format!("{prefix}{}", Uuid::new_v4().simple()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One live model with its undo/redo history.
#[derive(Debug, Clone)]
pub struct Model {
    id: ModelId,
    taxon: Option<String>,
    entities: BTreeMap<EntityId, Entity>,
    relations: BTreeMap<RelationKey, BTreeSet<Annotation>>,
    annotations: BTreeSet<Annotation>,
    dirty: bool,
    history: UndoLog,
}

impl Model {
    /// Creates an empty model.
    #[must_use]
    pub fn new(id: ModelId) -> Self {
        Self {
            id,
            taxon: None,
            entities: BTreeMap::new(),
            relations: BTreeMap::new(),
            annotations: BTreeSet::new(),
            dirty: false,
            history: UndoLog::default(),
        }
    }

    /// Sets the organism/taxon context used for foreign identifier lookups.
    #[must_use]
    pub fn with_taxon(mut self, taxon: Option<String>) -> Self {
        self.taxon = taxon;
        self
    }

    /// Model id.
    #[must_use]
    pub fn id(&self) -> &ModelId {
        &self.id
    }

    /// Taxon context, if any.
    #[must_use]
    pub fn taxon(&self) -> Option<&str> {
        self.taxon.as_deref()
    }

    /// All entities in id order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Looks up an entity.
    #[must_use]
    pub fn entity(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Number of entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// All relations in key order.
    pub fn relations(&self) -> impl Iterator<Item = Relation> + '_ {
        self.relations.iter().map(|(key, annotations)| Relation {
            key: key.clone(),
            annotations: annotations.clone(),
        })
    }

    /// Looks up one relation.
    #[must_use]
    pub fn relation(&self, key: &RelationKey) -> Option<Relation> {
        self.relations.get(key).map(|annotations| Relation {
            key: key.clone(),
            annotations: annotations.clone(),
        })
    }

    /// Relations with the entity at either end.
    #[must_use]
    pub fn relations_touching(&self, entity: &EntityId) -> Vec<Relation> {
        self.relations()
            .filter(|r| r.key.touches(entity))
            .collect()
    }

    /// Number of relations.
    #[must_use]
    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    /// Model-level annotations.
    #[must_use]
    pub fn annotations(&self) -> &BTreeSet<Annotation> {
        &self.annotations
    }

    /// Values of model annotations with the given key.
    pub fn annotation_values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.annotations
            .iter()
            .filter(move |a| a.has_key(key))
            .map(|a| a.value.as_str())
    }

    /// First non-blank title, if any.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.annotation_values(keys::TITLE)
            .find(|v| !v.trim().is_empty())
    }

    /// True once edited since the last save.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Undo/redo history.
    #[must_use]
    pub const fn history(&self) -> &UndoLog {
        &self.history
    }

    /// Returns true if any entity, type expression or edge mentions the id.
    #[must_use]
    pub fn mentions(&self, term: &str) -> bool {
        self.entities
            .values()
            .any(|e| e.id.as_str() == term || e.mentions(term))
            || self.relations.keys().any(|k| k.predicate.as_str() == term)
    }

    pub(crate) fn history_mut(&mut self) -> &mut UndoLog {
        &mut self.history
    }

    pub(crate) fn set_taxon(&mut self, taxon: Option<String>) {
        self.taxon = taxon;
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub(crate) fn insert_entity(&mut self, entity: Entity) -> bool {
        if self.entities.contains_key(&entity.id) {
            return false;
        }
        self.entities.insert(entity.id.clone(), entity);
        self.dirty = true;
        true
    }

    pub(crate) fn take_entity(&mut self, id: &EntityId) -> Option<Entity> {
        let taken = self.entities.remove(id);
        if taken.is_some() {
            self.dirty = true;
        }
        taken
    }

    pub(crate) fn add_type(&mut self, id: &EntityId, expression: Expression) -> bool {
        let changed = self
            .entities
            .get_mut(id)
            .is_some_and(|e| e.types.insert(expression));
        self.dirty |= changed;
        changed
    }

    pub(crate) fn remove_type(&mut self, id: &EntityId, expression: &Expression) -> bool {
        let changed = self
            .entities
            .get_mut(id)
            .is_some_and(|e| e.types.remove(expression));
        self.dirty |= changed;
        changed
    }

    pub(crate) fn add_entity_annotation(&mut self, id: &EntityId, annotation: Annotation) -> bool {
        let changed = self
            .entities
            .get_mut(id)
            .is_some_and(|e| e.annotations.insert(annotation));
        self.dirty |= changed;
        changed
    }

    pub(crate) fn remove_entity_annotation(&mut self, id: &EntityId, annotation: &Annotation) -> bool {
        let changed = self
            .entities
            .get_mut(id)
            .is_some_and(|e| e.annotations.remove(annotation));
        self.dirty |= changed;
        changed
    }

    pub(crate) fn insert_relation(&mut self, relation: Relation) -> bool {
        let both_present = self.entities.contains_key(&relation.key.subject)
            && self.entities.contains_key(&relation.key.object);
        if !both_present || self.relations.contains_key(&relation.key) {
            return false;
        }
        self.relations.insert(relation.key, relation.annotations);
        self.dirty = true;
        true
    }

    pub(crate) fn take_relation(&mut self, key: &RelationKey) -> Option<Relation> {
        let annotations = self.relations.remove(key)?;
        self.dirty = true;
        Some(Relation {
            key: key.clone(),
            annotations,
        })
    }

    pub(crate) fn add_relation_annotation(&mut self, key: &RelationKey, annotation: Annotation) -> bool {
        let changed = self
            .relations
            .get_mut(key)
            .is_some_and(|set| set.insert(annotation));
        self.dirty |= changed;
        changed
    }

    pub(crate) fn remove_relation_annotation(&mut self, key: &RelationKey, annotation: &Annotation) -> bool {
        let changed = self
            .relations
            .get_mut(key)
            .is_some_and(|set| set.remove(annotation));
        self.dirty |= changed;
        changed
    }

    pub(crate) fn add_annotation(&mut self, annotation: Annotation) -> bool {
        let changed = self.annotations.insert(annotation);
        self.dirty |= changed;
        changed
    }

    pub(crate) fn remove_annotation(&mut self, annotation: &Annotation) -> bool {
        let changed = self.annotations.remove(annotation);
        self.dirty |= changed;
        changed
    }
}
