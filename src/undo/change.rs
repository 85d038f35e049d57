//! Reversible primitive edits.

use serde::{Deserialize, Serialize};

use crate::error::{EditError, EditResult};
use crate::expression::Expression;
use crate::model::{Annotation, Entity, EntityId, Model, Relation, RelationKey};

/// One primitive, exactly invertible edit of a model.
///
/// Removals carry the full removed value so their inverse can restore it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum Change {
    /// Insert an entity (with its types and annotations).
    AddEntity {
        /// Entity snapshot.
        entity: Entity,
    },
    /// Remove an entity; relations must already be gone.
    RemoveEntity {
        /// Entity snapshot.
        entity: Entity,
    },
    /// Assert a type.
    AddType {
        /// Target entity.
        entity: EntityId,
        /// Type expression.
        expression: Expression,
    },
    /// Retract a type.
    RemoveType {
        /// Target entity.
        entity: EntityId,
        /// Type expression.
        expression: Expression,
    },
    /// Annotate an entity.
    AddEntityAnnotation {
        /// Target entity.
        entity: EntityId,
        /// Annotation.
        annotation: Annotation,
    },
    /// Remove an entity annotation.
    RemoveEntityAnnotation {
        /// Target entity.
        entity: EntityId,
        /// Annotation.
        annotation: Annotation,
    },
    /// Insert a relation.
    AddRelation {
        /// Relation snapshot.
        relation: Relation,
    },
    /// Remove a relation.
    RemoveRelation {
        /// Relation snapshot.
        relation: Relation,
    },
    /// Annotate a relation.
    AddRelationAnnotation {
        /// Target relation.
        key: RelationKey,
        /// Annotation.
        annotation: Annotation,
    },
    /// Remove a relation annotation.
    RemoveRelationAnnotation {
        /// Target relation.
        key: RelationKey,
        /// Annotation.
        annotation: Annotation,
    },
    /// Annotate the model.
    AddModelAnnotation {
        /// Annotation.
        annotation: Annotation,
    },
    /// Remove a model annotation.
    RemoveModelAnnotation {
        /// Annotation.
        annotation: Annotation,
    },
}

impl Change {
    /// The change that undoes this one.
    #[must_use]
    pub fn inverse(&self) -> Self {
        match self.clone() {
            Self::AddEntity { entity } => Self::RemoveEntity { entity },
            Self::RemoveEntity { entity } => Self::AddEntity { entity },
            Self::AddType { entity, expression } => Self::RemoveType { entity, expression },
            Self::RemoveType { entity, expression } => Self::AddType { entity, expression },
            Self::AddEntityAnnotation { entity, annotation } => {
                Self::RemoveEntityAnnotation { entity, annotation }
            }
            Self::RemoveEntityAnnotation { entity, annotation } => {
                Self::AddEntityAnnotation { entity, annotation }
            }
            Self::AddRelation { relation } => Self::RemoveRelation { relation },
            Self::RemoveRelation { relation } => Self::AddRelation { relation },
            Self::AddRelationAnnotation { key, annotation } => {
                Self::RemoveRelationAnnotation { key, annotation }
            }
            Self::RemoveRelationAnnotation { key, annotation } => {
                Self::AddRelationAnnotation { key, annotation }
            }
            Self::AddModelAnnotation { annotation } => Self::RemoveModelAnnotation { annotation },
            Self::RemoveModelAnnotation { annotation } => Self::AddModelAnnotation { annotation },
        }
    }

    /// Applies the change; returns false if it had no effect.
    pub(crate) fn apply(&self, model: &mut Model) -> bool {
        match self {
            Self::AddEntity { entity } => model.insert_entity(entity.clone()),
            Self::RemoveEntity { entity } => {
                model.relations_touching(&entity.id).is_empty() && model.take_entity(&entity.id).is_some()
            }
            Self::AddType { entity, expression } => model.add_type(entity, expression.clone()),
            Self::RemoveType { entity, expression } => model.remove_type(entity, expression),
            Self::AddEntityAnnotation { entity, annotation } => {
                model.add_entity_annotation(entity, annotation.clone())
            }
            Self::RemoveEntityAnnotation { entity, annotation } => {
                model.remove_entity_annotation(entity, annotation)
            }
            Self::AddRelation { relation } => model.insert_relation(relation.clone()),
            Self::RemoveRelation { relation } => model.take_relation(&relation.key).is_some(),
            Self::AddRelationAnnotation { key, annotation } => {
                model.add_relation_annotation(key, annotation.clone())
            }
            Self::RemoveRelationAnnotation { key, annotation } => {
                model.remove_relation_annotation(key, annotation)
            }
            Self::AddModelAnnotation { annotation } => model.add_annotation(annotation.clone()),
            Self::RemoveModelAnnotation { annotation } => model.remove_annotation(annotation),
        }
    }
}

/// Ordered list of effective changes made by one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    /// Creates an empty change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `change` and keeps it only if it had an effect.
    pub fn record(&mut self, model: &mut Model, change: Change) -> bool {
        let effective = change.apply(model);
        if effective {
            self.changes.push(change);
        }
        effective
    }

    /// Appends every change of `other`.
    pub fn extend(&mut self, other: Self) {
        self.changes.extend(other.changes);
    }

    /// Returns true if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of primitive changes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// The primitive changes in application order.
    #[must_use]
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// Inverse change set: inverted changes in reverse order.
    #[must_use]
    pub fn inverse(&self) -> Self {
        Self {
            changes: self.changes.iter().rev().map(Change::inverse).collect(),
        }
    }

    /// Replays every change.
    ///
    /// # Errors
    /// Returns an internal error if a change has no effect, which means the
    /// model diverged from the state the change set was recorded against.
    pub fn replay(&self, model: &mut Model) -> EditResult<()> {
        for change in &self.changes {
            if !change.apply(model) {
                return Err(EditError::internal(format!(
                    "history diverged from model {}: {change:?} had no effect",
                    model.id()
                )));
            }
        }
        Ok(())
    }
}
