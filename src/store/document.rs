//! Serializable form of a model, used for persistence, export and import.

use serde::{Deserialize, Serialize};

use crate::model::{Annotation, Entity, Model, ModelId, Relation};
use crate::undo::{Change, ChangeSet};

use super::StorageError;

/// A model's content without its history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDocument {
    /// Model id at the time the document was written.
    pub id: ModelId,
    /// Taxon context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxon: Option<String>,
    /// Model annotations.
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    /// Entities.
    #[serde(default)]
    pub individuals: Vec<Entity>,
    /// Relations.
    #[serde(default)]
    pub facts: Vec<Relation>,
}

impl ModelDocument {
    /// Snapshot of a model's content.
    #[must_use]
    pub fn from_model(model: &Model) -> Self {
        Self {
            id: model.id().clone(),
            taxon: model.taxon().map(str::to_string),
            annotations: model.annotations().iter().cloned().collect(),
            individuals: model.entities().cloned().collect(),
            facts: model.relations().collect(),
        }
    }

    /// Checks that every relation connects two listed entities.
    ///
    /// # Errors
    /// Describes the first dangling relation.
    pub fn check(&self) -> Result<(), String> {
        for fact in &self.facts {
            for end in [&fact.key.subject, &fact.key.object] {
                if !self.individuals.iter().any(|e| &e.id == end) {
                    return Err(format!("relation {} references unknown individual {end}", fact.key));
                }
            }
        }
        Ok(())
    }

    /// Primitive changes that build this content from an empty model.
    #[must_use]
    pub fn changes(&self) -> Vec<Change> {
        let entities = self
            .individuals
            .iter()
            .cloned()
            .map(|entity| Change::AddEntity { entity });
        let relations = self
            .facts
            .iter()
            .cloned()
            .map(|relation| Change::AddRelation { relation });
        let annotations = self
            .annotations
            .iter()
            .cloned()
            .map(|annotation| Change::AddModelAnnotation { annotation });
        entities.chain(relations).chain(annotations).collect()
    }

    /// Applies the content to `target`, recording into `changes`.
    pub(crate) fn build_into(&self, target: &mut Model, changes: &mut ChangeSet) -> Result<(), StorageError> {
        self.check().map_err(StorageError::SerializationError)?;
        for change in self.changes() {
            changes.record(target, change);
        }
        Ok(())
    }

    /// Rebuilds a clean model with an empty history.
    ///
    /// # Errors
    /// Returns `SerializationError` if a relation is dangling.
    pub fn into_model(self) -> Result<Model, StorageError> {
        let mut model = Model::new(self.id.clone()).with_taxon(self.taxon.clone());
        self.build_into(&mut model, &mut ChangeSet::new())?;
        model.mark_clean();
        Ok(model)
    }
}
