//! Collaborator traits for model persistence and seed data.
//!
//! The engine never touches disks or annotation corpora directly. Backends
//! implement these traits:
//! - [`ModelPersistence`] saves and loads whole models as [`ModelDocument`]s
//! - [`SeedCorpus`] provides the entities and links used by `generate`

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{EditError, ExecutionError};
use crate::expression::TermId;
use crate::model::{Annotation, ModelId};

use super::ModelDocument;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Model not found.
    #[error("Model not found: {0}")]
    ModelNotFound(ModelId),

    /// Key already exists.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Backend error.
    #[error("Storage backend error: {0}")]
    BackendError(String),

    /// Serialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<StorageError> for EditError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ModelNotFound(id) => Self::Execution(ExecutionError::ModelNotFound { id }),
            other => Self::Execution(ExecutionError::Storage {
                message: other.to_string(),
            }),
        }
    }
}

/// Durable storage for models.
///
/// # Safety Considerations
/// - `save` must replace the previous document atomically
/// - Implementations are shared across threads
pub trait ModelPersistence: Send + Sync {
    /// Persists a model, replacing any earlier version.
    fn save(&self, document: &ModelDocument) -> Result<(), StorageError>;

    /// Loads a persisted model. `Ok(None)` if it was never saved.
    fn load(&self, id: &ModelId) -> Result<Option<ModelDocument>, StorageError>;

    /// Ids of every persisted model.
    fn list_ids(&self) -> Result<Vec<ModelId>, StorageError>;
}

/// One individual proposed by a seed corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedEntity {
    /// Key used by [`SeedLink`]s to refer to this entity.
    pub key: String,
    /// Class the individual is typed with.
    pub class: TermId,
    /// Annotations copied onto the individual.
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

/// One edge between two seed entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedLink {
    /// Key of the subject entity.
    pub subject: String,
    /// Relation id.
    pub predicate: TermId,
    /// Key of the object entity.
    pub object: String,
}

/// Entities and links to seed a generated model with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedGraph {
    /// Individuals to create.
    #[serde(default)]
    pub entities: Vec<SeedEntity>,
    /// Edges between them.
    #[serde(default)]
    pub links: Vec<SeedLink>,
}

/// Source of seed data for `generate`, keyed by `(db, subject)`.
pub trait SeedCorpus: Send + Sync {
    /// Seed graph for `subject` in database `db`; empty if nothing is known.
    fn seed(&self, db: &str, subject: &TermId) -> Result<SeedGraph, StorageError>;
}
