//! The live model store and in-memory collaborator backends.
//!
//! [`ModelStore`] keeps one `RwLock` per model behind a map that is itself
//! only locked briefly to find or insert a handle. Batches on the same model
//! serialize on the model lock; batches on different models never contend.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use tracing::{debug, info};

use crate::error::EditResult;
use crate::expression::TermId;
use crate::model::{Model, ModelId};

use super::traits::{ModelPersistence, SeedCorpus, SeedGraph, StorageError};
use super::ModelDocument;

pub(crate) fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

/// Shared handle to one live model.
pub type ModelHandle = Arc<RwLock<Model>>;

/// Owns every live model, loading persisted ones on first access.
pub struct ModelStore {
    models: RwLock<HashMap<ModelId, ModelHandle>>,
    persistence: Arc<dyn ModelPersistence>,
}

impl std::fmt::Debug for ModelStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let live = self.models.read().map(|m| m.len()).unwrap_or_default();
        f.debug_struct("ModelStore").field("live", &live).finish_non_exhaustive()
    }
}

impl ModelStore {
    /// Creates an empty store over a persistence backend.
    #[must_use]
    pub fn new(persistence: Arc<dyn ModelPersistence>) -> Self {
        Self {
            models: RwLock::new(HashMap::new()),
            persistence,
        }
    }

    /// The persistence backend.
    #[must_use]
    pub fn persistence(&self) -> &Arc<dyn ModelPersistence> {
        &self.persistence
    }

    /// Registers a new model.
    ///
    /// # Errors
    /// `DuplicateKey` if a live or persisted model already uses the id.
    pub fn insert(&self, model: Model) -> Result<ModelHandle, StorageError> {
        let id = model.id().clone();
        if self.persistence.load(&id)?.is_some() {
            return Err(StorageError::DuplicateKey(id.to_string()));
        }
        let mut models = self.models.write().map_err(|_| lock_err("models"))?;
        if models.contains_key(&id) {
            return Err(StorageError::DuplicateKey(id.to_string()));
        }
        let handle = Arc::new(RwLock::new(model));
        models.insert(id.clone(), Arc::clone(&handle));
        info!(model = %id, "model registered");
        Ok(handle)
    }

    /// Returns the live model, loading it from persistence if needed.
    ///
    /// # Errors
    /// Propagates lock poisoning and persistence failures.
    pub fn get(&self, id: &ModelId) -> Result<Option<ModelHandle>, StorageError> {
        {
            let models = self.models.read().map_err(|_| lock_err("models"))?;
            if let Some(handle) = models.get(id) {
                return Ok(Some(Arc::clone(handle)));
            }
        }

        let Some(document) = self.persistence.load(id)? else {
            return Ok(None);
        };
        let model = document.into_model()?;
        let mut models = self.models.write().map_err(|_| lock_err("models"))?;
        let handle = models
            .entry(id.clone())
            .or_insert_with(|| {
                debug!(model = %id, "model loaded from persistence");
                Arc::new(RwLock::new(model))
            });
        Ok(Some(Arc::clone(handle)))
    }

    /// Like [`ModelStore::get`] but a missing model is an error.
    ///
    /// # Errors
    /// `ModelNotFound` if the model is neither live nor persisted.
    pub fn handle(&self, id: &ModelId) -> Result<ModelHandle, StorageError> {
        self.get(id)?.ok_or_else(|| StorageError::ModelNotFound(id.clone()))
    }

    /// Runs `f` with shared access to the model.
    ///
    /// # Errors
    /// `ModelNotFound`, lock poisoning, or whatever `f` returns.
    pub fn read<T>(&self, id: &ModelId, f: impl FnOnce(&Model) -> EditResult<T>) -> EditResult<T> {
        let handle = self.handle(id)?;
        let model = handle.read().map_err(|_| lock_err("model"))?;
        f(&model)
    }

    /// Runs `f` with exclusive access to the model.
    ///
    /// The lock is held for the whole call, so batches on one model never
    /// interleave.
    ///
    /// # Errors
    /// `ModelNotFound`, lock poisoning, or whatever `f` returns.
    pub fn write<T>(&self, id: &ModelId, f: impl FnOnce(&mut Model) -> EditResult<T>) -> EditResult<T> {
        let handle = self.handle(id)?;
        let mut model = handle.write().map_err(|_| lock_err("model"))?;
        f(&mut model)
    }

    /// Evicts a live model, waiting for any in-flight batch on it.
    ///
    /// Returns false if the model was not live. Unsaved edits are lost.
    ///
    /// # Errors
    /// Propagates lock poisoning.
    pub fn dispose(&self, id: &ModelId) -> Result<bool, StorageError> {
        let removed = self
            .models
            .write()
            .map_err(|_| lock_err("models"))?
            .remove(id);
        let Some(handle) = removed else {
            return Ok(false);
        };
        let _in_flight = handle.write().map_err(|_| lock_err("model"))?;
        info!(model = %id, "model disposed");
        Ok(true)
    }

    /// Persists the model's current content and clears its dirty flag.
    ///
    /// # Errors
    /// Propagates persistence failures.
    pub fn save(&self, model: &mut Model) -> Result<(), StorageError> {
        self.persistence.save(&ModelDocument::from_model(model))?;
        model.mark_clean();
        info!(model = %model.id(), "model saved");
        Ok(())
    }

    /// Ids of live models only.
    ///
    /// # Errors
    /// Propagates lock poisoning.
    pub fn live_ids(&self) -> Result<BTreeSet<ModelId>, StorageError> {
        let models = self.models.read().map_err(|_| lock_err("models"))?;
        Ok(models.keys().cloned().collect())
    }

    /// Ids of live and persisted models.
    ///
    /// # Errors
    /// Propagates lock poisoning and persistence failures.
    pub fn all_ids(&self) -> Result<BTreeSet<ModelId>, StorageError> {
        let mut ids = self.live_ids()?;
        ids.extend(self.persistence.list_ids()?);
        Ok(ids)
    }

    /// Ids of every known model for which `predicate` holds.
    ///
    /// Persisted models are loaded to be inspected.
    ///
    /// # Errors
    /// Propagates lock poisoning and persistence failures.
    pub fn search(&self, predicate: impl Fn(&Model) -> bool) -> EditResult<BTreeSet<ModelId>> {
        let mut found = BTreeSet::new();
        for id in self.all_ids()? {
            if self.read(&id, |model| Ok(predicate(model)))? {
                found.insert(id);
            }
        }
        Ok(found)
    }
}

/// Persistence that keeps documents in memory.
#[derive(Debug, Default)]
pub struct InMemoryPersistence {
    documents: RwLock<BTreeMap<ModelId, ModelDocument>>,
}

impl InMemoryPersistence {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModelPersistence for InMemoryPersistence {
    fn save(&self, document: &ModelDocument) -> Result<(), StorageError> {
        let mut documents = self.documents.write().map_err(|_| lock_err("documents"))?;
        documents.insert(document.id.clone(), document.clone());
        Ok(())
    }

    fn load(&self, id: &ModelId) -> Result<Option<ModelDocument>, StorageError> {
        let documents = self.documents.read().map_err(|_| lock_err("documents"))?;
        Ok(documents.get(id).cloned())
    }

    fn list_ids(&self) -> Result<Vec<ModelId>, StorageError> {
        let documents = self.documents.read().map_err(|_| lock_err("documents"))?;
        Ok(documents.keys().cloned().collect())
    }
}

/// Seed corpus backed by a fixed table.
#[derive(Debug, Clone, Default)]
pub struct InMemorySeedCorpus {
    seeds: HashMap<(String, TermId), SeedGraph>,
}

impl InMemorySeedCorpus {
    /// Creates an empty corpus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the seed graph for `(db, subject)`.
    #[must_use]
    pub fn with_seed(mut self, db: &str, subject: &str, graph: SeedGraph) -> Self {
        self.seeds.insert((db.to_string(), TermId::from(subject)), graph);
        self
    }
}

impl SeedCorpus for InMemorySeedCorpus {
    fn seed(&self, db: &str, subject: &TermId) -> Result<SeedGraph, StorageError> {
        Ok(self
            .seeds
            .get(&(db.to_string(), subject.clone()))
            .cloned()
            .unwrap_or_default())
    }
}
