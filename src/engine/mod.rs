//! The batch editing engine.
//!
//! [`EditEngine::process_batch`] plans a batch, runs it against a working
//! copy of its model while holding that model's write lock, reconciles
//! inferences, and commits the copy only if every step succeeded. Failures
//! never escape as `Err`: every outcome is a [`BatchResponse`].

mod export;
mod handlers;
mod meta;
mod render;

/// Bounded worker runtime for batches.
pub mod runtime;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info_span, warn};

use crate::batch::plan::{BatchPlan, ModelTarget};
use crate::batch::validation::{optional, require};
use crate::batch::{normalize_user_id, BatchCall, BatchRequest, BatchResponse, EntityKind, Operation, Signal};
use crate::config::EngineConfig;
use crate::error::{EditError, EditResult};
use crate::expression::{IdentifierLookup, NoLookup, Taxonomy};
use crate::inference::{reconcile_with_deadline, EntailmentOracle, TaxonomyOracle};
use crate::model::{EntityId, Model, ModelId};
use crate::store::{InMemoryPersistence, ModelPersistence, ModelStore, SeedCorpus};
use crate::undo::{ActorMetadata, ChangeSet};

pub use export::{export_json, export_legacy, parse_document, LegacyFormat};

use render::{annotations, Renderer, KEY_ANNOTATIONS};

const SUCCESS: &str = "success";

/// Batch editing engine over one model store.
///
/// The engine is `Send + Sync`; share it behind an `Arc` to serve concurrent
/// callers. Batches on one model serialize on that model's lock, batches on
/// different models run in parallel.
pub struct EditEngine {
    config: EngineConfig,
    store: ModelStore,
    taxonomy: Arc<dyn Taxonomy>,
    lookup: Arc<dyn IdentifierLookup>,
    oracle: Arc<dyn EntailmentOracle>,
    seeds: Option<Arc<dyn SeedCorpus>>,
}

impl std::fmt::Debug for EditEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditEngine")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("seeds", &self.seeds.is_some())
            .finish_non_exhaustive()
    }
}

impl EditEngine {
    /// Creates an engine from its collaborators.
    #[must_use]
    pub fn new(
        config: EngineConfig,
        taxonomy: Arc<dyn Taxonomy>,
        lookup: Arc<dyn IdentifierLookup>,
        oracle: Arc<dyn EntailmentOracle>,
        persistence: Arc<dyn ModelPersistence>,
    ) -> Self {
        Self {
            config,
            store: ModelStore::new(persistence),
            taxonomy,
            lookup,
            oracle,
            seeds: None,
        }
    }

    /// An engine with in-memory persistence, no identifier lookup and the
    /// structural [`TaxonomyOracle`].
    #[must_use]
    pub fn in_memory(config: EngineConfig, taxonomy: Arc<dyn Taxonomy>) -> Self {
        Self::new(
            config,
            taxonomy,
            Arc::new(NoLookup),
            Arc::new(TaxonomyOracle),
            Arc::new(InMemoryPersistence::new()),
        )
    }

    /// Sets the seed corpus used by `generate`.
    #[must_use]
    pub fn with_seed_corpus(mut self, seeds: Arc<dyn SeedCorpus>) -> Self {
        self.seeds = Some(seeds);
        self
    }

    /// Engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The live model store.
    #[must_use]
    pub const fn store(&self) -> &ModelStore {
        &self.store
    }

    /// Evicts a live model. Unsaved edits are lost.
    ///
    /// # Errors
    /// Propagates lock poisoning.
    pub fn dispose(&self, id: &ModelId) -> EditResult<bool> {
        Ok(self.store.dispose(id)?)
    }

    /// Processes one batch.
    ///
    /// `uid`, `intention` and `packet_id` are echoed verbatim. `privileged`
    /// is the caller's capability, resolved upstream; without it any
    /// mutating request rejects the whole batch.
    pub fn process_batch(
        &self,
        uid: Option<&str>,
        intention: Option<&str>,
        packet_id: Option<&str>,
        requests: Vec<BatchRequest>,
        privileged: bool,
    ) -> BatchResponse {
        let span = info_span!(
            "batch",
            uid = uid.unwrap_or_default(),
            intention = intention.unwrap_or_default(),
            packet_id = packet_id.unwrap_or_default()
        );
        let _entered = span.enter();

        let response = BatchResponse::new(uid, intention, packet_id);
        let actor = Actor {
            user_id: normalize_user_id(uid),
            intention: intention.map(str::to_string),
        };
        match self.run(&actor, requests, privileged) {
            Ok(Rendered { signal, data }) => response.succeed(SUCCESS.to_string(), signal, data),
            Err(err) => {
                warn!(error = %err, "batch rejected");
                response.fail(&err)
            }
        }
    }

    /// Processes a decoded [`BatchCall`].
    pub fn process_call(&self, call: BatchCall, privileged: bool) -> BatchResponse {
        self.process_batch(
            call.uid.as_deref(),
            call.intention.as_deref(),
            call.packet_id.as_deref(),
            call.requests,
            privileged,
        )
    }

    fn run(&self, actor: &Actor, requests: Vec<BatchRequest>, privileged: bool) -> EditResult<Rendered> {
        let plan = BatchPlan::build(requests, privileged, &self.config.model_id_prefix)?;
        if plan.meta {
            let data = self.run_meta(&plan, actor)?;
            return Ok(Rendered {
                signal: Signal::Meta,
                data,
            });
        }
        let target = plan
            .target
            .clone()
            .ok_or_else(|| EditError::internal("edit batch without a model"))?;

        match target {
            ModelTarget::Fresh(id) => {
                let mut model = Model::new(id);
                let rendered = self.apply(&plan, &mut model, actor)?;
                self.store.insert(model)?;
                Ok(rendered)
            }
            ModelTarget::Existing(id) if plan.mutating => self.store.write(&id, |live| {
                let mut working = live.clone();
                match self.apply(&plan, &mut working, actor) {
                    Ok(rendered) => {
                        *live = working;
                        Ok(rendered)
                    }
                    Err(err) => {
                        warn!(model = %id, error = %err, "batch rolled back");
                        Err(err)
                    }
                }
            }),
            ModelTarget::Existing(id) => self.store.read(&id, |live| {
                let mut working = live.clone();
                self.apply(&plan, &mut working, actor)
            }),
        }
    }

    /// Runs every request against `model`, recording the batch's effective
    /// changes as one undo entry, then reconciles and renders.
    ///
    /// `undo` and `redo` move history themselves, so changes made earlier in
    /// the batch are recorded before they run.
    fn apply(&self, plan: &BatchPlan, model: &mut Model, actor: &Actor) -> EditResult<Rendered> {
        let mut session = Session::default();
        let mut changes = ChangeSet::new();
        for request in &plan.requests {
            debug!(
                entity = request.entity.label(),
                operation = request.operation.label(),
                model = %model.id(),
                "routing request"
            );
            if matches!(request.operation, Operation::Undo | Operation::Redo) {
                record(model, &mut changes, actor);
            }
            match request.entity {
                EntityKind::Individual => self.individual(request, model, &mut changes, &mut session, actor)?,
                EntityKind::Edge => self.edge(request, model, &mut changes, &mut session, actor)?,
                EntityKind::Model => self.model_request(request, model, &mut changes, &mut session, actor)?,
                EntityKind::Relations | EntityKind::Evidence => {
                    return Err(EditError::internal("meta request routed to an edit batch"));
                }
            }
        }
        record(model, &mut changes, actor);

        let reconciliation = if plan.mutating && self.config.add_inferences {
            Some(reconcile_with_deadline(
                model,
                &self.taxonomy,
                &self.oracle,
                self.config.oracle_timeout,
            )?)
        } else {
            None
        };

        let renderer = Renderer::new(self.taxonomy.as_ref(), reconciliation.as_ref());
        if session.rebuild {
            return Ok(Rendered {
                signal: Signal::Rebuild,
                data: renderer.model(model),
            });
        }
        let mut data = renderer.individuals(model, &session.touched);
        if session.model_annotations {
            data.insert(KEY_ANNOTATIONS.to_string(), annotations(model.annotations()));
        }
        Ok(Rendered {
            signal: Signal::Merge,
            data,
        })
    }
}

/// Moves pending changes into one undo entry, if there are any.
fn record(model: &mut Model, changes: &mut ChangeSet, actor: &Actor) {
    if changes.is_empty() {
        return;
    }
    let id = model.id().clone();
    model.history_mut().record(id, std::mem::take(changes), actor.metadata());
}

/// Normalized caller identity for one batch.
#[derive(Debug, Clone)]
struct Actor {
    user_id: Option<String>,
    intention: Option<String>,
}

impl Actor {
    fn metadata(&self) -> ActorMetadata {
        ActorMetadata::now(self.user_id.clone(), self.intention.clone())
    }
}

/// Per-batch state shared by the requests of one batch.
#[derive(Debug, Default)]
struct Session {
    variables: HashMap<String, EntityId>,
    touched: Vec<EntityId>,
    rebuild: bool,
    model_annotations: bool,
}

impl Session {
    fn touch(&mut self, id: EntityId) {
        if !self.touched.contains(&id) {
            self.touched.push(id);
        }
    }

    fn forget(&mut self, id: &EntityId) {
        self.touched.retain(|t| t != id);
    }

    fn bind(&mut self, name: Option<&str>, id: &EntityId) -> EditResult<()> {
        if let Some(name) = optional("request.arguments.assignToVariable", name)? {
            self.variables.insert(name.to_string(), id.clone());
        }
        Ok(())
    }

    /// Required individual reference, resolved through batch variables.
    fn individual(&self, model: &Model, field: &str, raw: Option<&str>) -> EditResult<EntityId> {
        let raw = require(field, raw)?;
        self.lookup(model, raw)
    }

    fn lookup(&self, model: &Model, raw: &str) -> EditResult<EntityId> {
        let id = self
            .variables
            .get(raw)
            .cloned()
            .unwrap_or_else(|| EntityId::new(raw));
        if model.entity(&id).is_none() {
            return Err(EditError::unknown(raw));
        }
        Ok(id)
    }
}

struct Rendered {
    signal: Signal,
    data: Map<String, Value>,
}
