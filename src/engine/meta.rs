//! Meta requests: listings, search, export, history summaries and store.
//!
//! Meta batches do not run against a working copy. Each request reads the
//! live model, except `store`, which commits and persists on its own.

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::batch::plan::{BatchPlan, ModelTarget, PlannedRequest};
use crate::batch::validation::{annotations, query_ids, require_list};
use crate::batch::{EntityKind, Operation};
use crate::error::{EditError, EditResult, ExecutionError};
use crate::expression::{TermId, TermInfo};
use crate::model::{keys, Model, ModelId};
use crate::undo::{Change, ChangeSet, UndoEntry};

use super::handlers::unsupported;
use super::{export_json, export_legacy, Actor, EditEngine, LegacyFormat};

const NO_TITLE: &str = "The model has no title. All models must have a human readable title.";
const NO_INDIVIDUALS: &str = "The model has no individuals. Empty models should not be saved.";

impl EditEngine {
    pub(super) fn run_meta(&self, plan: &BatchPlan, actor: &Actor) -> EditResult<Map<String, Value>> {
        let mut data = Map::new();
        let bound = plan.target.as_ref().map(ModelTarget::id);
        for request in &plan.requests {
            debug!(
                entity = request.entity.label(),
                operation = request.operation.label(),
                "routing meta request"
            );
            match (request.entity, request.operation) {
                (EntityKind::Relations, Operation::Get) => {
                    data.insert("relations".to_string(), terms(self.taxonomy.relations()));
                }
                (EntityKind::Evidence, Operation::Get) => {
                    let root = TermId::from(self.config.evidence_root.as_str());
                    data.insert("evidence".to_string(), terms(self.taxonomy.descendants(&root)));
                }
                (EntityKind::Model, Operation::AllModelIds) => {
                    data.insert("model_ids".to_string(), ids(self.store.all_ids()?));
                }
                (EntityKind::Model, Operation::AllModelMeta) => {
                    let mut meta = Map::new();
                    for id in self.store.all_ids()? {
                        let entry = self.store.read(&id, |model| Ok(model_meta(model)))?;
                        meta.insert(id.to_string(), entry);
                    }
                    data.insert("models_meta".to_string(), Value::Object(meta));
                }
                (EntityKind::Model, Operation::Search) => {
                    let values = require_list("request.arguments.values", request.arguments.values.as_deref())?;
                    let wanted = query_ids(values)?;
                    if wanted.is_empty() {
                        return Err(EditError::missing("request.arguments.values.id"));
                    }
                    let found = self
                        .store
                        .search(|model| wanted.iter().any(|id| model.mentions(id)))?;
                    data.insert("model_ids".to_string(), ids(found));
                }
                (EntityKind::Model, Operation::Export) => {
                    let id = bound_model(bound)?;
                    let text = self.store.read(id, export_json)?;
                    data.insert("export".to_string(), Value::from(text));
                }
                (EntityKind::Model, Operation::ExportLegacy) => {
                    let id = bound_model(bound)?;
                    let format = LegacyFormat::parse(request.arguments.format.as_deref())?;
                    let text = self.store.read(id, |model| Ok(export_legacy(model, format)))?;
                    data.insert("export".to_string(), Value::from(text));
                }
                (EntityKind::Model, Operation::GetUndoRedo) => {
                    let id = bound_model(bound)?;
                    let now = Utc::now();
                    let (undo, redo) = self.store.read(id, |model| {
                        let history = model.history();
                        Ok((
                            history.undo_entries().map(|e| history_entry(e, now)).collect::<Vec<_>>(),
                            history.redo_entries().map(|e| history_entry(e, now)).collect::<Vec<_>>(),
                        ))
                    })?;
                    data.insert("undo".to_string(), Value::Array(undo));
                    data.insert("redo".to_string(), Value::Array(redo));
                }
                (EntityKind::Model, Operation::Store) => {
                    let id = bound_model(bound)?;
                    self.store_model(id, request, actor)?;
                }
                (entity, operation) => return Err(unsupported(entity, operation)),
            }
        }
        Ok(data)
    }

    /// Adds any supplied annotations, validates, and persists.
    ///
    /// The model is committed only if validation and persistence succeed.
    fn store_model(&self, id: &ModelId, request: &PlannedRequest, actor: &Actor) -> EditResult<()> {
        let mut supplied = match request.arguments.values.as_deref() {
            Some(values) => annotations(values)?,
            None => Vec::new(),
        };
        if !supplied.is_empty() {
            self.add_contributor(actor, &mut supplied);
        }

        self.store.write(id, |live| {
            let mut working = live.clone();
            let mut changes = ChangeSet::new();
            for annotation in supplied {
                changes.record(&mut working, Change::AddModelAnnotation { annotation });
            }
            if self.config.validate_before_save {
                let issues = save_issues(&working);
                if !issues.is_empty() {
                    warn!(model = %id, ?issues, "model failed validation");
                    return Err(ExecutionError::ValidationFailed { issues }.into());
                }
            }
            if !changes.is_empty() {
                working
                    .history_mut()
                    .record(id.clone(), changes, actor.metadata());
            }
            self.store.save(&mut working)?;
            *live = working;
            Ok(())
        })
    }
}

/// Pre-save checks; one line per problem.
pub(crate) fn save_issues(model: &Model) -> Vec<String> {
    let mut issues = Vec::new();
    if model.title().is_none() {
        issues.push(NO_TITLE.to_string());
    }
    if model.entity_count() == 0 {
        issues.push(NO_INDIVIDUALS.to_string());
    }
    issues
}

fn bound_model(bound: Option<&ModelId>) -> EditResult<&ModelId> {
    bound.ok_or_else(|| EditError::missing("request.arguments.modelId"))
}

fn terms(infos: Vec<TermInfo>) -> Value {
    infos
        .into_iter()
        .map(|t| json!({"id": t.id.as_str(), "label": t.label}))
        .collect()
}

fn ids(ids: impl IntoIterator<Item = ModelId>) -> Value {
    ids.into_iter().map(|id| Value::from(id.as_str())).collect()
}

fn model_meta(model: &Model) -> Value {
    let mut meta = Map::new();
    for key in keys::MODEL_META {
        let values: Vec<&str> = model.annotation_values(key).collect();
        if !values.is_empty() {
            meta.insert(key.to_string(), Value::from(values.join("; ")));
        }
    }
    Value::Object(meta)
}

fn history_entry(entry: &UndoEntry, now: DateTime<Utc>) -> Value {
    let age = now.signed_duration_since(entry.actor.timestamp).num_milliseconds().max(0);
    json!({
        "user-id": entry.actor.user_id,
        "intention": entry.actor.intention,
        "time": age,
    })
}
