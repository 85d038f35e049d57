//! Batch planning: everything that can be decided before any model is locked.

use tracing::warn;

use crate::error::{EditError, EditResult, ExecutionError, ValidationError};
use crate::model::ModelId;

use super::validation::optional;
use super::{Arguments, BatchRequest, EntityKind, Operation};

/// A request with parsed labels.
#[derive(Debug, Clone)]
pub(crate) struct PlannedRequest {
    pub entity: EntityKind,
    pub operation: Operation,
    pub arguments: Arguments,
}

/// The one model a batch works on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ModelTarget {
    /// A model that must already exist.
    Existing(ModelId),
    /// A model the batch creates.
    Fresh(ModelId),
}

impl ModelTarget {
    pub(crate) const fn id(&self) -> &ModelId {
        match self {
            Self::Existing(id) | Self::Fresh(id) => id,
        }
    }
}

/// A validated batch, ready to run.
#[derive(Debug)]
pub(crate) struct BatchPlan {
    pub requests: Vec<PlannedRequest>,
    pub target: Option<ModelTarget>,
    pub meta: bool,
    pub mutating: bool,
}

impl BatchPlan {
    /// Checks privilege over the whole batch, then parses labels and checks
    /// support, meta mixing and model binding for every request, in order.
    ///
    /// # Errors
    /// The first failed check; nothing has been applied at this point.
    pub(crate) fn build(requests: Vec<BatchRequest>, privileged: bool, id_prefix: &str) -> EditResult<Self> {
        if requests.is_empty() {
            return Err(ValidationError::EmptyBatch.into());
        }

        if !privileged {
            check_privilege(&requests)?;
        }

        let mut planned = Vec::with_capacity(requests.len());
        let mut target: Option<ModelTarget> = None;
        let mut meta: Option<bool> = None;
        let mut mutating = false;

        for request in requests {
            let entity = parse_label(request.entity.as_deref(), "entity type", EntityKind::parse)?;
            let operation = parse_label(request.operation.as_deref(), "operation type", Operation::parse)?;
            if !operation.supported_by(entity) {
                return Err(ValidationError::UnsupportedOperation {
                    entity: entity.label().to_string(),
                    operation: operation.label().to_string(),
                }
                .into());
            }

            let is_meta = operation.is_meta(entity);
            match meta {
                Some(previous) if previous != is_meta => {
                    return Err(ValidationError::UnsupportedCombination {
                        operation: format!("{entity} {operation}"),
                    }
                    .into());
                }
                _ => meta = Some(is_meta),
            }
            mutating |= operation.is_mutating();

            let arguments = request.arguments.unwrap_or_default();
            if operation.creates_model() {
                let fresh = ModelId::generate(id_prefix);
                if let Some(bound) = &target {
                    return Err(multiple(bound.id(), &fresh));
                }
                target = Some(ModelTarget::Fresh(fresh));
            } else if operation.needs_model(entity) {
                let named = optional("request.arguments.modelId", arguments.model_id.as_deref())?.map(ModelId::from);
                match (&target, named) {
                    (None, Some(id)) => target = Some(ModelTarget::Existing(id)),
                    (None, None) => return Err(EditError::missing("request.arguments.modelId")),
                    (Some(bound), Some(id)) if bound.id() != &id => return Err(multiple(bound.id(), &id)),
                    (Some(_), _) => {}
                }
            }

            planned.push(PlannedRequest {
                entity,
                operation,
                arguments,
            });
        }

        Ok(Self {
            requests: planned,
            target,
            meta: meta.unwrap_or(false),
            mutating,
        })
    }
}

/// Rejects the batch if any request with readable labels mutates.
fn check_privilege(requests: &[BatchRequest]) -> EditResult<()> {
    for request in requests {
        let entity = request.entity.as_deref().map(str::trim).and_then(EntityKind::parse);
        let operation = request.operation.as_deref().map(str::trim).and_then(Operation::parse);
        if let (Some(entity), Some(operation)) = (entity, operation) {
            if operation.is_mutating() {
                warn!(entity = entity.label(), operation = operation.label(), "insufficient privilege");
                return Err(ExecutionError::InsufficientPrivilege {
                    operation: operation.label().to_string(),
                    entity: entity.label().to_string(),
                }
                .into());
            }
        }
    }
    Ok(())
}

fn parse_label<T>(label: Option<&str>, what: &str, parse: impl Fn(&str) -> Option<T>) -> EditResult<T> {
    let raw = label.map(str::trim).unwrap_or_default();
    parse(raw).ok_or_else(|| EditError::missing(format!("No valid value for {what}: {raw}")))
}

fn multiple(bound: &ModelId, requested: &ModelId) -> EditError {
    ValidationError::MultipleModelIds {
        bound: bound.clone(),
        requested: requested.clone(),
    }
    .into()
}
