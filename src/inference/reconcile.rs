//! Oracle call plus redundancy reduction, optionally under a deadline.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError};
use tracing::warn;

use crate::error::{EditError, EditResult, ExecutionError};
use crate::expression::{Taxonomy, TermId};
use crate::model::{EntityId, Model};

use super::{minimal_cover, EntailmentOracle};

/// Minimal entailed classes per entity.
pub type InferredTypes = BTreeMap<EntityId, BTreeSet<TermId>>;

/// Outcome of reconciling one model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// True if the oracle found the model inconsistent.
    pub inconsistent: bool,
    /// Reduced entailments; `None` when inconsistent.
    pub inferred: Option<InferredTypes>,
}

impl Reconciliation {
    /// Inferred classes of one entity; `None` if unknown or inconsistent.
    #[must_use]
    pub fn inferred_for(&self, entity: &EntityId) -> Option<&BTreeSet<TermId>> {
        self.inferred.as_ref().and_then(|m| m.get(entity))
    }
}

/// Asks the oracle about `model` and reduces every entity's answer.
///
/// # Errors
/// Propagates oracle failures.
pub fn reconcile(
    model: &Model,
    taxonomy: &dyn Taxonomy,
    oracle: &dyn EntailmentOracle,
) -> EditResult<Reconciliation> {
    let verdict = oracle.check(model, taxonomy)?;
    if !verdict.consistent {
        return Ok(Reconciliation {
            inconsistent: true,
            inferred: None,
        });
    }
    let inferred = verdict
        .entailments
        .iter()
        .map(|(entity, classes)| (entity.clone(), minimal_cover(classes, taxonomy)))
        .collect();
    Ok(Reconciliation {
        inconsistent: false,
        inferred: Some(inferred),
    })
}

/// Like [`reconcile`], but gives up after `deadline`.
///
/// The oracle runs on a snapshot of the model in its own thread. On expiry
/// the caller gets `Timeout`; the abandoned oracle call finishes in the
/// background and its answer is discarded.
///
/// # Errors
/// `Timeout` on expiry; otherwise as [`reconcile`].
pub fn reconcile_with_deadline(
    model: &Model,
    taxonomy: &Arc<dyn Taxonomy>,
    oracle: &Arc<dyn EntailmentOracle>,
    deadline: Option<Duration>,
) -> EditResult<Reconciliation> {
    let Some(deadline) = deadline else {
        return reconcile(model, taxonomy.as_ref(), oracle.as_ref());
    };

    let snapshot = model.clone();
    let taxonomy = Arc::clone(taxonomy);
    let oracle = Arc::clone(oracle);
    let (tx, rx) = bounded::<EditResult<Reconciliation>>(1);
    thread::Builder::new()
        .name("causal-edit-oracle".to_string())
        .spawn(move || {
            let _ = tx.send(reconcile(&snapshot, taxonomy.as_ref(), oracle.as_ref()));
        })
        .map_err(|e| EditError::internal(format!("failed to spawn oracle thread: {e}")))?;

    rx.recv_timeout(deadline).map_err(|err| match err {
        RecvTimeoutError::Timeout => {
            let duration_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX);
            warn!(model = %model.id(), duration_ms, "entailment oracle timed out");
            ExecutionError::Timeout { duration_ms }.into()
        }
        RecvTimeoutError::Disconnected => EditError::internal("entailment oracle thread panicked"),
    })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{Expression, InMemoryTaxonomy};
    use crate::inference::{OracleVerdict, TaxonomyOracle};
    use crate::model::{Entity, ModelId};
    use crate::undo::{Change, ChangeSet};

    struct SlowOracle(Duration);

    impl EntailmentOracle for SlowOracle {
        fn check(&self, _model: &Model, _taxonomy: &dyn Taxonomy) -> EditResult<OracleVerdict> {
            thread::sleep(self.0);
            Ok(OracleVerdict::consistent(BTreeMap::new()))
        }
    }

    struct Contradiction;

    impl EntailmentOracle for Contradiction {
        fn check(&self, _model: &Model, _taxonomy: &dyn Taxonomy) -> EditResult<OracleVerdict> {
            Ok(OracleVerdict::inconsistent())
        }
    }

    fn taxonomy() -> Arc<dyn Taxonomy> {
        Arc::new(
            InMemoryTaxonomy::new()
                .with_class("GO:0003674", "molecular_function", &[])
                .with_class("GO:0016301", "kinase activity", &["GO:0003674"])
                .with_class("GO:0004672", "protein kinase activity", &["GO:0016301"]),
        )
    }

    fn model() -> Model {
        let mut model = Model::new(ModelId::new("m"));
        let mut entity = Entity::new(EntityId::new("e"));
        entity.types.insert(Expression::class("GO:0004672"));
        ChangeSet::new().record(&mut model, Change::AddEntity { entity });
        model
    }

    #[test]
    fn reports_only_most_specific_classes() {
        let t = taxonomy();
        let result = reconcile(&model(), t.as_ref(), &TaxonomyOracle).unwrap();
        assert!(!result.inconsistent);
        let classes = result.inferred_for(&EntityId::new("e")).unwrap();
        assert_eq!(classes.iter().collect::<Vec<_>>(), vec![&TermId::from("GO:0004672")]);
    }

    #[test]
    fn inconsistency_suppresses_inferred_types() {
        let t = taxonomy();
        let result = reconcile(&model(), t.as_ref(), &Contradiction).unwrap();
        assert!(result.inconsistent);
        assert!(result.inferred.is_none());
    }

    #[test]
    fn deadline_expiry_is_a_timeout() {
        let oracle: Arc<dyn EntailmentOracle> = Arc::new(SlowOracle(Duration::from_millis(500)));
        let err = reconcile_with_deadline(&model(), &taxonomy(), &oracle, Some(Duration::from_millis(20)))
            .unwrap_err();
        assert!(err.is_retryable());
        assert!(matches!(err, EditError::Execution(ExecutionError::Timeout { duration_ms: 20 })));
    }

    #[test]
    fn fast_oracle_beats_deadline() {
        let oracle: Arc<dyn EntailmentOracle> = Arc::new(TaxonomyOracle);
        let result =
            reconcile_with_deadline(&model(), &taxonomy(), &oracle, Some(Duration::from_secs(5))).unwrap();
        assert!(result.inferred.is_some());
    }
}
