//! Entailment oracle collaborator.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::EditResult;
use crate::expression::{Taxonomy, TermId};
use crate::model::{EntityId, Model};

/// An oracle's answer for one model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OracleVerdict {
    /// False if the model merged with the taxonomy is unsatisfiable.
    pub consistent: bool,
    /// Entailed named classes per entity; ignored when inconsistent.
    pub entailments: BTreeMap<EntityId, BTreeSet<TermId>>,
}

impl OracleVerdict {
    /// A consistent verdict.
    #[must_use]
    pub fn consistent(entailments: BTreeMap<EntityId, BTreeSet<TermId>>) -> Self {
        Self {
            consistent: true,
            entailments,
        }
    }

    /// An inconsistent verdict.
    #[must_use]
    pub fn inconsistent() -> Self {
        Self::default()
    }
}

/// Consistency and entailment checking, e.g. a description-logic reasoner.
///
/// Calls may block for a long time. Implementations must be safe for
/// concurrent read-only use across models.
pub trait EntailmentOracle: Send + Sync {
    /// Checks `model` merged with `taxonomy`.
    ///
    /// # Errors
    /// `ExecutionError::Oracle` if no answer could be produced.
    fn check(&self, model: &Model, taxonomy: &dyn Taxonomy) -> EditResult<OracleVerdict>;
}

/// Structural oracle working from the taxonomy alone.
///
/// Each entity entails the named classes of its type expressions (an
/// intersection contributes its named operands) and all their ancestors.
/// Restrictions and unions entail nothing named. An entity entailing two
/// disjoint classes makes the model inconsistent.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaxonomyOracle;

impl EntailmentOracle for TaxonomyOracle {
    fn check(&self, model: &Model, taxonomy: &dyn Taxonomy) -> EditResult<OracleVerdict> {
        let mut entailments = BTreeMap::new();
        for entity in model.entities() {
            let mut classes = BTreeSet::new();
            for class in entity.types.iter().flat_map(|t| t.direct_classes()) {
                classes.extend(taxonomy.ancestors(class));
                classes.insert(class.clone());
            }
            let clash = classes
                .iter()
                .any(|a| classes.iter().any(|b| a < b && taxonomy.disjoint(a, b)));
            if clash {
                return Ok(OracleVerdict::inconsistent());
            }
            entailments.insert(entity.id.clone(), classes);
        }
        Ok(OracleVerdict::consistent(entailments))
    }
}
