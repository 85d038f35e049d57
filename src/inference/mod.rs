//! Inference reconciliation.
//!
//! After a mutating batch the engine asks an [`EntailmentOracle`] what the
//! model entails and reduces each entity's entailed classes to a minimal
//! cover: only the most specific classes are reported.

mod cover;
mod oracle;
mod reconcile;

pub use cover::minimal_cover;
pub use oracle::{EntailmentOracle, OracleVerdict, TaxonomyOracle};
pub use reconcile::{reconcile, reconcile_with_deadline, InferredTypes, Reconciliation};
