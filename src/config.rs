//! Engine and runtime configuration.
//!
//! Configuration is immutable once an engine is built; two engines with
//! different settings can live in one process.

use std::time::Duration;

/// Feature toggles of the batch engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Annotate created objects and touched models with the caller's id.
    pub use_user_id: bool,
    /// Annotate created objects and generated models with the current date.
    pub use_creation_date: bool,
    /// Run inference reconciliation after mutating batches.
    pub add_inferences: bool,
    /// Check models before they are saved.
    pub validate_before_save: bool,
    /// Prefix of generated model ids.
    pub model_id_prefix: String,
    /// Deadline for one oracle call; `None` waits indefinitely.
    pub oracle_timeout: Option<Duration>,
    /// Taxonomy class whose descendants are listed as evidence types.
    pub evidence_root: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            use_user_id: true,
            use_creation_date: true,
            add_inferences: true,
            validate_before_save: true,
            model_id_prefix: "gomodel:".to_string(),
            oracle_timeout: None,
            evidence_root: "ECO:0000000".to_string(),
        }
    }
}

impl EngineConfig {
    /// Sets [`EngineConfig::use_user_id`].
    #[must_use]
    pub const fn with_user_id(mut self, enabled: bool) -> Self {
        self.use_user_id = enabled;
        self
    }

    /// Sets [`EngineConfig::use_creation_date`].
    #[must_use]
    pub const fn with_creation_date(mut self, enabled: bool) -> Self {
        self.use_creation_date = enabled;
        self
    }

    /// Sets [`EngineConfig::add_inferences`].
    #[must_use]
    pub const fn with_inferences(mut self, enabled: bool) -> Self {
        self.add_inferences = enabled;
        self
    }

    /// Sets [`EngineConfig::validate_before_save`].
    #[must_use]
    pub const fn with_validation(mut self, enabled: bool) -> Self {
        self.validate_before_save = enabled;
        self
    }

    /// Sets [`EngineConfig::model_id_prefix`].
    #[must_use]
    pub fn with_model_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.model_id_prefix = prefix.into();
        self
    }

    /// Sets [`EngineConfig::oracle_timeout`].
    #[must_use]
    pub const fn with_oracle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.oracle_timeout = timeout;
        self
    }

    /// Sets [`EngineConfig::evidence_root`].
    #[must_use]
    pub fn with_evidence_root(mut self, root: impl Into<String>) -> Self {
        self.evidence_root = root.into();
        self
    }
}

/// Sizing of the bounded worker runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Workers for read-only batches.
    pub query_workers: usize,
    /// Workers for mutating batches.
    pub edit_workers: usize,
    /// Maximum queued batches per pool.
    pub queue_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            query_workers: 2,
            edit_workers: 2,
            queue_capacity: 1024,
        }
    }
}
