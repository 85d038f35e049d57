//! Error types for the editing engine.
//!
//! All errors are strongly typed using thiserror. Local argument checks
//! surface as [`ValidationError`], failures while a batch is applied as
//! [`ExecutionError`]; [`EditError`] wraps both.

use thiserror::Error;

use crate::model::ModelId;

/// Validation errors raised before anything is applied.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required argument is absent for the operation or expression tag.
    #[error("Expected non-null value for: {field}")]
    MissingParameter {
        /// Path of the missing field, e.g. `request.arguments.subject`.
        field: String,
    },

    /// A free-text field is longer than the engine accepts.
    #[error("Field '{field}' exceeds maximum length of {max_length}")]
    FieldTooLong {
        /// Offending field.
        field: String,
        /// Allowed length in bytes.
        max_length: usize,
    },

    /// A field is present but its value is not acceptable.
    #[error("Invalid value for '{field}': {reason}")]
    InvalidField {
        /// Offending field.
        field: String,
        /// Human readable reason.
        reason: String,
    },

    /// The batch carried no requests.
    #[error("Empty batch calls are not supported, at least one request is required.")]
    EmptyBatch,

    /// Requests in one batch named different models.
    #[error("Using multiple modelIds in one batch call is not supported.")]
    MultipleModelIds {
        /// Model bound by the earlier request.
        bound: ModelId,
        /// Model named by the offending request.
        requested: ModelId,
    },

    /// Meta and non-meta operations were mixed in one batch.
    #[error("{operation} can only be combined with other meta operations.")]
    UnsupportedCombination {
        /// Label of the operation that could not be combined.
        operation: String,
    },

    /// The operation label is known but the entity kind does not support it.
    #[error("Unknown operation: {operation} for entity: {entity}")]
    UnsupportedOperation {
        /// Entity kind label.
        entity: String,
        /// Operation label.
        operation: String,
    },
}

/// Errors that occur while a batch is applied.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// An id or label could not be resolved.
    #[error("{}", unknown_identifier_message(.id, .others))]
    UnknownIdentifier {
        /// First unresolvable identifier, in left-to-right order.
        id: String,
        /// Further unresolvable identifiers in the same expression.
        others: Vec<String>,
    },

    /// The model is neither live nor persisted.
    #[error("Could not retrieve a model for id: {id}")]
    ModelNotFound {
        /// The requested model id.
        id: ModelId,
    },

    /// The caller lacks the capability for a mutating operation.
    #[error("Insufficient permissions for the operation {operation} on entity: {entity}")]
    InsufficientPrivilege {
        /// Operation label.
        operation: String,
        /// Entity kind label.
        entity: String,
    },

    /// Pre-save checks failed.
    #[error("{}", .issues.join("\n"))]
    ValidationFailed {
        /// One human readable line per failed check.
        issues: Vec<String>,
    },

    /// Undo on an empty history.
    #[error("There is nothing to undo for model {model}")]
    EmptyUndo {
        /// Target model.
        model: ModelId,
    },

    /// Redo on an empty history.
    #[error("There is nothing to redo for model {model}")]
    EmptyRedo {
        /// Target model.
        model: ModelId,
    },

    /// The entailment oracle failed to answer.
    #[error("Entailment oracle failed: {message}")]
    Oracle {
        /// Oracle-provided detail.
        message: String,
    },

    /// A deadline expired.
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout {
        /// The configured deadline.
        duration_ms: u64,
    },

    /// A persistence or in-memory store failure.
    #[error("Storage error: {message}")]
    Storage {
        /// Backend detail.
        message: String,
    },

    /// The runtime queue for a path is full.
    #[error("Queue for {path} batches is full (capacity {capacity})")]
    QueueFull {
        /// Runtime path name.
        path: String,
        /// Configured queue capacity.
        capacity: usize,
    },

    /// The runtime worker for a path went away.
    #[error("Worker pool for {path} batches is disconnected")]
    Disconnected {
        /// Runtime path name.
        path: String,
    },
}

fn unknown_identifier_message(id: &str, others: &[String]) -> String {
    if others.is_empty() {
        format!("Could not validate the id: {id}")
    } else {
        format!("Could not validate the ids: {id}, {}", others.join(", "))
    }
}

/// Top-level error type for the engine.
#[derive(Debug, Error)]
pub enum EditError {
    /// Request-level argument problem.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Failure while applying a batch.
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// Broken internal invariant.
    #[error("Internal error: {message}")]
    Internal {
        /// Detail.
        message: String,
    },
}

impl EditError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Shorthand for a missing parameter.
    #[must_use]
    pub fn missing(field: impl Into<String>) -> Self {
        Self::Validation(ValidationError::MissingParameter {
            field: field.into(),
        })
    }

    /// Shorthand for a single unresolvable identifier.
    #[must_use]
    pub fn unknown(id: impl Into<String>) -> Self {
        Self::Execution(ExecutionError::UnknownIdentifier {
            id: id.into(),
            others: Vec::new(),
        })
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }

    /// Returns true for a missing parameter.
    #[must_use]
    pub const fn is_missing_parameter(&self) -> bool {
        matches!(self, Self::Validation(ValidationError::MissingParameter { .. }))
    }

    /// Returns true for an unresolvable identifier.
    #[must_use]
    pub const fn is_unknown_identifier(&self) -> bool {
        matches!(self, Self::Execution(ExecutionError::UnknownIdentifier { .. }))
    }

    /// Returns true if this error is retryable.
    ///
    /// Only transient runtime conditions qualify; the engine itself never retries.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Validation(_) | Self::Internal { .. } => false,
            Self::Execution(e) => matches!(
                e,
                ExecutionError::Timeout { .. } | ExecutionError::QueueFull { .. }
            ),
        }
    }

    /// Text for the response commentary: the bare inner message.
    #[must_use]
    pub fn commentary(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Execution(e) => e.to_string(),
            Self::Internal { message } => message.clone(),
        }
    }
}

/// Result type alias for engine operations.
pub type EditResult<T> = Result<T, EditError>;
