//! # causal-edit - Batch Editing for Causal Graph Models
//!
//! causal-edit applies batches of edit requests to independently versioned
//! causal graph models. A model holds individuals typed by class
//! expressions, edges between them, and annotations. Every batch is atomic,
//! one `undo` reverts a whole batch, and after each mutating batch the
//! engine reconciles the types an entailment oracle infers.
//!
//! ## Core Concepts
//!
//! - **Model**: a graph of individuals and edges with its own undo history
//! - **Batch**: an ordered list of requests applied against one model
//! - **Expression**: a class expression built from classes, restrictions,
//!   intersections and unions
//! - **Reconciliation**: the minimal inferred types per individual, plus the
//!   model's consistency
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use causal_edit::{
//!     Arguments, BatchRequest, EditEngine, EngineConfig, EntityKind, InMemoryTaxonomy, Operation,
//! };
//!
//! let taxonomy = InMemoryTaxonomy::new().with_class("GO:0003674", "molecular_function", &[]);
//! let engine = EditEngine::in_memory(EngineConfig::default(), Arc::new(taxonomy));
//!
//! let response = engine.process_batch(
//!     Some("orcid:0000-0001"),
//!     Some("action"),
//!     None,
//!     vec![
//!         BatchRequest::new(EntityKind::Model, Operation::GenerateBlank),
//!         BatchRequest::new(EntityKind::Individual, Operation::Create)
//!             .with_arguments(Arguments::new().subject("GO:0003674").variable("mf")),
//!     ],
//!     true,
//! );
//! assert!(response.is_success());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod config;
pub mod error;
pub mod expression;
pub mod model;
pub mod undo;

// Storage and inference collaborators
pub mod inference;
pub mod store;

// Batch protocol and execution
pub mod batch;
pub mod engine;

pub use batch::{
    Arguments, BatchCall, BatchRequest, BatchResponse, EntityKind, MessageType, Operation, Signal,
    ValuePair,
};
pub use config::{EngineConfig, RuntimeConfig};
pub use engine::runtime::{BatchHandle, BatchRuntime, ExecutionPath};
pub use engine::{EditEngine, LegacyFormat};
pub use error::{EditError, EditResult, ExecutionError, ValidationError};
pub use expression::{Expression, ExpressionNode, InMemoryTaxonomy, Taxonomy, TermId};
pub use inference::{EntailmentOracle, Reconciliation, TaxonomyOracle};
pub use model::{Annotation, Entity, EntityId, Model, ModelId};
pub use store::{InMemoryPersistence, ModelDocument, ModelPersistence, ModelStore, StorageError};
