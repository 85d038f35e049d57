//! Batch wire types and planning.
//!
//! A batch is an ordered list of [`BatchRequest`]s addressed by
//! `(entity, operation)` labels. Before anything is applied the batch is
//! planned: labels are parsed, the privilege gate is enforced, meta and
//! non-meta operations are kept apart, and the batch is bound to at most one
//! model.

mod operation;
pub(crate) mod plan;
mod request;
mod response;
pub(crate) mod validation;

pub use operation::{EntityKind, Operation};
pub use request::{Arguments, BatchCall, BatchRequest, ValuePair};
pub use response::{BatchResponse, MessageType, Signal};
pub use validation::{normalize_user_id, MAX_DOCUMENT_LEN, MAX_TEXT_LEN};
