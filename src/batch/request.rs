//! Wire form of batch requests.

use serde::{Deserialize, Serialize};

use crate::expression::ExpressionNode;

use super::{EntityKind, Operation};

/// A batch as submitted by a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCall {
    /// Caller id, echoed in the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    /// Caller intention, echoed in the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intention: Option<String>,
    /// Caller correlation id, echoed in the response.
    #[serde(default, alias = "packet-id", skip_serializing_if = "Option::is_none")]
    pub packet_id: Option<String>,
    /// Requests in processing order.
    #[serde(default)]
    pub requests: Vec<BatchRequest>,
}

/// One request of a batch.
///
/// Labels stay strings on the wire so that an unknown label can be reported
/// as a missing parameter rather than a decoding failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    /// Entity kind label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    /// Operation label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    /// Sparse arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Arguments>,
}

impl BatchRequest {
    /// A request without arguments.
    #[must_use]
    pub fn new(entity: EntityKind, operation: Operation) -> Self {
        Self {
            entity: Some(entity.label().to_string()),
            operation: Some(operation.label().to_string()),
            arguments: None,
        }
    }

    /// Sets the arguments.
    #[must_use]
    pub fn with_arguments(mut self, arguments: Arguments) -> Self {
        self.arguments = Some(arguments);
        self
    }
}

/// One key/value pair of `arguments.values`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuePair {
    /// Annotation key, or `id` for search queries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Optional value type hint; carried but not interpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
}

impl ValuePair {
    /// A plain key/value pair.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            value: Some(value.into()),
            value_type: None,
        }
    }
}

/// Sparse request arguments; which fields are required depends on the
/// operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Arguments {
    /// Target model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    /// Subject individual of an edge, or class of a new individual.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Object individual of an edge, or class of a composite's object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    /// Relation id or label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicate: Option<String>,
    /// Target individual id or variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub individual: Option<String>,
    /// Type expressions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expressions: Option<Vec<ExpressionNode>>,
    /// Annotation pairs or query values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<ValuePair>>,
    /// Seed database for `generate`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db: Option<String>,
    /// Taxon context of a new model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxon_id: Option<String>,
    /// Exported document for `import`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_model: Option<String>,
    /// Rendering for `export-legacy`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Batch variable to bind a created individual to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assign_to_variable: Option<String>,
}

impl Arguments {
    /// Empty arguments.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `modelId`.
    #[must_use]
    pub fn model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    /// Sets `subject`.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Sets `object`.
    #[must_use]
    pub fn object(mut self, object: impl Into<String>) -> Self {
        self.object = Some(object.into());
        self
    }

    /// Sets `predicate`.
    #[must_use]
    pub fn predicate(mut self, predicate: impl Into<String>) -> Self {
        self.predicate = Some(predicate.into());
        self
    }

    /// Sets `individual`.
    #[must_use]
    pub fn individual(mut self, individual: impl Into<String>) -> Self {
        self.individual = Some(individual.into());
        self
    }

    /// Appends a type expression.
    #[must_use]
    pub fn expression(mut self, node: ExpressionNode) -> Self {
        self.expressions.get_or_insert_with(Vec::new).push(node);
        self
    }

    /// Appends a key/value pair.
    #[must_use]
    pub fn value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values
            .get_or_insert_with(Vec::new)
            .push(ValuePair::new(key, value));
        self
    }

    /// Sets `assignToVariable`.
    #[must_use]
    pub fn variable(mut self, name: impl Into<String>) -> Self {
        self.assign_to_variable = Some(name.into());
        self
    }
}
