//! Wire form of batch responses.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{EditError, ExecutionError};

const FAILED: &str = "Could not successfully complete batch request.";
const SAVE_FAILED: &str = "Save model failed due to a failed validation of the model";

/// Outcome class of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// Every request succeeded.
    Success,
    /// The batch was rejected.
    Error,
}

/// Hint telling clients how to apply `data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    /// Merge the rendered individuals into the client's copy.
    Merge,
    /// Replace the client's copy with the rendered model.
    Rebuild,
    /// Metadata only; no model rendering.
    Meta,
}

/// Response to one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    /// Free text.
    pub message: String,
    /// Success or error.
    pub message_type: MessageType,
    /// Error detail; present on errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commentary: Option<String>,
    /// Echoed caller id.
    #[serde(default)]
    pub uid: Option<String>,
    /// Echoed intention.
    #[serde(default)]
    pub intention: Option<String>,
    /// Echoed correlation id.
    #[serde(default)]
    pub packet_id: Option<String>,
    /// Rendering hint; absent on errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<Signal>,
    /// Operation-specific payload.
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl BatchResponse {
    pub(crate) fn new(uid: Option<&str>, intention: Option<&str>, packet_id: Option<&str>) -> Self {
        Self {
            message: String::new(),
            message_type: MessageType::Success,
            commentary: None,
            uid: uid.map(str::to_string),
            intention: intention.map(str::to_string),
            packet_id: packet_id.map(str::to_string),
            signal: None,
            data: Map::new(),
        }
    }

    pub(crate) fn succeed(mut self, message: String, signal: Signal, data: Map<String, Value>) -> Self {
        self.message = message;
        self.message_type = MessageType::Success;
        self.signal = Some(signal);
        self.data = data;
        self
    }

    pub(crate) fn fail(mut self, err: &EditError) -> Self {
        let commentary = err.commentary();
        self.message = match err {
            EditError::Execution(ExecutionError::ValidationFailed { .. }) => SAVE_FAILED.to_string(),
            _ => format!("{FAILED} {commentary}"),
        };
        self.message_type = MessageType::Error;
        self.commentary = Some(commentary);
        self.signal = None;
        self.data = Map::new();
        self
    }

    /// Returns true if the batch succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.message_type == MessageType::Success
    }

    /// One payload field.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}
