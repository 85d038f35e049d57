//! Per-model undo/redo history.
//!
//! The log is two plain stacks of [`UndoEntry`]. Recording a new entry clears
//! the redo stack, so history stays linear. Entries carry both directions of
//! the edit; moving an entry between stacks hands the caller the change set to
//! apply.

mod change;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ModelId;

pub use change::{Change, ChangeSet};

/// Who made an edit, why, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorMetadata {
    /// Normalized user id; `None` for anonymous callers.
    pub user_id: Option<String>,
    /// Caller-supplied intention, e.g. `action`.
    pub intention: Option<String>,
    /// When the edit was applied.
    pub timestamp: DateTime<Utc>,
}

impl ActorMetadata {
    /// Metadata stamped now.
    #[must_use]
    pub fn now(user_id: Option<String>, intention: Option<String>) -> Self {
        Self {
            user_id,
            intention,
            timestamp: Utc::now(),
        }
    }
}

/// One reversible batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoEntry {
    /// Model the entry belongs to.
    pub model: ModelId,
    /// Changes as originally applied.
    pub forward: ChangeSet,
    /// Changes that undo `forward`.
    pub inverse: ChangeSet,
    /// Actor of the edit.
    pub actor: ActorMetadata,
}

/// Dual stack of reversible edits.
#[derive(Debug, Clone, Default)]
pub struct UndoLog {
    undo: Vec<UndoEntry>,
    redo: Vec<UndoEntry>,
}

impl UndoLog {
    /// Pushes a new entry and clears the redo stack.
    pub fn record(&mut self, model: ModelId, forward: ChangeSet, actor: ActorMetadata) {
        let inverse = forward.inverse();
        self.undo.push(UndoEntry {
            model,
            forward,
            inverse,
            actor,
        });
        self.redo.clear();
    }

    /// Moves the newest entry to the redo stack and returns its inverse.
    pub fn undo(&mut self) -> Option<ChangeSet> {
        let entry = self.undo.pop()?;
        let inverse = entry.inverse.clone();
        self.redo.push(entry);
        Some(inverse)
    }

    /// Moves the newest redo entry back and returns its forward changes.
    pub fn redo(&mut self) -> Option<ChangeSet> {
        let entry = self.redo.pop()?;
        let forward = entry.forward.clone();
        self.undo.push(entry);
        Some(forward)
    }

    /// `(undo depth, redo depth)`.
    #[must_use]
    pub fn counts(&self) -> (usize, usize) {
        (self.undo.len(), self.redo.len())
    }

    /// Undo entries, most recent first.
    pub fn undo_entries(&self) -> impl Iterator<Item = &UndoEntry> {
        self.undo.iter().rev()
    }

    /// Redo entries, most recent first.
    pub fn redo_entries(&self) -> impl Iterator<Item = &UndoEntry> {
        self.redo.iter().rev()
    }
}
