//! Table state machine

use super::Draft;

/// Where the table is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableState {
    /// Nothing loaded yet.
    Idle,
    /// A list request is in flight.
    Loading,
    /// The cache holds the latest successful list.
    Ready,
    /// The latest list failed. The cache holds whatever was there before.
    Failed,
    /// The create/edit form is open.
    Editing,
}

/// What a submit will do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditMode {
    Create,
    Update { id: String },
}

impl EditMode {
    /// The record id when updating.
    pub fn id(&self) -> Option<&str> {
        match self {
            EditMode::Create => None,
            EditMode::Update { id } => Some(id),
        }
    }

    pub fn is_update(&self) -> bool {
        matches!(self, EditMode::Update { .. })
    }
}

/// The open create/edit form.
#[derive(Debug, Clone, PartialEq)]
pub struct Editor {
    pub mode: EditMode,
    pub draft: Draft,
    /// Message of the last failed submit, cleared on the next attempt.
    pub error: Option<String>,
}

impl Editor {
    pub(crate) fn new(mode: EditMode, draft: Draft) -> Self {
        Self {
            mode,
            draft,
            error: None,
        }
    }
}

/// Identifies one load. Newer loads carry larger tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(pub(crate) u64);

/// Result of applying a finished load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The cache was replaced.
    Applied,
    /// A newer load had already been applied, so this result was dropped.
    Stale,
}

/// Result of a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The user declined the confirmation. Nothing was sent.
    Cancelled,
    Deleted,
}
