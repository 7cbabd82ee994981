//! Row model for the bug table.
//!
//! Pure: turns the loaded bug list into what the widget paints.

use crate::model::{Bug, BugId, Priority};

/// Text shown when there are no bugs.
pub const EMPTY_MESSAGE: &str = "No Bugs Found";

/// Visual tone of a priority cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Warning,
    Danger,
}

impl Tone {
    /// Low is success, Medium is warning, everything else is danger.
    pub fn for_priority(label: &str) -> Self {
        match Priority::from_label(label) {
            Some(Priority::Low) => Tone::Success,
            Some(Priority::Medium) => Tone::Warning,
            Some(Priority::High) | None => Tone::Danger,
        }
    }
}

/// Emitted when a row's "Resolved" button is pressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRequest {
    pub bug_id: BugId,
    /// Assignee name as shown in the row; resolved to a user id by the caller.
    pub assigned_to: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BugRow {
    /// Single informational row for an empty list.
    Empty,
    Bug {
        description: String,
        priority: String,
        tone: Tone,
        assigned_to: String,
        create_by: String,
        resolve: ResolveRequest,
    },
}

impl BugRow {
    pub fn resolve_request(&self) -> Option<&ResolveRequest> {
        match self {
            BugRow::Empty => None,
            BugRow::Bug { resolve, .. } => Some(resolve),
        }
    }
}

/// One row per bug in list order, or a single [`BugRow::Empty`].
pub fn rows(bugs: &[Bug]) -> Vec<BugRow> {
    if bugs.is_empty() {
        return vec![BugRow::Empty];
    }

    bugs.iter()
        .map(|bug| BugRow::Bug {
            description: bug.description.clone(),
            priority: bug.priority.clone(),
            tone: Tone::for_priority(&bug.priority),
            assigned_to: bug.assigned_to.clone(),
            create_by: bug.create_by.clone(),
            resolve: ResolveRequest {
                bug_id: bug.id.clone(),
                assigned_to: bug.assigned_to.clone(),
            },
        })
        .collect()
}
