//! Bug and user records as held by the backing store.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned key of a bug record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BugId(pub String);

/// Store-assigned key of a user record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for BugId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BugId {
    fn from(s: &str) -> Self {
        BugId(s.to_string())
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        UserId(s.to_string())
    }
}

/// Bug priority as chosen in the new-bug form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// All priorities in the order the form lists them.
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    /// Label stored in the `priority` column and shown in the table.
    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }

    /// Sort key: ascending order puts High first.
    pub fn order(&self) -> i32 {
        match self {
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }

    /// Parse a stored label. Only the exact labels are recognized.
    pub fn from_label(label: &str) -> Option<Self> {
        Priority::ALL.into_iter().find(|p| p.label() == label)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A bug record loaded from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bug {
    pub id: BugId,
    pub description: String,
    /// Raw stored label; not guaranteed to be one of the three known priorities.
    pub priority: String,
    pub order: i32,
    pub create_by: String,
    pub create_by_id: String,
    pub assigned_to: String,
    pub assigned_to_id: UserId,
}

impl Bug {
    pub fn from_new(id: BugId, new: NewBug) -> Self {
        Self {
            id,
            description: new.description,
            priority: new.priority.label().to_string(),
            order: new.order,
            create_by: new.create_by,
            create_by_id: new.create_by_id,
            assigned_to: new.assigned_to,
            assigned_to_id: new.assigned_to_id,
        }
    }
}

/// A bug about to be inserted; the store assigns its id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBug {
    pub description: String,
    pub priority: Priority,
    pub order: i32,
    pub create_by: String,
    pub create_by_id: String,
    pub assigned_to: String,
    pub assigned_to_id: UserId,
}

/// A user record loaded from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub bug_count: i64,
}
