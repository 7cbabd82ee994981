//! Backing store for bug and user records.
//!
//! Two implementations:
//! - [`PgStore`]: PostgreSQL through sqlx
//! - [`MemoryStore`]: in-process, for trying the UI without a database and for tests

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::error::StoreResult;
use crate::model::{Bug, BugId, NewBug, User, UserId};
use crate::settings::{Settings, StoreKind};
use std::sync::Arc;

/// Blocking access to the `bugs` and `users` collections.
///
/// Calls may block; the sync layer only invokes them from worker threads.
pub trait BugStore: Send + Sync {
    /// All bugs, ascending by `order`.
    fn list_bugs(&self) -> StoreResult<Vec<Bug>>;

    /// All users, ascending by `name`.
    fn list_users(&self) -> StoreResult<Vec<User>>;

    /// Insert a bug and return its new key.
    fn insert_bug(&self, bug: NewBug) -> StoreResult<BugId>;

    /// Delete a bug. Deleting an absent id succeeds.
    fn delete_bug(&self, id: &BugId) -> StoreResult<()>;

    fn increment_bug_count(&self, user: &UserId) -> StoreResult<()>;

    fn decrement_bug_count(&self, user: &UserId) -> StoreResult<()>;

    /// Count the bug against its assignee, then insert it.
    ///
    /// Two independent writes: if the second fails the counter stays bumped.
    fn file_bug(&self, bug: NewBug) -> StoreResult<BugId> {
        self.increment_bug_count(&bug.assigned_to_id)?;
        self.insert_bug(bug)
    }

    /// Uncount the bug from its assignee, then delete it.
    ///
    /// Two independent writes, same caveat as [`BugStore::file_bug`]. This
    /// default does not check that the bug still exists, so resolving the
    /// same id twice decrements twice. [`PgStore`] and [`MemoryStore`]
    /// override it to move the counter only when a bug was deleted.
    fn resolve_bug(&self, id: &BugId, user: &UserId) -> StoreResult<()> {
        self.decrement_bug_count(user)?;
        self.delete_bug(id)
    }
}

/// Open the store selected in settings.
pub fn open(settings: &Settings) -> StoreResult<Arc<dyn BugStore>> {
    match settings.store {
        StoreKind::Postgres => {
            let store = PgStore::connect(&settings.database_url(), settings.max_connections)?;
            Ok(Arc::new(store))
        }
        StoreKind::Memory => {
            tracing::info!(users = settings.seed_users.len(), "Using in-memory store");
            Ok(Arc::new(MemoryStore::with_users(&settings.seed_users)))
        }
    }
}
