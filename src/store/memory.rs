//! In-process store.

use super::BugStore;
use crate::error::{StoreError, StoreResult};
use crate::model::{Bug, BugId, NewBug, User, UserId};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Inner {
    bugs: Vec<Bug>,
    users: Vec<User>,
    next_id: u64,
}

impl Inner {
    fn next_key(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}{}", prefix, self.next_id)
    }

    fn user_mut(&mut self, id: &UserId) -> StoreResult<&mut User> {
        self.users
            .iter_mut()
            .find(|u| &u.id == id)
            .ok_or_else(|| StoreError::NotFound {
                collection: "users",
                id: id.to_string(),
            })
    }
}

/// Store that keeps both collections in memory for the life of the process.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding one user per name, each with no open bugs.
    pub fn with_users<S: AsRef<str>>(names: &[S]) -> Self {
        let store = Self::new();
        for name in names {
            store.add_user(name.as_ref());
        }
        store
    }

    /// Add a user and return its key.
    pub fn add_user(&self, name: &str) -> UserId {
        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let id = UserId(inner.next_key("u"));
        inner.users.push(User {
            id: id.clone(),
            name: name.to_string(),
            bug_count: 0,
        });
        id
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl BugStore for MemoryStore {
    fn list_bugs(&self) -> StoreResult<Vec<Bug>> {
        let mut bugs = self.lock()?.bugs.clone();
        bugs.sort_by_key(|b| b.order);
        Ok(bugs)
    }

    fn list_users(&self) -> StoreResult<Vec<User>> {
        let mut users = self.lock()?.users.clone();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    fn insert_bug(&self, bug: NewBug) -> StoreResult<BugId> {
        let mut inner = self.lock()?;
        let id = BugId(inner.next_key("b"));
        inner.bugs.push(Bug::from_new(id.clone(), bug));
        Ok(id)
    }

    fn delete_bug(&self, id: &BugId) -> StoreResult<()> {
        self.lock()?.bugs.retain(|b| &b.id != id);
        Ok(())
    }

    fn increment_bug_count(&self, user: &UserId) -> StoreResult<()> {
        self.lock()?.user_mut(user)?.bug_count += 1;
        Ok(())
    }

    fn decrement_bug_count(&self, user: &UserId) -> StoreResult<()> {
        self.lock()?.user_mut(user)?.bug_count -= 1;
        Ok(())
    }

    /// Delete and uncount under one lock; a bug that is already gone
    /// leaves the counter alone.
    fn resolve_bug(&self, id: &BugId, user: &UserId) -> StoreResult<()> {
        let mut inner = self.lock()?;
        let before = inner.bugs.len();
        inner.bugs.retain(|b| &b.id != id);
        if inner.bugs.len() < before {
            inner.user_mut(user)?.bug_count -= 1;
        } else {
            tracing::debug!(bug = %id, "Bug already gone, counter left alone");
        }
        Ok(())
    }
}
