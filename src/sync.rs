//! Bridge between the backing store and the UI.
//!
//! Holds the loaded bug and user lists. Every store call runs on a worker
//! thread and reports back over a channel; [`BugSync::poll`] applies the
//! results on the UI thread. Mutations always end with a full bug-list reload.

use crate::error::{StoreError, StoreResult, SyncError};
use crate::identity::CurrentUser;
use crate::model::{Bug, BugId, NewBug, Priority, User, UserId};
use crate::store::BugStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What the user typed into the new-bug form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BugDraft {
    pub description: String,
    pub priority: Priority,
    /// Assignee display name; empty when nothing is selected.
    pub assignee: String,
}

/// Outcome of background work, reported from [`BugSync::poll`].
#[derive(Debug)]
pub enum SyncEvent {
    BugsLoaded(usize),
    UsersLoaded(usize),
    Filed(BugId),
    Resolved(BugId),
    Failed {
        operation: &'static str,
        error: StoreError,
    },
}

enum Mutation {
    File,
    Resolve,
}

enum Completion {
    Bugs {
        seq: u64,
        result: StoreResult<Vec<Bug>>,
    },
    Users(StoreResult<Vec<User>>),
    Mutated {
        mutation: Mutation,
        result: StoreResult<BugId>,
        seq: u64,
        reload: StoreResult<Vec<Bug>>,
    },
}

pub struct BugSync {
    store: Arc<dyn BugStore>,
    /// None until the first bug-list load lands.
    bugs: Option<Vec<Bug>>,
    users: Vec<User>,

    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    pending: usize,

    // Bug-list reads are stamped when they start; a read that started
    // later never loses to one that started earlier.
    read_stamps: Arc<AtomicU64>,
    applied_seq: u64,
}

impl BugSync {
    pub fn new(store: Arc<dyn BugStore>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            store,
            bugs: None,
            users: Vec::new(),
            tx,
            rx,
            pending: 0,
            read_stamps: Arc::new(AtomicU64::new(0)),
            applied_seq: 0,
        }
    }

    /// Initial load of both collections.
    pub fn mount(&mut self) {
        tracing::info!("Loading bugs and users");
        self.reload_bugs();
        self.reload_users();
    }

    pub fn reload_bugs(&mut self) {
        let stamps = Arc::clone(&self.read_stamps);
        self.spawn(move |store| {
            let (seq, result) = read_bugs(store, &stamps);
            Completion::Bugs { seq, result }
        });
    }

    pub fn reload_users(&mut self) {
        self.spawn(|store| Completion::Users(store.list_users()));
    }

    /// Loaded bugs, ascending by `order`. Empty while loading.
    pub fn bugs(&self) -> &[Bug] {
        self.bugs.as_deref().unwrap_or(&[])
    }

    /// Loaded users, ascending by name.
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// True until the first bug-list load has been applied.
    pub fn is_loading(&self) -> bool {
        self.bugs.is_none()
    }

    /// Whether background work is still outstanding.
    pub fn is_busy(&self) -> bool {
        self.pending > 0
    }

    /// Exact-name match against the loaded users.
    pub fn lookup_user(&self, name: &str) -> Result<&User, SyncError> {
        self.users
            .iter()
            .find(|u| u.name == name)
            .ok_or_else(|| SyncError::UserNotFound(name.to_string()))
    }

    /// Validate the draft, resolve its assignee and file the bug.
    ///
    /// Errors are returned before anything is written.
    pub fn add_bug(&mut self, draft: &BugDraft, author: &CurrentUser) -> Result<(), SyncError> {
        if draft.description.trim().is_empty() {
            return Err(SyncError::Validation("description"));
        }
        if draft.assignee.is_empty() {
            return Err(SyncError::Validation("assignee"));
        }
        let assignee = self.lookup_user(&draft.assignee)?;

        let bug = NewBug {
            description: draft.description.clone(),
            priority: draft.priority,
            order: draft.priority.order(),
            create_by: author.display_name.clone(),
            create_by_id: author.uid.clone(),
            assigned_to: assignee.name.clone(),
            assigned_to_id: assignee.id.clone(),
        };
        tracing::info!(
            priority = %bug.priority,
            assignee = %bug.assigned_to,
            "Filing bug"
        );

        let stamps = Arc::clone(&self.read_stamps);
        self.spawn(move |store| {
            let result = store.file_bug(bug);
            let (seq, reload) = read_bugs(store, &stamps);
            Completion::Mutated {
                mutation: Mutation::File,
                result,
                seq,
                reload,
            }
        });
        Ok(())
    }

    /// Resolve a bug from the table: find the assignee by name, then delete.
    pub fn resolve(&mut self, bug_id: &BugId, assigned_to: &str) -> Result<(), SyncError> {
        let user_id = self.lookup_user(assigned_to)?.id.clone();
        self.delete_bug(bug_id.clone(), user_id);
        Ok(())
    }

    /// Drop a bug and its assignee's counter, then reload.
    pub fn delete_bug(&mut self, bug_id: BugId, user_id: UserId) {
        tracing::info!(bug = %bug_id, user = %user_id, "Resolving bug");
        let stamps = Arc::clone(&self.read_stamps);
        self.spawn(move |store| {
            let result = store.resolve_bug(&bug_id, &user_id).map(|_| bug_id);
            let (seq, reload) = read_bugs(store, &stamps);
            Completion::Mutated {
                mutation: Mutation::Resolve,
                result,
                seq,
                reload,
            }
        });
    }

    /// Apply finished background work. Failures keep the previous state.
    pub fn poll(&mut self) -> Vec<SyncEvent> {
        let mut events = Vec::new();
        while let Ok(completion) = self.rx.try_recv() {
            self.pending = self.pending.saturating_sub(1);
            self.apply(completion, &mut events);
        }
        events
    }

    /// Block until all outstanding work has reported or `timeout` passes,
    /// applying results as they arrive.
    pub fn settle(&mut self, timeout: Duration) -> Vec<SyncEvent> {
        let deadline = Instant::now() + timeout;
        let mut events = Vec::new();
        while self.pending > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(completion) => {
                    self.pending -= 1;
                    self.apply(completion, &mut events);
                }
                Err(RecvTimeoutError::Timeout) => {
                    tracing::warn!(pending = self.pending, "Store work did not settle in time");
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        events
    }

    fn apply(&mut self, completion: Completion, events: &mut Vec<SyncEvent>) {
        match completion {
            Completion::Bugs { seq, result } => self.apply_bugs(seq, result, events),
            Completion::Users(Ok(users)) => {
                tracing::debug!(count = users.len(), "Users loaded");
                events.push(SyncEvent::UsersLoaded(users.len()));
                self.users = users;
            }
            Completion::Users(Err(error)) => fail("load users", error, events),
            Completion::Mutated {
                mutation,
                result,
                seq,
                reload,
            } => {
                match (mutation, result) {
                    (Mutation::File, Ok(id)) => events.push(SyncEvent::Filed(id)),
                    (Mutation::Resolve, Ok(id)) => events.push(SyncEvent::Resolved(id)),
                    (Mutation::File, Err(error)) => fail("file bug", error, events),
                    (Mutation::Resolve, Err(error)) => fail("resolve bug", error, events),
                }
                self.apply_bugs(seq, reload, events);
            }
        }
    }

    fn apply_bugs(&mut self, seq: u64, result: StoreResult<Vec<Bug>>, events: &mut Vec<SyncEvent>) {
        match result {
            Ok(bugs) if seq >= self.applied_seq => {
                tracing::debug!(count = bugs.len(), seq, "Bugs loaded");
                self.applied_seq = seq;
                events.push(SyncEvent::BugsLoaded(bugs.len()));
                self.bugs = Some(bugs);
            }
            Ok(_) => tracing::debug!(seq, applied = self.applied_seq, "Stale bug list ignored"),
            Err(error) => fail("load bugs", error, events),
        }
    }

    fn spawn<F>(&mut self, job: F)
    where
        F: FnOnce(&dyn BugStore) -> Completion + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let tx = self.tx.clone();
        self.pending += 1;
        std::thread::spawn(move || {
            // Receiver gone means the view was torn down; drop the result.
            let _ = tx.send(job(store.as_ref()));
        });
    }
}

/// Stamp a bug-list read and run it.
fn read_bugs(store: &dyn BugStore, stamps: &AtomicU64) -> (u64, StoreResult<Vec<Bug>>) {
    let seq = stamps.fetch_add(1, Ordering::SeqCst) + 1;
    (seq, store.list_bugs())
}

fn fail(operation: &'static str, error: StoreError, events: &mut Vec<SyncEvent>) {
    tracing::error!(operation, "Store request failed: {}", error);
    events.push(SyncEvent::Failed { operation, error });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::atomic::AtomicBool;

    const WAIT: Duration = Duration::from_secs(5);

    fn author() -> CurrentUser {
        CurrentUser::new("me-1", "Reporter")
    }

    fn draft(description: &str, priority: Priority, assignee: &str) -> BugDraft {
        BugDraft {
            description: description.to_string(),
            priority,
            assignee: assignee.to_string(),
        }
    }

    fn mounted(store: Arc<MemoryStore>) -> BugSync {
        let mut sync = BugSync::new(store);
        sync.mount();
        sync.settle(WAIT);
        sync
    }

    fn count_for(store: &MemoryStore, name: &str) -> i64 {
        store
            .list_users()
            .unwrap()
            .into_iter()
            .find(|u| u.name == name)
            .map(|u| u.bug_count)
            .unwrap()
    }

    #[test]
    fn loading_until_first_bug_list() {
        let store = Arc::new(MemoryStore::with_users(&["Alice"]));
        let mut sync = BugSync::new(store);
        assert!(sync.is_loading());
        assert!(sync.bugs().is_empty());

        sync.mount();
        sync.settle(WAIT);
        assert!(!sync.is_loading());
        assert!(!sync.is_busy());
        assert_eq!(sync.users().len(), 1);
    }

    #[test]
    fn add_high_bug_counts_and_sorts_first() {
        let store = Arc::new(MemoryStore::new());
        let alice = store.add_user("Alice");
        store.add_user("Bob");
        let mut sync = mounted(store.clone());

        sync.add_bug(&draft("Slow page", Priority::Medium, "Bob"), &author())
            .unwrap();
        sync.add_bug(&draft("Typo", Priority::Low, "Bob"), &author())
            .unwrap();
        sync.settle(WAIT);

        sync.add_bug(&draft("Fix crash", Priority::High, "Alice"), &author())
            .unwrap();
        let events = sync.settle(WAIT);
        assert!(events.iter().any(|e| matches!(e, SyncEvent::Filed(_))));

        let first = &sync.bugs()[0];
        assert_eq!(first.description, "Fix crash");
        assert_eq!(first.order, 1);
        assert_eq!(first.priority, "High");
        assert_eq!(first.assigned_to, "Alice");
        assert_eq!(first.assigned_to_id, alice);
        assert_eq!(first.create_by, "Reporter");
        assert_eq!(first.create_by_id, "me-1");

        let orders: Vec<_> = sync.bugs().iter().map(|b| b.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
        assert_eq!(count_for(&store, "Alice"), 1);
        assert_eq!(count_for(&store, "Bob"), 2);
    }

    #[test]
    fn resolve_decrements_and_removes() {
        let store = Arc::new(MemoryStore::with_users(&["Alice"]));
        let mut sync = mounted(store.clone());

        sync.add_bug(&draft("Fix crash", Priority::High, "Alice"), &author())
            .unwrap();
        sync.settle(WAIT);
        let bug = sync.bugs()[0].clone();

        sync.resolve(&bug.id, &bug.assigned_to).unwrap();
        let events = sync.settle(WAIT);
        assert!(events
            .iter()
            .any(|e| matches!(e, SyncEvent::Resolved(id) if *id == bug.id)));

        assert!(sync.bugs().is_empty());
        assert_eq!(count_for(&store, "Alice"), 0);
    }

    #[test]
    fn validation_errors_write_nothing() {
        let store = Arc::new(MemoryStore::with_users(&["Alice"]));
        let mut sync = mounted(store.clone());

        let err = sync
            .add_bug(&draft("   ", Priority::High, "Alice"), &author())
            .unwrap_err();
        assert!(matches!(err, SyncError::Validation("description")));

        let err = sync
            .add_bug(&draft("Fix crash", Priority::High, ""), &author())
            .unwrap_err();
        assert!(matches!(err, SyncError::Validation("assignee")));

        assert!(!sync.is_busy());
        assert!(store.list_bugs().unwrap().is_empty());
        assert_eq!(count_for(&store, "Alice"), 0);
    }

    #[test]
    fn unknown_assignee_is_a_lookup_error() {
        let store = Arc::new(MemoryStore::with_users(&["Alice"]));
        let mut sync = mounted(store.clone());

        let err = sync
            .add_bug(&draft("Fix crash", Priority::High, "Mallory"), &author())
            .unwrap_err();
        assert!(matches!(err, SyncError::UserNotFound(ref name) if name == "Mallory"));
        assert!(!sync.is_busy());
        assert!(store.list_bugs().unwrap().is_empty());
    }

    #[test]
    fn resolving_for_unknown_user_writes_nothing() {
        let store = Arc::new(MemoryStore::with_users(&["Alice"]));
        let mut sync = mounted(store.clone());
        sync.add_bug(&draft("Fix crash", Priority::High, "Alice"), &author())
            .unwrap();
        sync.settle(WAIT);
        let bug = sync.bugs()[0].clone();

        let err = sync.resolve(&bug.id, "alice").unwrap_err();
        assert!(matches!(err, SyncError::UserNotFound(_)));
        assert!(!sync.is_busy());
        assert_eq!(store.list_bugs().unwrap().len(), 1);
        assert_eq!(count_for(&store, "Alice"), 1);
    }

    #[test]
    fn users_added_elsewhere_need_explicit_reload() {
        let store = Arc::new(MemoryStore::with_users(&["Alice"]));
        let mut sync = mounted(store.clone());

        store.add_user("Bob");
        sync.add_bug(&draft("Fix crash", Priority::Low, "Alice"), &author())
            .unwrap();
        sync.settle(WAIT);
        assert!(sync.lookup_user("Bob").is_err());

        sync.reload_users();
        sync.settle(WAIT);
        assert!(sync.lookup_user("Bob").is_ok());
    }

    #[test]
    fn count_never_negative_sequentially() {
        let store = Arc::new(MemoryStore::with_users(&["Alice"]));
        let mut sync = mounted(store.clone());

        for _ in 0..3 {
            sync.add_bug(&draft("Flaky test", Priority::Medium, "Alice"), &author())
                .unwrap();
            sync.settle(WAIT);
        }
        while let Some(bug) = sync.bugs().first().cloned() {
            sync.resolve(&bug.id, &bug.assigned_to).unwrap();
            sync.settle(WAIT);
            assert!(count_for(&store, "Alice") >= 0);
        }
        assert_eq!(count_for(&store, "Alice"), 0);
    }

    /// Store whose reads can be switched off after the first load.
    struct FlakyStore {
        inner: MemoryStore,
        broken: AtomicBool,
    }

    impl FlakyStore {
        fn check(&self) -> StoreResult<()> {
            if self.broken.load(Ordering::SeqCst) {
                Err(StoreError::Unavailable("offline".to_string()))
            } else {
                Ok(())
            }
        }
    }

    impl BugStore for FlakyStore {
        fn list_bugs(&self) -> StoreResult<Vec<Bug>> {
            self.check()?;
            self.inner.list_bugs()
        }
        fn list_users(&self) -> StoreResult<Vec<User>> {
            self.check()?;
            self.inner.list_users()
        }
        fn insert_bug(&self, bug: NewBug) -> StoreResult<BugId> {
            self.check()?;
            self.inner.insert_bug(bug)
        }
        fn delete_bug(&self, id: &BugId) -> StoreResult<()> {
            self.check()?;
            self.inner.delete_bug(id)
        }
        fn increment_bug_count(&self, user: &UserId) -> StoreResult<()> {
            self.check()?;
            self.inner.increment_bug_count(user)
        }
        fn decrement_bug_count(&self, user: &UserId) -> StoreResult<()> {
            self.check()?;
            self.inner.decrement_bug_count(user)
        }
    }

    #[test]
    fn store_failure_keeps_previous_state() {
        let store = Arc::new(FlakyStore {
            inner: MemoryStore::with_users(&["Alice"]),
            broken: AtomicBool::new(false),
        });
        let mut sync = BugSync::new(store.clone());
        sync.mount();
        sync.settle(WAIT);
        sync.add_bug(&draft("Fix crash", Priority::High, "Alice"), &author())
            .unwrap();
        sync.settle(WAIT);
        assert_eq!(sync.bugs().len(), 1);

        store.broken.store(true, Ordering::SeqCst);
        sync.reload_bugs();
        sync.reload_users();
        let events = sync.settle(WAIT);

        let failures = events
            .iter()
            .filter(|e| matches!(e, SyncEvent::Failed { .. }))
            .count();
        assert_eq!(failures, 2);
        assert_eq!(sync.bugs().len(), 1);
        assert_eq!(sync.users().len(), 1);
        assert!(!sync.is_loading());
    }
}
