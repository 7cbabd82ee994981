use super::*;
use crate::error::{StoreError, StoreResult};
use crate::model::{Bug, BugId, NewBug, Priority, User, UserId};
use crate::notify::NotificationKind;
use crate::store::MemoryStore;

const WAIT: Duration = Duration::from_secs(5);

fn app_with(store: Arc<dyn BugStore>) -> BugTrackerApp {
    let mut app = BugTrackerApp::with_store(Settings::default(), store);
    settle(&mut app);
    app
}

fn settle(app: &mut BugTrackerApp) {
    let events = app.sync.as_mut().unwrap().settle(WAIT);
    app.handle_sync_events(events);
}

/// Drain the bus and return what is on screen.
fn banners(app: &mut BugTrackerApp) -> Vec<(NotificationKind, String)> {
    let bus = app.bus.as_mut().unwrap();
    bus.pump(Instant::now());
    bus.banners()
        .iter()
        .map(|b| (b.notification.kind, b.notification.message.clone()))
        .collect()
}

fn fill_form(app: &mut BugTrackerApp, description: &str, priority: Priority, assignee: &str) {
    app.form.draft.description = description.to_string();
    app.form.draft.priority = priority;
    app.form.draft.assignee = assignee.to_string();
}

fn bug_count(store: &MemoryStore, name: &str) -> i64 {
    store
        .list_users()
        .unwrap()
        .into_iter()
        .find(|u| u.name == name)
        .unwrap()
        .bug_count
}

#[test]
fn submit_files_bug_and_clears_form() {
    let store = Arc::new(MemoryStore::with_users(&["Alice"]));
    let mut app = app_with(store.clone());

    fill_form(&mut app, "Fix crash", Priority::High, "Alice");
    app.submit_new_bug();
    settle(&mut app);

    assert_eq!(
        banners(&mut app),
        vec![(NotificationKind::Success, SUBMITTED_MESSAGE.to_string())]
    );
    assert!(app.form.draft.description.is_empty());
    assert_eq!(app.form.draft.priority, Priority::Medium);
    assert_eq!(app.form.draft.assignee, "Alice");

    let bugs = app.sync.as_ref().unwrap().bugs();
    assert_eq!(bugs.len(), 1);
    assert_eq!(bugs[0].create_by, app.current_user.display_name);
    assert_eq!(bug_count(&store, "Alice"), 1);
}

#[test]
fn empty_description_is_rejected() {
    let store = Arc::new(MemoryStore::with_users(&["Alice"]));
    let mut app = app_with(store.clone());

    fill_form(&mut app, "", Priority::High, "Alice");
    app.submit_new_bug();

    assert_eq!(
        banners(&mut app),
        vec![(NotificationKind::Error, INVALID_MESSAGE.to_string())]
    );
    assert_eq!(app.form.draft.priority, Priority::High);
    assert!(store.list_bugs().unwrap().is_empty());
    assert_eq!(bug_count(&store, "Alice"), 0);
}

#[test]
fn missing_assignee_is_rejected() {
    let store = Arc::new(MemoryStore::with_users(&["Alice"]));
    let mut app = app_with(store.clone());

    fill_form(&mut app, "Fix crash", Priority::Low, "");
    app.submit_new_bug();

    assert_eq!(
        banners(&mut app),
        vec![(NotificationKind::Error, INVALID_MESSAGE.to_string())]
    );
    assert_eq!(app.form.draft.description, "Fix crash");
    assert!(store.list_bugs().unwrap().is_empty());
}

#[test]
fn unknown_assignee_reports_lookup_error() {
    let store = Arc::new(MemoryStore::with_users(&["Alice"]));
    let mut app = app_with(store.clone());

    fill_form(&mut app, "Fix crash", Priority::High, "Mallory");
    app.submit_new_bug();

    let shown = banners(&mut app);
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].0, NotificationKind::Error);
    assert!(shown[0].1.contains("Mallory"));
    assert!(store.list_bugs().unwrap().is_empty());
}

#[test]
fn resolve_click_deletes_and_notifies() {
    let store = Arc::new(MemoryStore::with_users(&["Alice"]));
    let mut app = app_with(store.clone());
    fill_form(&mut app, "Fix crash", Priority::High, "Alice");
    app.submit_new_bug();
    settle(&mut app);
    banners(&mut app);
    app.bus.as_mut().unwrap().dismiss(0);

    let rows = table::rows(app.sync.as_ref().unwrap().bugs());
    let request = rows[0].resolve_request().cloned().unwrap();
    app.resolve(request);
    settle(&mut app);

    assert_eq!(
        banners(&mut app),
        vec![(NotificationKind::Success, RESOLVED_MESSAGE.to_string())]
    );
    assert!(app.sync.as_ref().unwrap().bugs().is_empty());
    assert_eq!(bug_count(&store, "Alice"), 0);
}

#[test]
fn resolve_for_unknown_assignee_writes_nothing() {
    let store = Arc::new(MemoryStore::with_users(&["Alice"]));
    let mut app = app_with(store.clone());
    fill_form(&mut app, "Fix crash", Priority::High, "Alice");
    app.submit_new_bug();
    settle(&mut app);
    app.bus.as_mut().unwrap().pump(Instant::now());
    app.bus.as_mut().unwrap().dismiss(0);

    let bug_id = app.sync.as_ref().unwrap().bugs()[0].id.clone();
    app.resolve(ResolveRequest {
        bug_id,
        assigned_to: "Someone Else".to_string(),
    });

    let shown = banners(&mut app);
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].0, NotificationKind::Error);
    assert_eq!(store.list_bugs().unwrap().len(), 1);
    assert_eq!(bug_count(&store, "Alice"), 1);
}

/// Store that is always down.
struct DownStore;

impl DownStore {
    fn down<T>() -> StoreResult<T> {
        Err(StoreError::Unavailable("down for maintenance".to_string()))
    }
}

impl BugStore for DownStore {
    fn list_bugs(&self) -> StoreResult<Vec<Bug>> {
        Self::down()
    }
    fn list_users(&self) -> StoreResult<Vec<User>> {
        Self::down()
    }
    fn insert_bug(&self, _bug: NewBug) -> StoreResult<BugId> {
        Self::down()
    }
    fn delete_bug(&self, _id: &BugId) -> StoreResult<()> {
        Self::down()
    }
    fn increment_bug_count(&self, _user: &UserId) -> StoreResult<()> {
        Self::down()
    }
    fn decrement_bug_count(&self, _user: &UserId) -> StoreResult<()> {
        Self::down()
    }
}

#[test]
fn store_failures_surface_as_errors_and_stay_loading() {
    let mut app = app_with(Arc::new(DownStore));

    let shown = banners(&mut app);
    assert_eq!(shown.len(), 2);
    assert!(shown.iter().all(|(kind, _)| *kind == NotificationKind::Error));
    assert!(app.sync.as_ref().unwrap().is_loading());
}

#[test]
fn oversized_banner_duration_is_clamped() {
    let mut settings = Settings::default();
    settings.banner_secs = 1e30;
    let mut app = BugTrackerApp::with_store(settings, Arc::new(MemoryStore::new()));
    settle(&mut app);

    app.notifier.success("hello");
    let bus = app.bus.as_mut().unwrap();
    let start = Instant::now();
    bus.pump(start);
    assert_eq!(bus.banners().len(), 1);
    bus.pump(start + Duration::from_secs(16));
    assert!(bus.banners().is_empty());
}

#[test]
fn reload_refreshes_per_user_counts() {
    let store = Arc::new(MemoryStore::with_users(&["Alice"]));
    let mut app = app_with(store.clone());

    fill_form(&mut app, "Fix crash", Priority::High, "Alice");
    app.submit_new_bug();
    settle(&mut app);

    // Counters are a snapshot from mount until the next reload
    assert_eq!(app.sync.as_ref().unwrap().users()[0].bug_count, 0);

    app.reload();
    settle(&mut app);
    assert_eq!(app.sync.as_ref().unwrap().users()[0].bug_count, 1);
    assert_eq!(bug_count(&store, "Alice"), 1);
}

#[test]
fn renamed_user_is_stamped_on_later_bugs() {
    let store = Arc::new(MemoryStore::with_users(&["Alice"]));
    let mut app = app_with(store.clone());

    app.rename_current_user("Dana".to_string());
    assert!(app.settings_dirty);

    fill_form(&mut app, "Fix crash", Priority::Low, "Alice");
    app.submit_new_bug();
    settle(&mut app);

    let bugs = store.list_bugs().unwrap();
    assert_eq!(bugs.len(), 1);
    assert_eq!(bugs[0].create_by, "Dana");
}
