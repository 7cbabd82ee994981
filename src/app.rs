//! Main application state and UI.

use crate::error::SyncError;
use crate::form::{BugForm, INVALID_MESSAGE, SUBMITTED_MESSAGE};
use crate::identity::CurrentUser;
use crate::notify::{NotificationBus, Notifier};
use crate::settings::{Settings, BANNER_SECS_MAX, BANNER_SECS_MIN};
use crate::store::{self, BugStore};
use crate::sync::{BugSync, SyncEvent};
use crate::table::{self, ResolveRequest};
use crate::theme;
use eframe::egui::{self, Color32, RichText};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const RESOLVED_MESSAGE: &str = "Bug Resolved!";

/// How long to wait for in-flight store work on exit.
const EXIT_SETTLE: Duration = Duration::from_secs(2);

/// Main bug tracker application
pub struct BugTrackerApp {
    // Store
    sync: Option<BugSync>,
    store_error: Option<String>,

    // UI state
    form: BugForm,
    current_user: CurrentUser,

    // Notifications
    bus: Option<NotificationBus>,
    notifier: Notifier,

    // Settings persistence
    settings: Settings,
    settings_dirty: bool,
    last_settings_save: Instant,
}

impl BugTrackerApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let settings = Settings::load();
        let mut app = Self::with_settings(settings);
        app.connect();
        app
    }

    /// App with no store attached yet.
    fn with_settings(settings: Settings) -> Self {
        let bus = NotificationBus::init(settings.banner_ttl());
        let notifier = bus.notifier();
        let current_user = CurrentUser::resolve(&settings.identity);
        tracing::info!(user = %current_user.display_name, "Signed in");

        Self {
            sync: None,
            store_error: None,
            form: BugForm::default(),
            current_user,
            bus: Some(bus),
            notifier,
            settings,
            settings_dirty: false,
            last_settings_save: Instant::now(),
        }
    }

    /// App mounted on an already-open store.
    pub fn with_store(settings: Settings, store: Arc<dyn BugStore>) -> Self {
        let mut app = Self::with_settings(settings);
        app.mount(store);
        app
    }

    fn connect(&mut self) {
        match store::open(&self.settings) {
            Ok(store) => self.mount(store),
            Err(e) => {
                tracing::error!("Failed to open store: {}", e);
                self.store_error = Some(e.to_string());
            }
        }
    }

    fn mount(&mut self, store: Arc<dyn BugStore>) {
        let mut sync = BugSync::new(store);
        sync.mount();
        self.sync = Some(sync);
        self.store_error = None;
    }

    /// File the bug described by the form.
    fn submit_new_bug(&mut self) {
        let Some(sync) = self.sync.as_mut() else {
            self.notifier.error("Not connected to a store");
            return;
        };

        match sync.add_bug(&self.form.draft, &self.current_user) {
            Ok(()) => {
                self.notifier.success(SUBMITTED_MESSAGE);
                self.form.reset();
            }
            Err(SyncError::Validation(field)) => {
                tracing::debug!(field, "New bug rejected");
                self.notifier.error(INVALID_MESSAGE);
            }
            Err(e) => self.notifier.error(e.to_string()),
        }
    }

    /// Handle a "Resolved" click from the table.
    fn resolve(&mut self, request: ResolveRequest) {
        let Some(sync) = self.sync.as_mut() else {
            return;
        };

        match sync.resolve(&request.bug_id, &request.assigned_to) {
            Ok(()) => self.notifier.success(RESOLVED_MESSAGE),
            Err(e) => self.notifier.error(e.to_string()),
        }
    }

    /// Re-query bugs and users, refreshing the per-user counters.
    fn reload(&mut self) {
        if let Some(sync) = self.sync.as_mut() {
            sync.reload_bugs();
            sync.reload_users();
        }
    }

    /// Change the name stamped on bugs filed from now on.
    fn rename_current_user(&mut self, name: String) {
        self.settings.identity.display_name = Some(name);
        self.current_user = CurrentUser::resolve(&self.settings.identity);
        self.mark_settings_dirty();
    }

    /// Apply finished store work and surface failures.
    fn poll_store(&mut self) {
        let events = match self.sync.as_mut() {
            Some(sync) => sync.poll(),
            None => return,
        };
        self.handle_sync_events(events);
    }

    fn handle_sync_events(&mut self, events: Vec<SyncEvent>) {
        for event in events {
            match event {
                SyncEvent::Failed { operation, error } => {
                    self.notifier
                        .error(format!("Store request failed ({}): {}", operation, error));
                }
                SyncEvent::Filed(id) => tracing::debug!(bug = %id, "Bug filed"),
                SyncEvent::Resolved(id) => tracing::debug!(bug = %id, "Bug resolved"),
                SyncEvent::BugsLoaded(count) => tracing::trace!(count, "Bug list refreshed"),
                SyncEvent::UsersLoaded(count) => tracing::trace!(count, "User list refreshed"),
            }
        }
    }

    fn mark_settings_dirty(&mut self) {
        self.settings_dirty = true;
    }

    /// Save settings if dirty and enough time has passed (debounce)
    fn maybe_save_settings(&mut self) {
        if self.settings_dirty && self.last_settings_save.elapsed().as_secs() >= 2 {
            self.settings.save();
            self.settings_dirty = false;
            self.last_settings_save = Instant::now();
        }
    }

    fn render_banners(&mut self, ui: &mut egui::Ui) {
        let Some(bus) = self.bus.as_mut() else {
            return;
        };

        let mut dismissed = None;
        for (index, banner) in bus.banners().iter().enumerate() {
            egui::Frame::none()
                .fill(theme::banner_fill(banner.notification.kind))
                .rounding(4.0)
                .inner_margin(egui::Margin::symmetric(10.0, 6.0))
                .show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(&banner.notification.message).color(theme::text::PRIMARY));
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.small_button("✕").clicked() {
                                dismissed = Some(index);
                            }
                        });
                    });
                });
            ui.add_space(4.0);
        }

        if let Some(index) = dismissed {
            bus.dismiss(index);
        }
    }

    fn render_sidebar(&mut self, ui: &mut egui::Ui) {
        ui.heading("Bug Tracker 🐛");
        ui.add_space(10.0);

        // Store status
        ui.horizontal(|ui| {
            if self.sync.is_some() {
                ui.colored_label(theme::state::SUCCESS, format!("● {}", self.settings.store.label()));
            } else {
                ui.colored_label(theme::state::DANGER, "● Disconnected");
                if ui.button("Retry").clicked() {
                    self.connect();
                }
            }
        });

        if let Some(ref err) = self.store_error {
            ui.colored_label(theme::state::DANGER, format!("Error: {}", err));
        }

        ui.add_space(10.0);

        if self.sync.is_some() && ui.button("⟳ Reload").clicked() {
            self.reload();
        }

        ui.add_space(10.0);

        egui::CollapsingHeader::new("Open bugs per user")
            .default_open(true)
            .show(ui, |ui| match self.sync.as_ref() {
                Some(sync) if !sync.users().is_empty() => {
                    // Users load on mount and on Reload only
                    ui.label(
                        RichText::new("As of last reload")
                            .small()
                            .color(theme::text::MUTED),
                    );
                    for user in sync.users() {
                        ui.horizontal(|ui| {
                            ui.label(&user.name);
                            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                                ui.label(RichText::new(user.bug_count.to_string()).strong());
                            });
                        });
                    }
                }
                _ => {
                    ui.label(RichText::new("No users loaded").color(theme::text::MUTED).italics());
                }
            });

        egui::CollapsingHeader::new("Settings")
            .default_open(false)
            .show(ui, |ui| {
                ui.label("Display name:");
                let mut name = self.current_user.display_name.clone();
                if ui.text_edit_singleline(&mut name).changed() {
                    self.rename_current_user(name);
                }

                ui.add_space(5.0);
                if ui
                    .add(egui::Slider::new(&mut self.settings.banner_secs, BANNER_SECS_MIN..=BANNER_SECS_MAX).text("Banner secs"))
                    .changed()
                {
                    self.mark_settings_dirty();
                }
                ui.label(
                    RichText::new("Banner duration applies on next start")
                        .small()
                        .color(theme::text::MUTED),
                );
            });
    }

    fn render_main(&mut self, ui: &mut egui::Ui) {
        self.render_banners(ui);

        let Some(sync) = self.sync.as_ref() else {
            ui.label(RichText::new("No store connected").color(theme::text::MUTED).italics());
            return;
        };

        let rows = table::rows(sync.bugs());
        let loading = sync.is_loading();
        let users = sync.users().to_vec();

        let resolved = table::render_bug_table(ui, &rows, loading);

        ui.add_space(16.0);
        ui.separator();
        ui.add_space(8.0);

        let submitted = self.form.render(ui, &users);

        if let Some(request) = resolved {
            self.resolve(request);
        }
        if submitted {
            self.submit_new_bug();
        }
    }
}

impl eframe::App for BugTrackerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.maybe_save_settings();
        self.poll_store();

        if let Some(bus) = self.bus.as_mut() {
            bus.pump(Instant::now());
            // Keep ticking so banners expire on time
            if !bus.banners().is_empty() {
                ctx.request_repaint_after(Duration::from_millis(250));
            }
        }

        // Still waiting on the store, check again next frame
        if self.sync.as_ref().map_or(false, |s| s.is_busy()) {
            ctx.request_repaint();
        }

        ctx.set_visuals(egui::Visuals::dark());

        egui::SidePanel::left("sidebar")
            .min_width(220.0)
            .frame(egui::Frame::none().fill(theme::bg::PANEL).inner_margin(egui::Margin::same(12.0)))
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.render_sidebar(ui);
                });
            });

        egui::CentralPanel::default()
            .frame(
                egui::Frame::none()
                    .fill(theme::bg::WINDOW)
                    .inner_margin(egui::Margin::same(16.0))
                    .stroke(egui::Stroke::new(1.0, Color32::from_gray(60))),
            )
            .show(ctx, |ui| {
                self.render_main(ui);
            });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Some(sync) = self.sync.as_mut() {
            sync.settle(EXIT_SETTLE);
        }
        if let Some(bus) = self.bus.take() {
            bus.teardown();
        }
        // Force save settings on exit
        if self.settings_dirty {
            self.settings.save();
        }
    }
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;
