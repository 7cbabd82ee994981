//! Native Bug Tracker
//!
//! A desktop app for filing and resolving bugs with per-user open-bug counters.

mod app;
mod error;
mod form;
mod identity;
mod model;
mod notify;
mod settings;
mod store;
mod sync;
mod table;
mod theme;

use eframe::egui;
use tracing_subscriber::EnvFilter;

fn main() -> eframe::Result<()> {
    // Initialize logging, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 720.0])
            .with_title("Bug Tracker"),
        persist_window: true,
        ..Default::default()
    };

    eframe::run_native(
        "Bug Tracker",
        options,
        Box::new(|cc| Ok(Box::new(app::BugTrackerApp::new(cc)))),
    )
}
