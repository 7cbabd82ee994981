//! Bug table: a pure row model and the egui widget that paints it.

pub mod rows;
pub mod widget;

pub use rows::{rows, BugRow, ResolveRequest, Tone};
pub use widget::render_bug_table;
