//! Bug table widget.

use super::rows::{BugRow, ResolveRequest, EMPTY_MESSAGE};
use crate::theme;
use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};

/// Row height for the header and body.
const ROW_HEIGHT: f32 = 28.0;
/// Table never grows past this; the form sits below it.
const MAX_TABLE_HEIGHT: f32 = 420.0;

const HEADERS: [&str; 5] = ["Description", "Priority", "Assigned To:", "Created By:", ""];

/// Render the bug table. Returns the row whose "Resolved" button was pressed.
pub fn render_bug_table(ui: &mut Ui, rows: &[BugRow], loading: bool) -> Option<ResolveRequest> {
    if loading {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label("Loading bugs...");
        });
        return None;
    }

    let mut resolved = None;

    TableBuilder::new(ui)
        .striped(true)
        .max_scroll_height(MAX_TABLE_HEIGHT)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::remainder().at_least(220.0))
        .column(Column::auto().at_least(80.0))
        .column(Column::auto().at_least(110.0))
        .column(Column::auto().at_least(110.0))
        .column(Column::auto().at_least(90.0))
        .header(ROW_HEIGHT, |mut header| {
            for title in HEADERS {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for row in rows {
                body.row(ROW_HEIGHT, |mut table_row| match row {
                    BugRow::Empty => {
                        table_row.col(|ui| {
                            ui.label(RichText::new(EMPTY_MESSAGE).italics().color(theme::text::MUTED));
                        });
                    }
                    BugRow::Bug {
                        description,
                        priority,
                        tone,
                        assigned_to,
                        create_by,
                        ..
                    } => {
                        table_row.col(|ui| {
                            ui.add(egui::Label::new(description).truncate());
                        });
                        table_row.col(|ui| {
                            // Badge tinted by priority
                            ui.label(
                                RichText::new(format!(" {} ", priority))
                                    .color(Color32::WHITE)
                                    .background_color(theme::tone_fill(*tone)),
                            );
                        });
                        table_row.col(|ui| {
                            ui.label(assigned_to);
                        });
                        table_row.col(|ui| {
                            ui.label(create_by);
                        });
                        table_row.col(|ui| {
                            if let Some(request) = row.resolve_request() {
                                if ui.button("Resolved").clicked() {
                                    resolved = Some(request.clone());
                                }
                            }
                        });
                    }
                });
            }
        });

    resolved
}
