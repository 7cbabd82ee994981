//! New-bug form.

use crate::model::{Priority, User};
use crate::sync::BugDraft;
use eframe::egui::{self, Ui};

pub const SUBMITTED_MESSAGE: &str = "Bug Submitted!";
pub const INVALID_MESSAGE: &str = "Error occurred";

/// Placeholder entry of the assignee select.
const SELECT_USER: &str = "Select User";

#[derive(Debug, Default)]
pub struct BugForm {
    pub draft: BugDraft,
}

impl BugForm {
    /// Clear after a successful submit. The assignee stays selected.
    pub fn reset(&mut self) {
        self.draft.description.clear();
        self.draft.priority = Priority::default();
    }

    /// Render the form. Returns true when "Add New Bug" was pressed
    /// or Enter was hit in the description field.
    pub fn render(&mut self, ui: &mut Ui, users: &[User]) -> bool {
        let mut submitted = false;

        egui::Grid::new("new_bug_form")
            .num_columns(2)
            .spacing([12.0, 8.0])
            .show(ui, |ui| {
                ui.label("New bug description:");
                let response = ui.add(
                    egui::TextEdit::singleline(&mut self.draft.description)
                        .desired_width(f32::INFINITY),
                );
                if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    submitted = true;
                }
                ui.end_row();

                ui.label("New bug priority:");
                egui::ComboBox::from_id_salt("new_bug_priority")
                    .selected_text(self.draft.priority.label())
                    .show_ui(ui, |ui| {
                        for priority in Priority::ALL {
                            ui.selectable_value(&mut self.draft.priority, priority, priority.label());
                        }
                    });
                ui.end_row();

                ui.label("Assign to:");
                let selected = if self.draft.assignee.is_empty() {
                    SELECT_USER
                } else {
                    self.draft.assignee.as_str()
                };
                egui::ComboBox::from_id_salt("new_bug_assignee")
                    .selected_text(selected.to_string())
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut self.draft.assignee, String::new(), SELECT_USER);
                        for user in users {
                            ui.selectable_value(&mut self.draft.assignee, user.name.clone(), &user.name);
                        }
                    });
                ui.end_row();
            });

        ui.add_space(8.0);
        let button = egui::Button::new("Add New Bug").min_size(egui::vec2(ui.available_width(), 28.0));
        if ui.add(button).clicked() {
            submitted = true;
        }

        submitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_keeps_assignee() {
        let mut form = BugForm::default();
        form.draft.description = "Fix crash".to_string();
        form.draft.priority = Priority::High;
        form.draft.assignee = "Alice".to_string();

        form.reset();
        assert!(form.draft.description.is_empty());
        assert_eq!(form.draft.priority, Priority::Medium);
        assert_eq!(form.draft.assignee, "Alice");
    }
}
