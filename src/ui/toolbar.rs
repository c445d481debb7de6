use eframe::egui::{self, Button, Color32, RichText, Ui, Vec2};

use crate::state::{AppState, Status};

const BUTTON: Vec2 = Vec2::new(64.0, 48.0);

// ---------------------------------------------------------------------------
// Control bar (bottom panel)
// ---------------------------------------------------------------------------

/// Legend, page navigation, save/load and settings buttons.
pub fn control_bar(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        legend(ui, state);
        ui.separator();

        let loaded = state.dataset.is_some();
        if ui.add_enabled(loaded, Button::new("All").min_size(BUTTON)).clicked() {
            state.select_all();
        }
        if ui.add_enabled(loaded, Button::new("None").min_size(BUTTON)).clicked() {
            state.select_none();
        }

        ui.separator();

        if ui.add_enabled(loaded, Button::new("◀ Prev").min_size(BUTTON)).clicked() {
            state.prev_page();
        }
        ui.add_sized([96.0, BUTTON.y], egui::Label::new(state.page_indicator()));
        if ui.add_enabled(loaded, Button::new("Next ▶").min_size(BUTTON)).clicked() {
            state.next_page();
        }

        ui.separator();

        let save_text = if state.dirty { "Save *" } else { "Save" };
        if ui.add_enabled(loaded, Button::new(save_text).min_size(BUTTON)).clicked() {
            state.save();
        }
        if ui.add(Button::new("Load").min_size(BUTTON)).clicked() {
            open_file_dialog(state);
        }
        if ui.add(Button::new("Settings").min_size(BUTTON)).clicked() {
            state.show_settings = true;
        }

        match &state.status {
            Some(Status::Error(msg)) => {
                ui.label(RichText::new(msg).color(Color32::RED));
            }
            Some(Status::Info(msg)) => {
                ui.label(msg);
            }
            None => {}
        }
    });
}

/// Radio buttons for the enabled labels, two per column.
fn legend(ui: &mut Ui, state: &mut AppState) {
    let entries = state.legend();
    let active = state.config.active_label;
    let (top, bottom): (Vec<_>, Vec<_>) = entries
        .iter()
        .enumerate()
        .partition(|(n, _)| n % 2 == 0);

    egui::Grid::new("legend")
        .num_columns(top.len())
        .show(ui, |ui: &mut Ui| {
            for row in [top, bottom] {
                for (_, (id, name)) in row {
                    let text = RichText::new(name).color(state.colors.color_for(*id as u8));
                    if ui.radio(active == *id, text).clicked() {
                        state.set_active_label(*id);
                    }
                }
                ui.end_row();
            }
        });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open labeling dataset")
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        if state.dirty {
            log::warn!("Discarding unsaved labels of the previous dataset");
        }
        state.load(&path);
    }
}
