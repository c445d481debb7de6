use eframe::egui::{self, Context, DragValue, TextEdit, Ui};

use crate::config::LabelSpec;
use crate::state::AppState;
use crate::ui::swatch;

// ---------------------------------------------------------------------------
// Settings window
// ---------------------------------------------------------------------------

/// Render the settings window. Closing it (window X or "Apply") validates
/// and saves the settings; returns `true` on the frame it actually closes.
pub fn settings_window(ctx: &Context, state: &mut AppState) -> bool {
    let mut open = true;
    let mut apply = false;

    egui::Window::new("Settings")
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui: &mut Ui| {
            label_rows(ui, state);
            ui.separator();
            configuration(ui, state);
            ui.separator();
            ui.vertical_centered(|ui: &mut Ui| {
                apply = ui.button("Apply").clicked();
            });
        });

    if (!open || apply) && state.apply_settings() {
        state.show_settings = false;
        return true;
    }
    false
}

fn label_rows(ui: &mut Ui, state: &mut AppState) {
    ui.vertical_centered(|ui: &mut Ui| ui.heading("labels"));

    egui::Grid::new("label_rows")
        .num_columns(4)
        .spacing([8.0, 4.0])
        .show(ui, |ui: &mut Ui| {
            for (i, label) in state.config.labels.iter_mut().enumerate() {
                ui.label(i.to_string());
                swatch(ui, state.colors.color_for(i as u8));
                ui.add_enabled(
                    label.active,
                    TextEdit::singleline(&mut label.name).desired_width(128.0),
                );
                ui.checkbox(&mut label.active, "");
                ui.end_row();
            }
        });

    ui.horizontal(|ui: &mut Ui| {
        if ui.button("Add label").clicked() && state.config.labels.len() < 256 {
            let n = state.config.labels.len();
            state.config.labels.push(LabelSpec {
                name: format!("label {n}"),
                color: None,
                active: true,
            });
        }
        if ui.button("Remove last").clicked() && state.config.labels.len() > 1 {
            state.config.labels.pop();
        }
    });
}

fn configuration(ui: &mut Ui, state: &mut AppState) {
    ui.vertical_centered(|ui: &mut Ui| ui.heading("configuration"));

    ui.horizontal(|ui: &mut Ui| {
        if ui.button("select output directory").clicked() {
            if let Some(dir) = rfd::FileDialog::new()
                .set_title("Open Directory")
                .pick_folder()
            {
                state.config.output_dir = dir;
            }
        }
        ui.label(state.config.output_dir.display().to_string());
    });

    let config = &mut state.config;
    egui::Grid::new("configuration")
        .num_columns(2)
        .spacing([8.0, 4.0])
        .show(ui, |ui: &mut Ui| {
            ui.label("image key:");
            ui.add(TextEdit::singleline(&mut config.image_key).desired_width(96.0));
            ui.end_row();

            ui.label("label key:");
            ui.add(TextEdit::singleline(&mut config.label_key).desired_width(96.0));
            ui.end_row();

            ui.label("tile size [pixels]");
            ui.add(DragValue::new(&mut config.tile_size).range(9..=513));
            ui.end_row();

            ui.label("horizontal tile count");
            ui.add(DragValue::new(&mut config.x_size).range(1..=64));
            ui.end_row();

            ui.label("vertical tile count");
            ui.add(DragValue::new(&mut config.y_size).range(1..=64));
            ui.end_row();

            ui.label("export text file on save");
            ui.checkbox(&mut config.export_txt, "");
            ui.end_row();
        });
}
