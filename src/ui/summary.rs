use eframe::egui::Ui;
use egui_extras::{Column, TableBuilder};

use crate::state::AppState;
use crate::ui::swatch;

// ---------------------------------------------------------------------------
// Side panel – per-label counts
// ---------------------------------------------------------------------------

pub fn label_summary(ui: &mut Ui, state: &AppState) {
    ui.heading("Summary");
    ui.separator();

    let Some(ds) = &state.dataset else {
        ui.label("No dataset loaded.");
        return;
    };

    ui.label(format!("{} events", ds.len()));
    ui.label(format!("image shape (H,W,C): {}", ds.images.shape()));
    ui.label(format!("labelled: {}", ds.table.selected_count()));
    ui.add_space(6.0);

    let counts = ds.table.label_counts(state.config.labels.len());

    TableBuilder::new(ui)
        .striped(true)
        .column(Column::exact(18.0))
        .column(Column::remainder())
        .column(Column::auto())
        .header(20.0, |mut header| {
            header.col(|_ui: &mut Ui| {});
            header.col(|ui: &mut Ui| {
                ui.strong("label");
            });
            header.col(|ui: &mut Ui| {
                ui.strong("count");
            });
        })
        .body(|mut body| {
            for (i, (label, count)) in state.config.labels.iter().zip(&counts).enumerate() {
                body.row(18.0, |mut row| {
                    row.col(|ui: &mut Ui| swatch(ui, state.colors.color_for(i as u8)));
                    row.col(|ui: &mut Ui| {
                        if label.active {
                            ui.label(&label.name);
                        } else {
                            ui.weak(&label.name);
                        }
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(count.to_string());
                    });
                });
            }
        });
}
