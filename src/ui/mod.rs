pub mod grid;
pub mod settings;
pub mod summary;
pub mod toolbar;

use eframe::egui::{Color32, Sense, Ui, Vec2};

/// Small filled square in a label's colour.
pub fn swatch(ui: &mut Ui, color: Color32) {
    let (rect, _) = ui.allocate_exact_size(Vec2::splat(14.0), Sense::hover());
    ui.painter().rect_filled(rect, 2.0, color);
}
