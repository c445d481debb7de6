use std::collections::HashMap;

use eframe::egui::{
    self, Color32, ColorImage, Context, Rect, Sense, Stroke, StrokeKind, TextureHandle,
    TextureOptions, Ui, Vec2, pos2,
};

use crate::data::model::Dataset;
use crate::state::AppState;

/// Border width around each tile, in points.
const BORDER: f32 = 4.0;

// ---------------------------------------------------------------------------
// Texture cache
// ---------------------------------------------------------------------------

/// GPU textures for the tiles of the current page.
#[derive(Default)]
pub struct TileTextures {
    generation: u64,
    textures: HashMap<usize, TextureHandle>,
}

impl TileTextures {
    /// Drop everything after a reload and anything no longer on screen.
    fn sync(&mut self, state: &AppState) {
        if self.generation != state.generation {
            self.textures.clear();
            self.generation = state.generation;
            return;
        }
        let first = state.pager.index(0, 0);
        let last = first + state.pager.page_size();
        self.textures.retain(|id, _| (first..last).contains(id));
    }

    fn texture(&mut self, ctx: &Context, dataset: &Dataset, id: usize) -> Option<&TextureHandle> {
        if !self.textures.contains_key(&id) {
            let thumb = dataset.thumbnails.get(id)?;
            let size = [thumb.width() as usize, thumb.height() as usize];
            let image = ColorImage::from_rgb(size, thumb.as_raw());
            let handle = ctx.load_texture(format!("tile-{id}"), image, TextureOptions::NEAREST);
            self.textures.insert(id, handle);
        }
        self.textures.get(&id)
    }
}

// ---------------------------------------------------------------------------
// Tile grid (central panel)
// ---------------------------------------------------------------------------

enum Click {
    Flag(usize),
    Discard(usize),
}

/// Render the current page and apply tile clicks.
pub fn tile_grid(ui: &mut Ui, state: &mut AppState, textures: &mut TileTextures) {
    let Some(dataset) = &state.dataset else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Load a dataset to start labeling  (Load or Ctrl+O)");
        });
        return;
    };

    textures.sync(state);
    let tile = Vec2::splat(state.config.tile_size as f32);
    let mut clicks = Vec::new();

    egui::ScrollArea::both()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            egui::Grid::new("tile_grid")
                .spacing([0.0, 0.0])
                .show(ui, |ui: &mut Ui| {
                    for y in 0..state.pager.rows() {
                        for x in 0..state.pager.cols() {
                            let (rect, response) = ui.allocate_exact_size(tile, Sense::click());
                            let Some(id) = state.pager.event_at(x, y) else {
                                ui.painter().rect_filled(rect, 0.0, Color32::BLACK);
                                continue;
                            };

                            if let Some(tex) = textures.texture(ui.ctx(), dataset, id) {
                                let uv = Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0));
                                ui.painter().image(tex.id(), rect, uv, Color32::WHITE);
                            }
                            let label = dataset.table.label(id);
                            ui.painter().rect_stroke(
                                rect,
                                0.0,
                                Stroke::new(BORDER, state.colors.color_for(label)),
                                StrokeKind::Inside,
                            );

                            if response.clicked() {
                                clicks.push(Click::Flag(id));
                            } else if response.secondary_clicked() {
                                clicks.push(Click::Discard(id));
                            }
                            response.on_hover_ui(|ui: &mut Ui| {
                                ui.strong(format!("Event {id}"));
                                ui.label(format!("label = {label} ({})", state.label_name(label)));
                                for line in dataset.table.describe_row(id) {
                                    ui.label(line);
                                }
                            });
                        }
                        ui.end_row();
                    }
                });
        });

    for click in clicks {
        match click {
            Click::Flag(id) => state.flag(id),
            Click::Discard(id) => state.discard(id),
        }
    }
}
