use std::path::PathBuf;

use eframe::egui::{self, Align2, Color32, Id, Key, RichText, Ui, ViewportCommand};

use crate::state::AppState;
use crate::ui::grid::{self, TileTextures};
use crate::ui::{settings, summary, toolbar};

const DIGIT_KEYS: [Key; 10] = [
    Key::Num0,
    Key::Num1,
    Key::Num2,
    Key::Num3,
    Key::Num4,
    Key::Num5,
    Key::Num6,
    Key::Num7,
    Key::Num8,
    Key::Num9,
];

/// What happens once the startup settings window closes.
#[derive(Debug, Clone, PartialEq)]
enum Startup {
    /// Dataset named on the command line.
    Load(PathBuf),
    /// Ask with a file dialog.
    AskForFile,
    Done,
}

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct TileLabelerApp {
    pub state: AppState,
    textures: TileTextures,
    startup: Startup,
    confirm_exit: bool,
    allowed_to_close: bool,
}

impl TileLabelerApp {
    /// Settings are shown first, as at every launch. The dataset is opened
    /// only after they are applied, so edited column keys take effect.
    pub fn new(mut state: AppState, dataset: Option<PathBuf>) -> Self {
        state.show_settings = true;
        Self {
            state,
            textures: TileTextures::default(),
            startup: dataset.map_or(Startup::AskForFile, Startup::Load),
            confirm_exit: false,
            allowed_to_close: false,
        }
    }

    /// Runs once, after the first successful settings apply.
    fn finish_startup(&mut self) {
        match std::mem::replace(&mut self.startup, Startup::Done) {
            Startup::Load(path) => self.state.load(&path),
            Startup::AskForFile => toolbar::open_file_dialog(&mut self.state),
            Startup::Done => {}
        }
    }

    /// Modal dialog for load/save/settings failures; blocks the UI until
    /// acknowledged.
    fn error_dialog(&mut self, ctx: &egui::Context) {
        let Some(message) = self.state.pending_error().map(str::to_owned) else {
            return;
        };
        let modal = egui::Modal::new(Id::new("error_dialog")).show(ctx, |ui: &mut Ui| {
            ui.set_max_width(480.0);
            ui.heading("Error");
            ui.label(RichText::new(message).color(Color32::RED));
            ui.separator();
            ui.vertical_centered(|ui: &mut Ui| ui.button("OK").clicked())
                .inner
        });
        if modal.inner || modal.should_close() {
            self.state.dismiss_error();
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input()
            || self.state.show_settings
            || self.state.pending_error().is_some()
        {
            return;
        }
        let (next, prev, save, open, digit) = ctx.input(|i| {
            (
                i.key_pressed(Key::ArrowRight),
                i.key_pressed(Key::ArrowLeft),
                i.modifiers.command && i.key_pressed(Key::S),
                i.modifiers.command && i.key_pressed(Key::O),
                DIGIT_KEYS.iter().position(|k| i.key_pressed(*k)),
            )
        });

        if next {
            self.state.next_page();
        }
        if prev {
            self.state.prev_page();
        }
        if save && self.state.dataset.is_some() {
            self.state.save();
        }
        if open {
            toolbar::open_file_dialog(&mut self.state);
        }
        if let Some(d) = digit {
            self.state.set_active_label(d);
        }
    }

    fn handle_close(&mut self, ctx: &egui::Context) {
        if ctx.input(|i| i.viewport().close_requested()) && !self.allowed_to_close {
            ctx.send_viewport_cmd(ViewportCommand::CancelClose);
            self.confirm_exit = true;
        }
        if !self.confirm_exit {
            return;
        }

        egui::Window::new("Confirm Exit...")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui: &mut Ui| {
                ui.label("Are you sure you want to exit?");
                if self.state.dirty {
                    ui.colored_label(Color32::YELLOW, "Labels changed since the last save will be lost.");
                }
                ui.horizontal(|ui: &mut Ui| {
                    if ui.button("Yes").clicked() {
                        self.allowed_to_close = true;
                        ui.ctx().send_viewport_cmd(ViewportCommand::Close);
                    }
                    if ui.button("No").clicked() {
                        self.confirm_exit = false;
                    }
                });
            });
    }
}

impl eframe::App for TileLabelerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_shortcuts(ctx);

        // ---- Bottom panel: legend and controls ----
        egui::TopBottomPanel::bottom("control_bar").show(ctx, |ui| {
            toolbar::control_bar(ui, &mut self.state);
        });

        // ---- Right side panel: label counts ----
        egui::SidePanel::right("summary_panel")
            .default_width(200.0)
            .resizable(true)
            .show(ctx, |ui| {
                summary::label_summary(ui, &self.state);
            });

        // ---- Central panel: tiles ----
        egui::CentralPanel::default().show(ctx, |ui| {
            grid::tile_grid(ui, &mut self.state, &mut self.textures);
        });

        if self.state.show_settings && settings::settings_window(ctx, &mut self.state) {
            self.finish_startup();
        }

        self.error_dialog(ctx);
        self.handle_close(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::data::model::ImageShape;
    use crate::data::testutil::{FixtureLabels, write_fixture};

    #[test]
    fn command_line_dataset_waits_for_settings() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("run.parquet");
        let shape = ImageShape { height: 2, width: 2, channels: 1 };
        write_fixture(&data, 3, shape, FixtureLabels::None);

        // saved settings name the wrong image column
        let config = Config { image_key: "pixels".into(), ..Config::default() };
        let state = AppState::new(config, dir.path().join("settings.toml"));
        let mut app = TileLabelerApp::new(state, Some(data.clone()));
        assert!(app.state.show_settings);
        assert!(app.state.dataset.is_none());
        assert_eq!(app.state.status, None);

        // fixed in the settings window before it is closed
        app.state.config.image_key = "image".into();
        assert!(app.state.apply_settings());
        app.finish_startup();
        assert_eq!(app.state.dataset.as_ref().map(|ds| ds.len()), Some(3));
        assert_eq!(app.startup, Startup::Done);

        // later settings changes do not reload
        app.state.dataset = None;
        app.finish_startup();
        assert!(app.state.dataset.is_none());
    }
}
