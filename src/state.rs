use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::color::LabelColors;
use crate::config::Config;
use crate::data::loader;
use crate::data::model::Dataset;
use crate::data::paging::Pager;
use crate::data::writer;

// ---------------------------------------------------------------------------
// Status line
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Info(String),
    Error(String),
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Settings, written back to `config_path` when the settings window closes.
    pub config: Config,
    pub config_path: PathBuf,

    /// Loaded dataset (None until user loads a file).
    pub dataset: Option<Dataset>,

    /// Page position over the loaded dataset.
    pub pager: Pager,

    /// Border colour per label id.
    pub colors: LabelColors,

    /// Message shown in the control bar.
    pub status: Option<Status>,

    /// Labels changed since the last save.
    pub dirty: bool,

    /// Settings window visibility.
    pub show_settings: bool,

    /// Bumped on every load so cached textures are dropped.
    pub generation: u64,
}

impl AppState {
    pub fn new(config: Config, config_path: PathBuf) -> Self {
        let colors = LabelColors::new(&config.labels);
        let pager = Pager::new(0, config.x_size, config.y_size);
        Self {
            config,
            config_path,
            dataset: None,
            pager,
            colors,
            status: None,
            dirty: false,
            show_settings: false,
            generation: 0,
        }
    }

    /// Ingest a newly loaded dataset and jump to page 1.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.pager = Pager::new(dataset.len(), self.config.x_size, self.config.y_size);
        self.dataset = Some(dataset);
        self.dirty = false;
        self.status = None;
        self.generation += 1;
    }

    /// Load a dataset file, reporting failures in the status line.
    pub fn load(&mut self, path: &Path) {
        match loader::load_file(path, &self.config.image_key, &self.config.label_key) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} events from {}",
                    dataset.len(),
                    dataset.path.display()
                );
                self.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status = Some(Status::Error(format!("Error: {e:#}")));
            }
        }
    }

    /// Write labels back to the dataset file and, if enabled, the text export.
    pub fn save(&mut self) {
        let Some(dataset) = &self.dataset else {
            self.status = Some(Status::Error("Nothing to save: no dataset loaded".into()));
            return;
        };
        match self.write_dataset(dataset) {
            Ok(msg) => {
                self.dirty = false;
                self.status = Some(Status::Info(msg));
            }
            Err(e) => {
                log::error!("Failed to save: {e:#}");
                self.status = Some(Status::Error(format!("Error: {e:#}")));
            }
        }
    }

    /// Message of the error dialog, if one is waiting to be acknowledged.
    pub fn pending_error(&self) -> Option<&str> {
        match &self.status {
            Some(Status::Error(msg)) => Some(msg),
            _ => None,
        }
    }

    /// Acknowledge the error dialog. Info messages stay in the status line.
    pub fn dismiss_error(&mut self) {
        if self.pending_error().is_some() {
            self.status = None;
        }
    }

    fn write_dataset(&self, dataset: &Dataset) -> Result<String> {
        writer::save_dataset(dataset, &self.config.label_names())?;
        if self.config.export_txt {
            let out = writer::export_tsv(dataset, &self.config.output_dir)?;
            return Ok(format!("Saved, exported {}", out.display()));
        }
        Ok(format!("Saved {}", dataset.path.display()))
    }

    // -- labels --

    /// Current label of an event (0 for padding or when nothing is loaded).
    pub fn label_of(&self, id: usize) -> u8 {
        self.dataset.as_ref().map_or(0, |ds| ds.table.label(id))
    }

    /// Store `label`; only a real change marks the dataset unsaved.
    fn assign(&mut self, id: usize, label: u8) -> bool {
        let Some(ds) = &mut self.dataset else {
            return false;
        };
        let changed = ds.table.set_label(id, label);
        self.dirty |= changed;
        changed
    }

    /// Left click: assign the active label.
    pub fn flag(&mut self, id: usize) {
        let label = self.active_label();
        if self.assign(id, label) {
            log::info!("Event {id} is selected!");
        }
    }

    /// Right click: back to label 0.
    pub fn discard(&mut self, id: usize) {
        if self.assign(id, 0) {
            log::info!("Event {id} is discarded!");
        }
    }

    pub fn select_all(&mut self) {
        let ids: Vec<usize> = self.pager.visible_ids().collect();
        for id in ids {
            self.flag(id);
        }
    }

    pub fn select_none(&mut self) {
        let ids: Vec<usize> = self.pager.visible_ids().collect();
        for id in ids {
            self.discard(id);
        }
    }

    pub fn active_label(&self) -> u8 {
        self.config.active_label as u8
    }

    /// Switch the left-click label; disabled or unknown labels are refused.
    pub fn set_active_label(&mut self, index: usize) -> bool {
        match self.config.labels.get(index) {
            Some(label) if label.active => {
                self.config.active_label = index;
                log::info!("{} toggled!", label.name);
                true
            }
            _ => false,
        }
    }

    /// `(id, name)` of every label shown in the legend.
    pub fn legend(&self) -> Vec<(usize, String)> {
        self.config
            .labels
            .iter()
            .enumerate()
            .filter(|(_, l)| l.active)
            .map(|(i, l)| (i, l.name.clone()))
            .collect()
    }

    /// Display name of a label id, `?` past the palette.
    pub fn label_name(&self, label: u8) -> &str {
        self.config
            .labels
            .get(label as usize)
            .map_or("?", |l| l.name.as_str())
    }

    // -- paging --

    pub fn next_page(&mut self) {
        self.pager.next();
        self.log_selection();
    }

    pub fn prev_page(&mut self) {
        self.pager.prev();
        self.log_selection();
    }

    fn log_selection(&self) {
        if let Some(ds) = &self.dataset {
            log::info!("Selection: {}", ds.table.selected_count());
        }
    }

    /// `"<name>\n\n<page> / <pages>"`; page 0 of 0 before anything is loaded.
    pub fn page_indicator(&self) -> String {
        match &self.dataset {
            Some(ds) => format!(
                "{}\n\n{} / {}",
                ds.name,
                self.pager.current(),
                self.pager.n_pages()
            ),
            None => "Empty\n\n0 / 0".to_string(),
        }
    }

    // -- settings --

    /// Normalise, validate and persist the edited settings, then apply them.
    /// On error the settings stay as edited and the window stays open.
    pub fn apply_settings(&mut self) -> bool {
        self.config.normalize();
        if !self.set_active_label(self.config.active_label) {
            if let Some(&(first, _)) = self.legend().first() {
                self.set_active_label(first);
            }
        }
        if let Err(e) = self.config.validate() {
            self.status = Some(Status::Error(format!("Invalid settings: {e}")));
            return false;
        }
        if let Err(e) = self.config.save(&self.config_path) {
            log::error!("{e}");
            self.status = Some(Status::Error(e.to_string()));
        }
        self.colors = LabelColors::new(&self.config.labels);
        self.pager.resize(self.config.x_size, self.config.y_size);
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::Int64Array;
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;

    use super::*;
    use crate::data::model::{EventTable, ImageShape, ImageStack};

    fn dataset(n: usize) -> Dataset {
        let shape = ImageShape { height: 1, width: 1, channels: 1 };
        let schema = Arc::new(Schema::new(vec![Field::new("event_id", DataType::Int64, false)]));
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(Int64Array::from((0..n as i64).collect::<Vec<_>>()))],
        )
        .unwrap();
        let images = ImageStack::new(shape, vec![0; n]).unwrap();
        Dataset {
            path: PathBuf::from("test.parquet"),
            name: "test".into(),
            thumbnails: crate::data::pixels::render_stack(&images),
            images,
            table: EventTable::new(batch, "image", "label", vec![0; n]).unwrap(),
            metadata: Default::default(),
        }
    }

    fn state(n: usize) -> AppState {
        let config = Config { x_size: 2, y_size: 2, ..Config::default() };
        let mut state = AppState::new(config, PathBuf::from("unused.toml"));
        state.set_dataset(dataset(n));
        state
    }

    #[test]
    fn clicks_assign_and_reset_labels() {
        let mut s = state(6);
        s.set_active_label(3);
        s.flag(1);
        assert_eq!(s.label_of(1), 3);
        assert!(s.dirty);
        s.discard(1);
        assert_eq!(s.label_of(1), 0);
    }

    #[test]
    fn repeating_a_label_does_not_mark_unsaved() {
        let mut s = state(4);
        s.discard(2);
        s.select_none();
        assert!(!s.dirty);

        s.select_all();
        assert!(s.dirty);
        s.dirty = false;
        s.select_all();
        s.flag(0);
        assert!(!s.dirty);
    }

    #[test]
    fn padding_tiles_are_not_labelled() {
        let mut s = state(5);
        s.next_page();
        s.flag(7);
        assert_eq!(s.label_of(7), 0);
        assert!(!s.dirty);
    }

    #[test]
    fn select_all_only_touches_current_page() {
        let mut s = state(6);
        s.next_page();
        s.select_all();
        let labels = s.dataset.as_ref().unwrap().table.labels().to_vec();
        assert_eq!(labels, vec![0, 0, 0, 0, 1, 1]);

        s.select_none();
        assert_eq!(s.dataset.as_ref().unwrap().table.selected_count(), 0);
    }

    #[test]
    fn disabled_labels_cannot_be_activated() {
        let mut s = state(1);
        s.config.labels[2].active = false;
        assert!(!s.set_active_label(2));
        assert!(!s.set_active_label(42));
        assert!(s.set_active_label(4));
        assert_eq!(s.active_label(), 4);
        assert!(s.legend().iter().all(|(i, _)| *i != 2));
    }

    #[test]
    fn page_indicator_tracks_navigation() {
        let mut s = AppState::new(Config::default(), PathBuf::from("unused.toml"));
        assert_eq!(s.page_indicator(), "Empty\n\n0 / 0");
        s.config.x_size = 2;
        s.config.y_size = 2;
        s.set_dataset(dataset(9));
        assert_eq!(s.page_indicator(), "test\n\n1 / 3");
        s.next_page();
        s.next_page();
        s.next_page();
        assert_eq!(s.page_indicator(), "test\n\n3 / 3");
        s.prev_page();
        assert_eq!(s.page_indicator(), "test\n\n2 / 3");
    }

    #[test]
    fn applying_settings_persists_and_resizes() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = state(20);
        s.config_path = dir.path().join("settings.toml");
        s.config.x_size = 5;
        s.config.tile_size = 50;
        s.config.labels[1].active = false;

        assert!(s.apply_settings());
        assert_eq!(s.pager.page_size(), 10);
        assert_eq!(s.config.tile_size, 51);
        // label 1 was disabled, the first remaining legend entry takes over
        assert_eq!(s.active_label(), 0);
        assert_eq!(Config::load(&s.config_path).unwrap(), s.config);
    }

    #[test]
    fn load_errors_wait_for_acknowledgement() {
        let mut s = AppState::new(Config::default(), PathBuf::from("unused.toml"));
        s.load(Path::new("does-not-exist.parquet"));
        assert!(s.dataset.is_none());
        assert!(s.pending_error().unwrap().contains("does-not-exist.parquet"));

        s.dismiss_error();
        assert_eq!(s.pending_error(), None);
        assert_eq!(s.status, None);

        s.status = Some(Status::Info("Saved".into()));
        s.dismiss_error();
        assert_eq!(s.status, Some(Status::Info("Saved".into())));
    }

    #[test]
    fn invalid_settings_are_kept_for_editing() {
        let mut s = state(1);
        s.config.y_size = 0;
        assert!(!s.apply_settings());
        assert!(matches!(s.status, Some(Status::Error(_))));
    }
}
