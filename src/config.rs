use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot serialise config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("at least one label must be configured")]
    NoLabels,

    #[error("{0} labels configured, at most 256 are supported")]
    TooManyLabels(usize),

    #[error("grid must be at least 1x1, got {x_size}x{y_size}")]
    EmptyGrid { x_size: usize, y_size: usize },

    #[error("active label {index} is out of range or disabled")]
    InvalidActiveLabel { index: usize },

    #[error("label {index} ({name}) has unknown colour '{color}'")]
    UnknownColor {
        index: usize,
        name: String,
        color: String,
    },
}

// ---------------------------------------------------------------------------
// Settings file
// ---------------------------------------------------------------------------

/// Default location of the settings file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "tile-labeler.toml";

/// One entry of the label palette.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelSpec {
    pub name: String,
    /// Colour name; labels without one get a generated hue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl LabelSpec {
    fn new(name: &str, color: &str) -> Self {
        Self {
            name: name.to_string(),
            color: Some(color.to_string()),
            active: true,
        }
    }
}

/// Human-edited settings, read at launch and rewritten when the settings
/// window closes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Label assigned by a left click.
    #[serde(default = "default_active_label")]
    pub active_label: usize,

    /// Column holding the pixel data.
    #[serde(default = "default_image_key")]
    pub image_key: String,

    /// Column holding the integer label.
    #[serde(default = "default_label_key")]
    pub label_key: String,

    /// Tile edge in pixels (always odd after normalisation).
    #[serde(default = "default_tile_size")]
    pub tile_size: u32,

    /// Tiles per row.
    #[serde(default = "default_x_size")]
    pub x_size: usize,

    /// Tiles per column.
    #[serde(default = "default_y_size")]
    pub y_size: usize,

    /// Directory receiving the tab-separated export.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Write `<output_dir>/<name>.txt` on every save.
    #[serde(default = "default_true")]
    pub export_txt: bool,

    #[serde(default = "default_labels")]
    pub labels: Vec<LabelSpec>,
}

fn default_true() -> bool {
    true
}

fn default_active_label() -> usize {
    1
}

fn default_image_key() -> String {
    "image".to_string()
}

fn default_label_key() -> String {
    "label".to_string()
}

fn default_tile_size() -> u32 {
    85
}

fn default_x_size() -> usize {
    12
}

fn default_y_size() -> usize {
    7
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_labels() -> Vec<LabelSpec> {
    vec![
        LabelSpec::new("junk", "black"),
        LabelSpec::new("cell", "green"),
        LabelSpec::new("cluster", "yellow"),
        LabelSpec::new("debris", "red"),
        LabelSpec::new("unsure", "cyan"),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            active_label: default_active_label(),
            image_key: default_image_key(),
            label_key: default_label_key(),
            tile_size: default_tile_size(),
            x_size: default_x_size(),
            y_size: default_y_size(),
            output_dir: default_output_dir(),
            export_txt: true,
            labels: default_labels(),
        }
    }
}

impl Config {
    /// Read the settings file. A missing file is replaced by the defaults,
    /// which are written to `path` so the user has something to edit.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::warn!(
                "Config file {} does not exist, writing defaults",
                path.display()
            );
            let config = Config::default();
            config.save(path)?;
            return Ok(config);
        }
        Self::load(path)
    }

    /// Read, normalise and validate the settings file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.normalize();
        config.validate()?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Wrote config to {}", path.display());
        Ok(())
    }

    /// Force an odd tile edge.
    pub fn normalize(&mut self) {
        self.tile_size = 2 * (self.tile_size / 2) + 1;
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.labels.is_empty() {
            return Err(ConfigError::NoLabels);
        }
        if self.labels.len() > 256 {
            return Err(ConfigError::TooManyLabels(self.labels.len()));
        }
        if self.x_size == 0 || self.y_size == 0 {
            return Err(ConfigError::EmptyGrid {
                x_size: self.x_size,
                y_size: self.y_size,
            });
        }
        match self.labels.get(self.active_label) {
            Some(label) if label.active => {}
            _ => {
                return Err(ConfigError::InvalidActiveLabel {
                    index: self.active_label,
                })
            }
        }
        for (index, label) in self.labels.iter().enumerate() {
            if let Some(name) = &label.color {
                if color::named_color(name).is_none() {
                    return Err(ConfigError::UnknownColor {
                        index,
                        name: label.name.clone(),
                        color: name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn label_names(&self) -> Vec<String> {
        self.labels.iter().map(|l| l.name.clone()).collect()
    }
}
