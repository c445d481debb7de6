use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::config::LabelSpec;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Named colours
// ---------------------------------------------------------------------------

/// Resolve a colour name from the settings file.
///
/// The short table below takes precedence over CSS names (`green` is
/// pure green here, `lime` is CSS limegreen). Anything else falls through
/// to the CSS colour list.
pub fn named_color(name: &str) -> Option<Color32> {
    let name = name.trim().to_ascii_lowercase();
    let rgb = match name.as_str() {
        "black" => (0, 0, 0),
        "red" => (255, 0, 0),
        "yellow" => (255, 255, 0),
        "green" => (0, 255, 0),
        "blue" => (0, 0, 255),
        "magenta" => (255, 0, 255),
        "cyan" => (0, 255, 255),
        "orange" => (255, 165, 0),
        "purple" => (128, 0, 128),
        "brown" => (165, 42, 42),
        "pink" => (255, 192, 203),
        "gray" | "grey" => (160, 160, 164),
        "olive" => (128, 128, 0),
        "teal" => (0, 128, 128),
        "lime" => (50, 205, 50),
        other => {
            let c: Srgb<u8> = palette::named::from_str(other)?;
            (c.red, c.green, c.blue)
        }
    };
    Some(Color32::from_rgb(rgb.0, rgb.1, rgb.2))
}

// ---------------------------------------------------------------------------
// Label → colour lookup
// ---------------------------------------------------------------------------

/// Border colours for each configured label, indexed by label id.
#[derive(Debug, Clone)]
pub struct LabelColors {
    colors: Vec<Color32>,
    default_color: Color32,
}

impl LabelColors {
    pub fn new(labels: &[LabelSpec]) -> Self {
        let generated = generate_palette(labels.len());
        let colors = labels
            .iter()
            .zip(generated)
            .map(|(label, fallback)| {
                label
                    .color
                    .as_deref()
                    .and_then(named_color)
                    .unwrap_or(fallback)
            })
            .collect();

        LabelColors {
            colors,
            default_color: Color32::GRAY,
        }
    }

    /// Colour for a label id; ids read from a file that the palette does
    /// not cover get a neutral grey.
    pub fn color_for(&self, label: u8) -> Color32 {
        self.colors
            .get(label as usize)
            .copied()
            .unwrap_or(self.default_color)
    }
}
