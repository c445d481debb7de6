use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result, bail, ensure};
use arrow::array::ArrayRef;
use arrow::record_batch::RecordBatch;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use image::RgbImage;

// ---------------------------------------------------------------------------
// ImageShape – height × width × channels of every image in a dataset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageShape {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
}

impl ImageShape {
    /// Samples per image, `None` if the product overflows.
    pub fn checked_sample_count(&self) -> Option<usize> {
        self.height
            .checked_mul(self.width)?
            .checked_mul(self.channels)
    }

    /// Samples per image. Shapes built by [`ImageShape::parse`] never
    /// overflow; anything else saturates.
    pub fn sample_count(&self) -> usize {
        self.checked_sample_count().unwrap_or(usize::MAX)
    }

    /// Parse the `"H,W,C"` form stored in the file metadata.
    pub fn parse(text: &str) -> Result<Self> {
        let dims: Vec<usize> = text
            .split(',')
            .map(|tok| {
                tok.trim()
                    .parse::<usize>()
                    .with_context(|| format!("'{tok}' is not a dimension"))
            })
            .collect::<Result<_>>()
            .with_context(|| format!("parsing image shape '{text}'"))?;

        let &[height, width, channels] = dims.as_slice() else {
            bail!("image shape '{text}' must have three dimensions (H,W,C)");
        };
        ensure!(
            height > 0 && width > 0 && channels > 0,
            "image shape '{text}' has a zero dimension"
        );
        let shape = Self { height, width, channels };
        ensure!(
            shape.checked_sample_count().is_some(),
            "image shape '{text}' is too large"
        );
        Ok(shape)
    }
}

impl fmt::Display for ImageShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.height, self.width, self.channels)
    }
}

// ---------------------------------------------------------------------------
// ImageStack – all images, row-major N,H,W,C
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ImageStack {
    shape: ImageShape,
    pixels: Vec<u16>,
}

impl ImageStack {
    pub fn new(shape: ImageShape, pixels: Vec<u16>) -> Result<Self> {
        ensure!(
            pixels.len() % shape.sample_count() == 0,
            "{} samples do not divide into images of shape {shape}",
            pixels.len()
        );
        Ok(Self { shape, pixels })
    }

    pub fn shape(&self) -> ImageShape {
        self.shape
    }

    /// Number of images.
    pub fn len(&self) -> usize {
        self.pixels.len() / self.shape.sample_count()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Samples of one image, `None` past the end.
    pub fn image(&self, id: usize) -> Option<&[u16]> {
        let n = self.shape.sample_count();
        self.pixels.get(id * n..(id + 1) * n)
    }
}

// ---------------------------------------------------------------------------
// EventTable – one row per image plus the mutable label column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct EventTable {
    /// All columns as read from the file (label column included if present).
    batch: RecordBatch,
    image_column: String,
    label_column: String,
    labels: Vec<u8>,
}

impl EventTable {
    pub fn new(
        batch: RecordBatch,
        image_column: &str,
        label_column: &str,
        labels: Vec<u8>,
    ) -> Result<Self> {
        ensure!(
            labels.len() == batch.num_rows(),
            "label column has {} entries but table has {} rows",
            labels.len(),
            batch.num_rows()
        );
        Ok(Self {
            batch,
            image_column: image_column.to_string(),
            label_column: label_column.to_string(),
            labels,
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn image_column(&self) -> &str {
        &self.image_column
    }

    pub fn label_column(&self) -> &str {
        &self.label_column
    }

    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    /// Label of an event; padding tiles past the end read as `0`.
    pub fn label(&self, id: usize) -> u8 {
        self.labels.get(id).copied().unwrap_or(0)
    }

    /// `true` only if the stored label changed; padding ids are ignored.
    pub fn set_label(&mut self, id: usize, label: u8) -> bool {
        match self.labels.get_mut(id) {
            Some(slot) if *slot != label => {
                *slot = label;
                true
            }
            _ => false,
        }
    }

    /// Events carrying a non-zero label.
    pub fn selected_count(&self) -> usize {
        self.labels.iter().filter(|&&l| l != 0).count()
    }

    /// Histogram over `0..n_labels`; out-of-palette values are not counted.
    pub fn label_counts(&self, n_labels: usize) -> Vec<usize> {
        let mut counts = vec![0; n_labels];
        for &label in &self.labels {
            if let Some(c) = counts.get_mut(label as usize) {
                *c += 1;
            }
        }
        counts
    }

    /// Columns other than the image and label columns, in file order.
    pub fn data_columns(&self) -> Vec<(String, ArrayRef)> {
        let schema = self.batch.schema();
        schema
            .fields()
            .iter()
            .zip(self.batch.columns())
            .filter(|(f, _)| f.name() != &self.image_column && f.name() != &self.label_column)
            .map(|(f, col)| (f.name().clone(), col.clone()))
            .collect()
    }

    /// `column = value` lines for one event, used by the tile tooltip.
    pub fn describe_row(&self, id: usize) -> Vec<String> {
        if id >= self.len() {
            return Vec::new();
        }
        let options = FormatOptions::default().with_null("<null>");
        self.data_columns()
            .into_iter()
            .map(|(name, col)| {
                let value = ArrayFormatter::try_new(col.as_ref(), &options)
                    .map(|fmt| fmt.value(id).to_string())
                    .unwrap_or_else(|_| "<?>".to_string());
                format!("{name} = {value}")
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded file
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Dataset {
    /// File the dataset was read from and is saved back to.
    pub path: PathBuf,
    /// File stem, shown in the page indicator and used for the export name.
    pub name: String,
    pub images: ImageStack,
    /// 8-bit RGB rendering of every image, same order as `images`.
    pub thumbnails: Vec<RgbImage>,
    pub table: EventTable,
    /// File-level key/value metadata other than the Arrow schema.
    pub metadata: BTreeMap<String, String>,
}

impl Dataset {
    /// Number of events (images).
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{Float64Array, Int64Array};
    use arrow::datatypes::{DataType, Field, Schema};

    use super::*;

    fn table() -> EventTable {
        let schema = Arc::new(Schema::new(vec![
            Field::new("event_id", DataType::Int64, false),
            Field::new("area", DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![10, 11, 12])),
                Arc::new(Float64Array::from(vec![Some(1.5), None, Some(3.0)])),
            ],
        )
        .unwrap();
        EventTable::new(batch, "image", "label", vec![0, 2, 1]).unwrap()
    }

    #[test]
    fn shape_parses_three_dims() {
        let shape = ImageShape::parse(" 8, 6,4").unwrap();
        assert_eq!(shape, ImageShape { height: 8, width: 6, channels: 4 });
        assert_eq!(shape.sample_count(), 192);
        assert_eq!(shape.to_string(), "8,6,4");
    }

    #[test]
    fn shape_rejects_bad_input() {
        assert!(ImageShape::parse("8,6").is_err());
        assert!(ImageShape::parse("8,x,4").is_err());
        assert!(ImageShape::parse("8,0,4").is_err());
    }

    #[test]
    fn shape_rejects_overflowing_product() {
        let err = ImageShape::parse("4294967296,4294967296,2").unwrap_err();
        assert!(err.to_string().contains("too large"), "{err:#}");
    }

    #[test]
    fn stack_slices_images() {
        let shape = ImageShape { height: 1, width: 2, channels: 1 };
        let stack = ImageStack::new(shape, vec![1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(stack.len(), 3);
        assert_eq!(stack.image(1), Some(&[3, 4][..]));
        assert_eq!(stack.image(3), None);
        assert!(ImageStack::new(shape, vec![1, 2, 3]).is_err());
    }

    #[test]
    fn padding_ids_read_as_zero_and_ignore_writes() {
        let mut t = table();
        assert_eq!(t.label(1), 2);
        assert_eq!(t.label(99), 0);
        assert!(!t.set_label(99, 3));
        assert!(t.set_label(0, 3));
        assert!(!t.set_label(0, 3));
        assert_eq!(t.labels(), &[3, 2, 1]);
    }

    #[test]
    fn counts_and_selection() {
        let t = table();
        assert_eq!(t.selected_count(), 2);
        assert_eq!(t.label_counts(3), vec![1, 1, 1]);
        assert_eq!(t.label_counts(2), vec![1, 1]);
    }

    #[test]
    fn row_description_formats_values() {
        let t = table();
        assert_eq!(t.describe_row(1), vec!["event_id = 11", "area = <null>"]);
        assert!(t.describe_row(3).is_empty());
    }

    #[test]
    fn label_length_must_match_rows() {
        let t = table();
        let batch = t.batch().clone();
        assert!(EventTable::new(batch, "image", "label", vec![0]).is_err());
    }
}
