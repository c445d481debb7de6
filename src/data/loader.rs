use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, bail, ensure};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::{cast, concat_batches};
use arrow::datatypes::{DataType, UInt16Type, UInt8Type};
use arrow::util::pretty::pretty_format_batches;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{Dataset, EventTable, ImageShape, ImageStack};
use super::pixels::render_stack;

/// File metadata key holding the `"H,W,C"` image shape.
pub const SHAPE_KEY: &str = "image_shape";
/// File metadata key holding the JSON list of label names written on save.
pub const LABELS_KEY: &str = "labels";
/// Arrow's own schema blob; regenerated by the writer, never carried over.
const ARROW_SCHEMA_KEY: &str = "ARROW:schema";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a labeling dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – one row per event; `image_key` is a list column of pixel
///   samples, the optional `label_key` column holds integer labels, every
///   other column is event data shown in tooltips and the text export.
pub fn load_file(path: &Path, image_key: &str, label_key: &str) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => load_parquet(path, image_key, label_key),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file containing images and their event table.
///
/// Expected layout:
/// - key/value metadata `image_shape = "H,W,C"`
/// - `image_key`: List / LargeList / FixedSizeList of UInt16 (or UInt8),
///   `H*W*C` samples per row, row-major
/// - `label_key` (optional): any integer column; created as zeros if absent
fn load_parquet(path: &Path, image_key: &str, label_key: &str) -> Result<Dataset> {
    log::info!("loading input data from: {}", path.display());

    let file = std::fs::File::open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;

    let metadata: BTreeMap<String, String> = builder
        .metadata()
        .file_metadata()
        .key_value_metadata()
        .map(|kvs| {
            kvs.iter()
                .filter(|kv| kv.key != ARROW_SCHEMA_KEY)
                .filter_map(|kv| Some((kv.key.clone(), kv.value.clone()?)))
                .collect()
        })
        .unwrap_or_default();
    log::debug!("Input file metadata keys: {:?}", metadata.keys().collect::<Vec<_>>());

    let schema = builder.schema().clone();
    let reader = builder.build().context("building parquet reader")?;
    let batches = reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("reading parquet record batch")?;
    let batch = concat_batches(&schema, &batches).context("concatenating record batches")?;
    let n_events = batch.num_rows();
    ensure!(n_events > 0, "{} contains no events", path.display());

    // Images
    let shape_text = metadata
        .get(SHAPE_KEY)
        .with_context(|| format!("file metadata has no '{SHAPE_KEY}' entry"))?;
    let shape = ImageShape::parse(shape_text)?;
    let image_col = batch
        .column_by_name(image_key)
        .with_context(|| format!("Images not found in input file (no '{image_key}' column)"))?;
    let pixels = extract_pixels(image_col, shape)
        .with_context(|| format!("reading image column '{image_key}'"))?;
    let images = ImageStack::new(shape, pixels)?;
    log::info!("Loaded images with size: ({}, {shape})", images.len());

    // Labels
    let labels = match batch.column_by_name(label_key) {
        Some(col) => extract_labels(col)
            .with_context(|| format!("reading label column '{label_key}'"))?,
        None => {
            log::info!("No '{label_key}' column in input, all labels start at 0");
            vec![0; n_events]
        }
    };

    log_table_preview(&batch, image_key);
    let table = EventTable::new(batch, image_key, label_key, labels)?;
    log::info!(
        "Loaded data with size: ({}, {})",
        table.len(),
        table.batch().num_columns()
    );

    let thumbnails = render_stack(&images);
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("dataset")
        .to_string();

    Ok(Dataset {
        path: path.to_path_buf(),
        name,
        images,
        thumbnails,
        table,
        metadata,
    })
}

// -- Parquet / Arrow helpers --

/// Flatten the image list column into one `N*H*W*C` sample buffer.
///
/// Every row length is checked against `shape` before anything is
/// allocated, so a bogus `image_shape` entry fails instead of reserving
/// memory for it.
fn extract_pixels(col: &ArrayRef, shape: ImageShape) -> Result<Vec<u16>> {
    let per_image = shape
        .checked_sample_count()
        .with_context(|| format!("image shape {shape} is too large"))?;

    let mut valid_rows = 0;
    for row in (0..col.len()).filter(|&row| !col.is_null(row)) {
        let len = list_value(col, row)?.len();
        ensure!(
            len == per_image,
            "Row {row}: image has {len} samples, expected {per_image} for shape {shape}"
        );
        valid_rows += 1;
    }
    ensure!(valid_rows > 0, "every image in the column is null");

    let total = col
        .len()
        .checked_mul(per_image)
        .with_context(|| format!("{} images of shape {shape} do not fit in memory", col.len()))?;
    let mut pixels = Vec::with_capacity(total);
    for row in 0..col.len() {
        if col.is_null(row) {
            log::warn!("Row {row}: null image, shown as black");
            pixels.resize(pixels.len() + per_image, 0);
            continue;
        }
        let values = list_value(col, row)?;
        append_samples(&values, &mut pixels).with_context(|| format!("Row {row}"))?;
    }
    Ok(pixels)
}

/// The list entry at `row` for any of the three Arrow list layouts.
fn list_value(col: &ArrayRef, row: usize) -> Result<ArrayRef> {
    match col.data_type() {
        DataType::List(_) => Ok(col.as_list::<i32>().value(row)),
        DataType::LargeList(_) => Ok(col.as_list::<i64>().value(row)),
        DataType::FixedSizeList(_, _) => Ok(col.as_fixed_size_list().value(row)),
        other => bail!("Expected List, LargeList or FixedSizeList column, got {other:?}"),
    }
}

fn append_samples(values: &ArrayRef, out: &mut Vec<u16>) -> Result<()> {
    match values.data_type() {
        DataType::UInt16 => {
            out.extend(values.as_primitive::<UInt16Type>().iter().map(|v| v.unwrap_or(0)));
        }
        // 8-bit sources are stretched to the full 16-bit range.
        DataType::UInt8 => {
            out.extend(
                values
                    .as_primitive::<UInt8Type>()
                    .iter()
                    .map(|v| v.unwrap_or(0) as u16 * 257),
            );
        }
        other => bail!("List inner type is {other:?}, expected UInt16 or UInt8"),
    }
    Ok(())
}

/// Cast any integer label column to `u8`; nulls and out-of-range values
/// become 0.
fn extract_labels(col: &ArrayRef) -> Result<Vec<u8>> {
    ensure!(
        col.data_type().is_integer(),
        "label column has type {:?}, expected an integer type",
        col.data_type()
    );
    let cast_col = cast(col.as_ref(), &DataType::UInt8).context("casting labels to UInt8")?;
    let labels = cast_col.as_primitive::<UInt8Type>();

    let invalid = labels.null_count() - col.null_count();
    if invalid > 0 {
        log::warn!("{invalid} labels do not fit in 0..=255 and were reset to 0");
    }
    if col.null_count() > 0 {
        log::warn!("{} null labels were set to 0", col.null_count());
    }
    Ok(labels.iter().map(|v| v.unwrap_or(0)).collect())
}

/// Debug dump of the table's schema and first rows, image column left out.
fn log_table_preview(batch: &arrow::record_batch::RecordBatch, image_key: &str) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }
    let schema = batch.schema();
    let projection: Vec<usize> = schema
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, f)| f.name() != image_key)
        .map(|(i, _)| i)
        .collect();
    for field in schema.fields() {
        log::debug!("column {}: {:?}", field.name(), field.data_type());
    }
    let head = batch.slice(0, batch.num_rows().min(5));
    match head.project(&projection).map(|b| pretty_format_batches(&[b])) {
        Ok(Ok(table)) => log::debug!("First rows:\n{table}"),
        Ok(Err(e)) | Err(e) => log::debug!("Cannot format table preview: {e}"),
    }
}
