use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, UInt8Array};
use arrow::datatypes::{DataType, Field, FieldRef, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use parquet::arrow::ArrowWriter;
use parquet::file::metadata::KeyValue;
use parquet::file::properties::WriterProperties;

use super::loader::LABELS_KEY;
use super::model::{Dataset, EventTable};

// ---------------------------------------------------------------------------
// Parquet writer
// ---------------------------------------------------------------------------

/// Write the dataset back over its source file.
///
/// The label column is replaced (or appended) as `UInt8`; all other columns
/// and file metadata are kept. The label names are stored under the
/// `labels` metadata key as a JSON array, index = label id.
pub fn save_dataset(dataset: &Dataset, label_names: &[String]) -> Result<()> {
    let batch = labelled_batch(&dataset.table)?;

    let mut key_values: Vec<KeyValue> = dataset
        .metadata
        .iter()
        .filter(|(k, _)| k.as_str() != LABELS_KEY)
        .map(|(k, v)| KeyValue::new(k.clone(), v.clone()))
        .collect();
    key_values.push(KeyValue::new(
        LABELS_KEY.to_string(),
        serde_json::to_string(label_names).context("encoding label names")?,
    ));
    let props = WriterProperties::builder()
        .set_key_value_metadata(Some(key_values))
        .build();

    // Write next to the target, then swap it in.
    let tmp = temp_path(&dataset.path);
    let written = write_parquet(&tmp, &batch, props).and_then(|()| {
        fs::rename(&tmp, &dataset.path)
            .with_context(|| format!("replacing {}", dataset.path.display()))
    });
    if let Err(e) = written {
        discard_temp(&tmp);
        return Err(e);
    }

    log::info!("Stored data in {}", dataset.path.display());
    Ok(())
}

fn write_parquet(path: &Path, batch: &RecordBatch, props: WriterProperties) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
        .context("creating parquet writer")?;
    writer.write(batch).context("writing parquet record batch")?;
    writer.close().context("finalising parquet file")?;
    Ok(())
}

/// Remove a half-written temp file; the source file is left untouched.
fn discard_temp(tmp: &Path) {
    if !tmp.exists() {
        return;
    }
    match fs::remove_file(tmp) {
        Ok(()) => log::debug!("Removed {}", tmp.display()),
        Err(e) => log::warn!("Cannot remove {}: {e}", tmp.display()),
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// The table as read from disk with the current labels swapped in.
fn labelled_batch(table: &EventTable) -> Result<RecordBatch> {
    let source = table.batch();
    let schema = source.schema();
    let label_field: FieldRef = Arc::new(Field::new(table.label_column(), DataType::UInt8, false));
    let label_array: ArrayRef = Arc::new(UInt8Array::from(table.labels().to_vec()));

    let mut fields: Vec<FieldRef> = Vec::with_capacity(schema.fields().len() + 1);
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(fields.capacity());
    let mut replaced = false;

    for (field, col) in schema.fields().iter().zip(source.columns()) {
        if field.name() == table.label_column() {
            fields.push(label_field.clone());
            columns.push(label_array.clone());
            replaced = true;
        } else {
            fields.push(field.clone());
            columns.push(col.clone());
        }
    }
    if !replaced {
        fields.push(label_field);
        columns.push(label_array);
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
        .context("assembling labelled table")
}

// ---------------------------------------------------------------------------
// Text export
// ---------------------------------------------------------------------------

/// Write `<dir>/<name>.txt`: tab-separated, header row, no index column,
/// every column except the images.
pub fn export_tsv(dataset: &Dataset, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(format!("{}.txt", dataset.name));

    let batch = labelled_batch(&dataset.table)?;
    let schema = batch.schema();
    let keep: Vec<usize> = schema
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, f)| f.name() != dataset.table.image_column())
        .map(|(i, _)| i)
        .collect();

    let options = FormatOptions::default();
    let formatters = keep
        .iter()
        .map(|&i| ArrayFormatter::try_new(batch.column(i).as_ref(), &options))
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("preparing column formatters")?;

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(&path)
        .with_context(|| format!("creating {}", path.display()))?;

    writer.write_record(keep.iter().map(|&i| schema.field(i).name().as_str()))?;
    for row in 0..batch.num_rows() {
        writer.write_record(formatters.iter().map(|f| f.value(row).to_string()))?;
    }
    writer.flush()?;

    log::info!("Exported data to {}", path.display());
    Ok(path)
}
