//! Parquet fixtures shared by the loader and writer tests.

use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    ArrayRef, FixedSizeListArray, Float64Array, Int64Array, LargeListArray, ListArray,
    StringArray, UInt16Array, UInt8Array,
};
use arrow::buffer::{NullBuffer, OffsetBuffer};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::metadata::KeyValue;
use parquet::file::properties::WriterProperties;

use super::loader::SHAPE_KEY;
use super::model::ImageShape;

pub enum FixtureLabels {
    None,
    Int64(Vec<i64>),
    Utf8(Vec<&'static str>),
}

#[derive(Clone, Copy)]
pub enum ListLayout {
    List,
    LargeList,
    FixedSizeList,
}

#[derive(Clone, Copy)]
pub enum SampleType {
    UInt16,
    UInt8,
}

/// Layout knobs for a fixture file. Every sample of event `i` equals `i`;
/// columns are `event_id`, `image`, `area`, `tag` and optionally `label`.
pub struct Fixture {
    pub n: usize,
    pub shape: ImageShape,
    pub labels: FixtureLabels,
    pub layout: ListLayout,
    pub samples: SampleType,
    /// Rows whose image is null.
    pub null_rows: Vec<usize>,
    /// Value of the `image_shape` entry; `None` leaves it out.
    pub shape_meta: Option<String>,
}

impl Fixture {
    pub fn new(n: usize, shape: ImageShape) -> Self {
        Self {
            n,
            shape,
            labels: FixtureLabels::None,
            layout: ListLayout::List,
            samples: SampleType::UInt16,
            null_rows: Vec::new(),
            shape_meta: Some(shape.to_string()),
        }
    }

    fn image_column(&self) -> (Field, ArrayRef) {
        let per_image = self.shape.sample_count();
        let (item_type, values): (DataType, ArrayRef) = match self.samples {
            SampleType::UInt16 => (
                DataType::UInt16,
                Arc::new(UInt16Array::from_iter_values(
                    (0..self.n).flat_map(|i| std::iter::repeat(i as u16).take(per_image)),
                )),
            ),
            SampleType::UInt8 => (
                DataType::UInt8,
                Arc::new(UInt8Array::from_iter_values(
                    (0..self.n).flat_map(|i| std::iter::repeat(i as u8).take(per_image)),
                )),
            ),
        };
        let item = Arc::new(Field::new("item", item_type, true));
        let nulls = (!self.null_rows.is_empty()).then(|| {
            NullBuffer::from((0..self.n).map(|i| !self.null_rows.contains(&i)).collect::<Vec<_>>())
        });
        let lengths = std::iter::repeat(per_image).take(self.n);

        let column: ArrayRef = match self.layout {
            ListLayout::List => Arc::new(ListArray::new(
                item,
                OffsetBuffer::<i32>::from_lengths(lengths),
                values,
                nulls,
            )),
            ListLayout::LargeList => Arc::new(LargeListArray::new(
                item,
                OffsetBuffer::<i64>::from_lengths(lengths),
                values,
                nulls,
            )),
            ListLayout::FixedSizeList => Arc::new(FixedSizeListArray::new(
                item,
                per_image as i32,
                values,
                nulls,
            )),
        };
        let field = Field::new("image", column.data_type().clone(), !self.null_rows.is_empty());
        (field, column)
    }

    pub fn write(self, path: &Path) {
        let n = self.n;
        let (image_field, image_col) = self.image_column();

        let mut fields = vec![
            Field::new("event_id", DataType::Int64, false),
            image_field,
            Field::new("area", DataType::Float64, true),
            Field::new("tag", DataType::Utf8, false),
        ];
        let mut columns: Vec<ArrayRef> = vec![
            Arc::new(Int64Array::from((0..n as i64).collect::<Vec<_>>())),
            image_col,
            Arc::new(Float64Array::from(
                (0..n).map(|i| Some(i as f64 * 0.5)).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(
                (0..n).map(|i| format!("ev{i}")).collect::<Vec<_>>(),
            )),
        ];
        match self.labels {
            FixtureLabels::None => {}
            FixtureLabels::Int64(values) => {
                fields.push(Field::new("label", DataType::Int64, false));
                columns.push(Arc::new(Int64Array::from(values)));
            }
            FixtureLabels::Utf8(values) => {
                fields.push(Field::new("label", DataType::Utf8, false));
                columns.push(Arc::new(StringArray::from(values)));
            }
        }

        let schema = Arc::new(Schema::new(fields));
        let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();
        let props = WriterProperties::builder()
            .set_key_value_metadata(
                self.shape_meta
                    .map(|value| vec![KeyValue::new(SHAPE_KEY.to_string(), value)]),
            )
            .build();

        let file = std::fs::File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, Some(props)).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }
}

/// Plain `List<UInt16>` fixture with the shape recorded in the metadata.
pub fn write_fixture(path: &Path, n: usize, shape: ImageShape, labels: FixtureLabels) {
    Fixture { labels, ..Fixture::new(n, shape) }.write(path);
}
