/// Data layer: dataset types, loading, saving, and paging.
///
/// Architecture:
/// ```text
///  dataset.parquet  (image column + event columns + label column)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌─────────────────────┐
///   │ Dataset              │  ImageStack, RGB thumbnails, EventTable
///   └─────────────────────┘
///        │            │
///        ▼            ▼
///   ┌──────────┐  ┌──────────┐
///   │  paging   │  │  writer   │  page/tile → event id; labels → file, .txt
///   └──────────┘  └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod paging;
pub mod pixels;
pub mod writer;

#[cfg(test)]
pub(crate) mod testutil;
