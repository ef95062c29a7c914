/// Data layer: core types, loading, and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .tsv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → CompareDataset
///   └──────────┘
///        │
///        ▼
///   ┌────────────────┐
///   │ CompareDataset │  Vec<Measurement> in file order
///   └────────────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate │  mean + error band per num_items → Vec<Series>
///   └───────────┘
/// ```

pub mod aggregate;
pub mod loader;
pub mod model;
