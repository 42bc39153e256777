/// Data layer: core types, loading, caching, filtering and export.
///
/// Architecture:
/// ```text
///  .csv / .xlsx / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RawTable → normalized Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  cache    │  one shared snapshot per process, reloadable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  locality predicate → filtered Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  Dataset → CSV bytes
///   └──────────┘
/// ```

pub mod cache;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
