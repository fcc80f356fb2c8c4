/// Data layer: core types, loading, and the filter-derive pipeline.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table            (memoised by cache)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  derive   │  computed columns → Table      (undefined → Null)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  predicates → Table            (order preserved)
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  count / mean → Summary
///   └───────────┘
/// ```

pub mod aggregate;
pub mod cache;
pub mod derive;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
