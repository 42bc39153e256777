//! Aggregation over filtered datasets: yearly trends, text summaries and
//! multi-locality comparison.

pub mod compare;
pub mod summary;
pub mod trend;

pub use compare::{compare, ComparisonResult, LocalityOutcome, LocalityReport, RANKING_KEY};
pub use summary::summarize;
pub use trend::{build_demand_trend, build_price_trend, DemandPoint, PricePoint};
