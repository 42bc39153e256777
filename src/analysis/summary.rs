use std::fmt::Write as _;

use super::trend::{demand_column, yearly_means};
use crate::data::model::Dataset;

/// Mean price of the earliest and latest observed year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceChange {
    pub first: f64,
    pub last: f64,
    /// Percent change; `0.0` when `first` is zero.
    pub pct: f64,
}

/// Rule-based one-paragraph summary of a filtered dataset.
///
/// Always starts with the record count; the price-change and demand
/// sentences are appended only when they can be computed.
pub fn summarize(dataset: &Dataset, label: &str) -> String {
    let mut summary = format!("Found {} records for {label}.", dataset.len());

    if let Some(change) = price_change(dataset) {
        let _ = write!(
            summary,
            " Average price changed from {:.2} to {:.2} ({:.1}% change).",
            change.first, change.last, change.pct
        );
    }

    if let Some((column, avg)) = demand_average(dataset) {
        let _ = write!(summary, " Average {column} is {avg:.2}.");
    }

    summary
}

/// First-to-last yearly mean price, by year order.  `None` without `year`
/// and `price` columns or with fewer than two distinct years.
pub fn price_change(dataset: &Dataset) -> Option<PriceChange> {
    if !dataset.has_column("year") || !dataset.has_column("price") {
        return None;
    }
    let means = yearly_means(dataset, "price");
    if means.len() < 2 {
        return None;
    }
    let (_, first) = *means.first()?;
    let (_, last) = *means.last()?;
    let pct = if first != 0.0 {
        (last - first) / first * 100.0
    } else {
        0.0
    };
    Some(PriceChange { first, last, pct })
}

/// Mean of the demand column the demand trend uses.  `None` when there is
/// no such column or it holds no numeric value.
pub fn demand_average(dataset: &Dataset) -> Option<(&'static str, f64)> {
    let column = demand_column(dataset)?;
    column_mean(dataset, column).map(|avg| (column, avg))
}

fn column_mean(dataset: &Dataset, column: &str) -> Option<f64> {
    let values: Vec<f64> = dataset
        .rows
        .iter()
        .filter_map(|r| Dataset::cell(r, column).as_f64())
        .collect();
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}
