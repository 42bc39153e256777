use std::collections::BTreeMap;

use serde::Serialize;

use crate::data::model::Dataset;

/// Demand-like columns, in priority order.
pub const DEMAND_COLUMNS: &[&str] = &["demand", "requests", "interest"];

/// Mean price for one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePoint {
    pub year: i64,
    pub avg_price: f64,
}

/// Mean demand-like metric for one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemandPoint {
    pub year: i64,
    pub avg_demand: f64,
}

/// Yearly mean price, ascending by year.  Empty unless both `year` and
/// `price` columns exist.
pub fn build_price_trend(dataset: &Dataset) -> Vec<PricePoint> {
    if !dataset.has_column("year") || !dataset.has_column("price") {
        return Vec::new();
    }
    yearly_means(dataset, "price")
        .into_iter()
        .map(|(year, avg_price)| PricePoint { year, avg_price })
        .collect()
}

/// Yearly mean of the first demand-like column, ascending by year.
pub fn build_demand_trend(dataset: &Dataset) -> Vec<DemandPoint> {
    if !dataset.has_column("year") {
        return Vec::new();
    }
    let Some(column) = demand_column(dataset) else {
        return Vec::new();
    };
    yearly_means(dataset, column)
        .into_iter()
        .map(|(year, avg_demand)| DemandPoint { year, avg_demand })
        .collect()
}

/// First of [`DEMAND_COLUMNS`] present in the dataset.
pub fn demand_column(dataset: &Dataset) -> Option<&'static str> {
    dataset.first_column(DEMAND_COLUMNS)
}

/// Group rows by `year` and average `column`, skipping rows where either is
/// missing or non-numeric.  Sorted ascending by year.
pub fn yearly_means(dataset: &Dataset, column: &str) -> Vec<(i64, f64)> {
    let mut groups: BTreeMap<i64, (f64, usize)> = BTreeMap::new();
    for record in &dataset.rows {
        let Some(year) = Dataset::cell(record, "year").as_i64() else {
            continue;
        };
        let Some(value) = Dataset::cell(record, column).as_f64() else {
            continue;
        };
        let (sum, count) = groups.entry(year).or_insert((0.0, 0));
        *sum += value;
        *count += 1;
    }
    groups
        .into_iter()
        .map(|(year, (sum, count))| (year, sum / count as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CellValue;
    use crate::data::model::CellValue::{Float as F, Integer as I, Null};

    fn dataset(columns: &[&str], rows: &[&[CellValue]]) -> Dataset {
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        let rows: Vec<crate::data::model::Record> = rows
            .iter()
            .map(|cells| columns.iter().cloned().zip(cells.iter().cloned()).collect())
            .collect();
        Dataset::new(columns, rows)
    }

    #[test]
    fn price_trend_averages_per_year() {
        let ds = dataset(
            &["year", "price"],
            &[&[I(2021), I(100)], &[I(2021), I(200)], &[I(2022), I(300)]],
        );
        assert_eq!(
            build_price_trend(&ds),
            vec![
                PricePoint { year: 2021, avg_price: 150.0 },
                PricePoint { year: 2022, avg_price: 300.0 },
            ]
        );
    }

    #[test]
    fn price_trend_sorts_years_and_drops_missing() {
        let ds = dataset(
            &["year", "price"],
            &[
                &[I(2023), F(10.0)],
                &[Null, I(999)],
                &[I(2019), I(4)],
                &[I(2023), Null],
                &[I(2019), F(6.0)],
            ],
        );
        let trend = build_price_trend(&ds);
        let years: Vec<i64> = trend.iter().map(|p| p.year).collect();
        assert_eq!(years, vec![2019, 2023]);
        assert_eq!(trend[0].avg_price, 5.0);
        assert_eq!(trend[1].avg_price, 10.0);
    }

    #[test]
    fn price_trend_needs_both_columns() {
        let ds = dataset(&["year", "rate"], &[&[I(2021), I(1)]]);
        assert!(build_price_trend(&ds).is_empty());
    }

    #[test]
    fn demand_trend_uses_first_demand_column() {
        let ds = dataset(
            &["year", "interest", "requests"],
            &[&[I(2020), I(1), I(10)], &[I(2020), I(3), I(30)], &[I(2021), I(5), Null]],
        );
        assert_eq!(demand_column(&ds), Some("requests"));
        assert_eq!(
            build_demand_trend(&ds),
            vec![DemandPoint { year: 2020, avg_demand: 20.0 }]
        );
    }

    #[test]
    fn demand_trend_empty_without_columns() {
        let no_year = dataset(&["demand"], &[&[I(1)]]);
        let no_demand = dataset(&["year", "price"], &[&[I(2020), I(1)]]);
        assert!(build_demand_trend(&no_year).is_empty());
        assert!(build_demand_trend(&no_demand).is_empty());
    }

    #[test]
    fn trend_serializes_with_metric_names() {
        let json = serde_json::to_string(&PricePoint { year: 2021, avg_price: 150.0 }).unwrap();
        assert_eq!(json, r#"{"year":2021,"avg_price":150.0}"#);
    }
}
