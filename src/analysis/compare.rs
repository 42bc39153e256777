use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use super::summary::summarize;
use super::trend::{build_demand_trend, build_price_trend, DemandPoint, PricePoint};
use crate::data::filter::filter_by_locality;
use crate::data::model::{CellValue, Dataset};

/// JSON key holding the ranking; not usable as a locality name.
pub const RANKING_KEY: &str = "_ranking";

/// Everything computed for one locality's rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalityReport {
    pub summary: String,
    pub price_trend: Vec<PricePoint>,
    pub demand_trend: Vec<DemandPoint>,
    pub avg_price: Option<f64>,
    pub count: usize,
}

impl LocalityReport {
    /// Summarize an already-filtered dataset under `label`.
    pub fn build(filtered: &Dataset, label: &str) -> Self {
        LocalityReport {
            summary: summarize(filtered, label),
            price_trend: build_price_trend(filtered),
            demand_trend: build_demand_trend(filtered),
            avg_price: average_price(filtered),
            count: filtered.len(),
        }
    }
}

/// Per-locality outcome of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LocalityOutcome {
    Found(LocalityReport),
    Missing { error: String },
}

impl LocalityOutcome {
    fn missing() -> Self {
        LocalityOutcome::Missing {
            error: "no data".to_string(),
        }
    }

    pub fn avg_price(&self) -> Option<f64> {
        match self {
            LocalityOutcome::Found(report) => report.avg_price,
            LocalityOutcome::Missing { .. } => None,
        }
    }
}

/// Outcomes in caller order plus a ranking by average price.
///
/// Serializes as one JSON object: a key per locality, then `_ranking` as a
/// list of `[locality, avg_price]` pairs.  A locality literally named
/// `_ranking` is skipped when serializing so the key stays unique; the HTTP
/// layer rejects that name up front.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComparisonResult {
    pub entries: Vec<(String, LocalityOutcome)>,
    pub ranking: Vec<(String, f64)>,
}

impl ComparisonResult {
    pub fn get(&self, locality: &str) -> Option<&LocalityOutcome> {
        self.entries
            .iter()
            .find(|(name, _)| name == locality)
            .map(|(_, outcome)| outcome)
    }

    /// Insert or replace, keeping the position of the first insertion.
    fn upsert(&mut self, locality: &str, outcome: LocalityOutcome) {
        match self.entries.iter_mut().find(|(name, _)| name == locality) {
            Some((_, slot)) => *slot = outcome,
            None => self.entries.push((locality.to_string(), outcome)),
        }
    }
}

impl Serialize for ComparisonResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entries: Vec<_> = self
            .entries
            .iter()
            .filter(|(locality, _)| locality != RANKING_KEY)
            .collect();
        let mut map = serializer.serialize_map(Some(entries.len() + 1))?;
        for (locality, outcome) in entries {
            map.serialize_entry(locality, outcome)?;
        }
        map.serialize_entry(RANKING_KEY, &self.ranking)?;
        map.end()
    }
}

/// Run the per-locality pipeline for each name and rank the results.
///
/// A locality without rows is recorded as `{"error": "no data"}` and the
/// batch carries on.  The ranking holds every locality with an average price,
/// highest first; ties keep caller order.
pub fn compare(dataset: &Dataset, localities: &[String]) -> ComparisonResult {
    let mut result = ComparisonResult::default();

    for locality in localities {
        let filtered = filter_by_locality(dataset, locality);
        let outcome = if filtered.is_empty() {
            log::info!("Compare: no rows for '{locality}'");
            LocalityOutcome::missing()
        } else {
            LocalityOutcome::Found(LocalityReport::build(&filtered, locality))
        };
        result.upsert(locality, outcome);
    }

    let mut ranking: Vec<(String, f64)> = result
        .entries
        .iter()
        .filter_map(|(name, outcome)| outcome.avg_price().map(|p| (name.clone(), p)))
        .collect();
    ranking.sort_by(|a, b| b.1.total_cmp(&a.1));
    result.ranking = ranking;

    result
}

/// Mean of every non-null `price` cell.  `None` when the column is absent,
/// any present cell is not numeric, or no value remains.
pub fn average_price(dataset: &Dataset) -> Option<f64> {
    if !dataset.has_column("price") {
        return None;
    }
    let mut sum = 0.0;
    let mut count = 0usize;
    for record in &dataset.rows {
        match Dataset::cell(record, "price") {
            CellValue::Null => continue,
            value => {
                sum += value.as_f64()?;
                count += 1;
            }
        }
    }
    (count > 0).then(|| sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CellValue::{Integer as I, Null};
    use crate::data::model::Record;

    fn s(v: &str) -> CellValue {
        CellValue::String(v.to_string())
    }

    fn dataset(columns: &[&str], rows: &[&[CellValue]]) -> Dataset {
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        let rows: Vec<Record> = rows
            .iter()
            .map(|cells| columns.iter().cloned().zip(cells.iter().cloned()).collect())
            .collect();
        Dataset::new(columns, rows)
    }

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn market() -> Dataset {
        dataset(
            &["locality", "year", "price", "demand"],
            &[
                &[s("Wakad"), I(2021), I(5000), I(10)],
                &[s("Wakad"), I(2022), I(6000), I(14)],
                &[s("Baner"), I(2021), I(8000), I(7)],
                &[s("Aundh"), I(2021), Null, Null],
            ],
        )
    }

    #[test]
    fn unmatched_locality_is_reported_and_excluded_from_ranking() {
        let result = compare(&market(), &names(&["Wakad", "Nowhereville"]));

        assert_eq!(
            result.get("Nowhereville"),
            Some(&LocalityOutcome::Missing { error: "no data".into() })
        );
        assert_eq!(result.ranking, vec![("Wakad".to_string(), 5500.0)]);

        let Some(LocalityOutcome::Found(wakad)) = result.get("Wakad") else {
            panic!("Wakad should have data");
        };
        assert_eq!(wakad.count, 2);
        assert_eq!(wakad.price_trend.len(), 2);
        assert_eq!(wakad.demand_trend.len(), 2);
        assert!(wakad.summary.starts_with("Found 2 records for Wakad."));
    }

    #[test]
    fn ranking_is_descending_and_skips_null_prices() {
        let result = compare(&market(), &names(&["Aundh", "Wakad", "Baner"]));
        let ranked: Vec<&str> = result.ranking.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(ranked, vec!["Baner", "Wakad"]);

        let entry_order: Vec<&str> = result.entries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(entry_order, vec!["Aundh", "Wakad", "Baner"]);
        assert_eq!(result.get("Aundh").and_then(LocalityOutcome::avg_price), None);
    }

    #[test]
    fn ties_keep_caller_order() {
        let ds = dataset(
            &["locality", "price"],
            &[&[s("Kharadi"), I(10)], &[s("Hadapsar"), I(10)]],
        );
        let result = compare(&ds, &names(&["Kharadi", "Hadapsar"]));
        let ranked: Vec<&str> = result.ranking.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(ranked, vec!["Kharadi", "Hadapsar"]);
    }

    #[test]
    fn repeated_locality_is_reported_once() {
        let result = compare(&market(), &names(&["Wakad", "Baner", "Wakad"]));
        assert_eq!(result.entries.len(), 2);
        assert_eq!(result.ranking.len(), 2);
    }

    #[test]
    fn non_numeric_price_voids_average() {
        let ds = dataset(&["locality", "price"], &[&[s("Wakad"), I(10)], &[s("Wakad"), s("n/a")]]);
        assert_eq!(average_price(&ds), None);
        let ds = dataset(&["locality", "price"], &[&[s("Wakad"), I(10)], &[s("Wakad"), Null]]);
        assert_eq!(average_price(&ds), Some(10.0));
    }

    #[test]
    fn ranking_key_appears_once() {
        let ds = dataset(&["locality", "price"], &[&[s("_ranking"), I(5)]]);
        let result = compare(&ds, &names(&["_ranking"]));
        let text = serde_json::to_string(&result).unwrap();
        assert_eq!(text.matches("\"_ranking\":").count(), 1);
        assert_eq!(text, r#"{"_ranking":[["_ranking",5.0]]}"#);
    }

    #[test]
    fn serializes_entries_then_ranking() {
        let result = compare(&market(), &names(&["Nowhereville", "Baner"]));
        let json = serde_json::to_value(&result).unwrap();
        let text = serde_json::to_string(&result).unwrap();

        assert_eq!(json["Nowhereville"], serde_json::json!({ "error": "no data" }));
        assert_eq!(json["Baner"]["avg_price"], serde_json::json!(8000.0));
        assert_eq!(json["Baner"]["count"], serde_json::json!(1));
        assert_eq!(json["_ranking"], serde_json::json!([["Baner", 8000.0]]));
        assert!(text.starts_with(r#"{"Nowhereville":"#));
        assert!(text.contains(r#""_ranking":[["Baner",8000.0]]}"#));
    }
}
