use super::model::{CellValue, Dataset, Record};

// ---------------------------------------------------------------------------
// Locality predicate
// ---------------------------------------------------------------------------

/// Columns tried, in order, when the dataset has no `locality` column.
const FALLBACK_COLUMNS: &[&str] = &["area", "location", "place", "name"];

/// Rows whose locality-like column contains `text`, case-insensitively.
///
/// Column resolution:
/// * `locality` if present
/// * otherwise the first of `area`, `location`, `place`, `name`
/// * otherwise every text column (a row matches if any of them does)
/// * otherwise nothing matches
///
/// Null cells never match.  No match yields an empty dataset, not an error.
pub fn filter_by_locality(dataset: &Dataset, text: &str) -> Dataset {
    let needle = text.to_lowercase();

    let columns: Vec<&str> = if dataset.has_column("locality") {
        vec!["locality"]
    } else if let Some(col) = dataset.first_column(FALLBACK_COLUMNS) {
        vec![col]
    } else {
        dataset.text_columns()
    };

    if columns.is_empty() {
        log::debug!("No locality-like or text column; '{text}' matches nothing");
        return dataset.empty_like();
    }

    let filtered = dataset.retain_rows(|record| row_matches(record, &columns, &needle));
    log::debug!(
        "Locality '{text}' matched {} of {} rows on {:?}",
        filtered.len(),
        dataset.len(),
        columns
    );
    filtered
}

fn row_matches(record: &Record, columns: &[&str], needle: &str) -> bool {
    columns.iter().any(|col| match Dataset::cell(record, col) {
        CellValue::Null => false,
        value => value.to_string().to_lowercase().contains(needle),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(columns: &[&str], rows: &[&[CellValue]]) -> Dataset {
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        let rows: Vec<Record> = rows
            .iter()
            .map(|cells| columns.iter().cloned().zip(cells.iter().cloned()).collect())
            .collect();
        Dataset::new(columns, rows)
    }

    fn s(v: &str) -> CellValue {
        CellValue::String(v.to_string())
    }

    fn localities(ds: &Dataset, col: &str) -> Vec<String> {
        ds.rows.iter().map(|r| Dataset::cell(r, col).to_string()).collect()
    }

    #[test]
    fn matches_locality_substring_case_insensitively() {
        let ds = dataset(
            &["locality", "price"],
            &[
                &[s("Wakad"), CellValue::Integer(10)],
                &[s("Ambegaon Budruk"), CellValue::Integer(20)],
                &[s("WAKAD Phase 2"), CellValue::Integer(30)],
                &[CellValue::Null, CellValue::Integer(40)],
            ],
        );
        let out = filter_by_locality(&ds, "wakad");
        assert_eq!(localities(&out, "locality"), vec!["Wakad", "WAKAD Phase 2"]);
        assert_eq!(out.columns, ds.columns);
    }

    #[test]
    fn falls_back_to_named_columns_in_order() {
        let ds = dataset(
            &["name", "place"],
            &[&[s("Wakad Heights"), s("Baner")], &[s("Baner Residency"), s("Wakad")]],
        );
        // `place` precedes `name` in the fallback order.
        let out = filter_by_locality(&ds, "Wakad");
        assert_eq!(localities(&out, "name"), vec!["Baner Residency"]);
    }

    #[test]
    fn falls_back_to_any_text_column() {
        let ds = dataset(
            &["city", "project", "price"],
            &[
                &[s("Pune"), s("Kothrud East Towers"), CellValue::Integer(1)],
                &[s("Kothrud"), s("Skyline"), CellValue::Integer(2)],
                &[s("Mumbai"), s("Skyline"), CellValue::Integer(3)],
            ],
        );
        let out = filter_by_locality(&ds, "kothrud");
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn no_text_columns_matches_nothing() {
        let ds = dataset(&["year", "price"], &[&[CellValue::Integer(2021), CellValue::Integer(5)]]);
        let out = filter_by_locality(&ds, "2021");
        assert!(out.is_empty());
        assert_eq!(out.columns, ds.columns);
    }

    #[test]
    fn unmatched_text_yields_empty_dataset() {
        let ds = dataset(&["locality"], &[&[s("Wakad")]]);
        assert!(filter_by_locality(&ds, "Nowhereville").is_empty());
    }

    #[test]
    fn filtering_is_idempotent() {
        let ds = dataset(
            &["locality"],
            &[&[s("Wakad")], &[s("Baner")], &[s("wakad west")], &[CellValue::Null]],
        );
        let once = filter_by_locality(&ds, "Wakad");
        let twice = filter_by_locality(&once, "Wakad");
        assert_eq!(once, twice);
    }
}
