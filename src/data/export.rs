use super::model::Dataset;
use crate::error::ReportError;

/// Serialize a dataset as CSV: header row in column order, `Null` as an empty field.
pub fn to_csv(dataset: &Dataset) -> Result<Vec<u8>, ReportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(&dataset.columns)
        .map_err(|e| ReportError::Csv(e.to_string()))?;

    for record in &dataset.rows {
        let fields = dataset
            .columns
            .iter()
            .map(|col| Dataset::cell(record, col).to_string());
        writer
            .write_record(fields)
            .map_err(|e| ReportError::Csv(e.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|e| ReportError::Csv(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::data::filter::filter_by_locality;
    use crate::data::loader::load_file;
    use crate::data::model::CellValue;

    #[test]
    fn writes_header_and_empty_nulls() {
        let ds = Dataset::new(
            vec!["locality".into(), "price".into()],
            vec![[
                ("locality".to_string(), CellValue::String("Wakad, West".into())),
                ("price".to_string(), CellValue::Null),
            ]
            .into_iter()
            .collect()],
        );
        let bytes = to_csv(&ds).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "locality,price\n\"Wakad, West\",\n");
    }

    #[test]
    fn filtered_export_reloads_with_same_rows() {
        let mut source = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        source
            .write_all(
                b" Area ,Year,Rate\nWakad,2020,5000\nBaner,2020,7000\nwakad,2021,5500.5\nWakad,,\n",
            )
            .unwrap();
        source.flush().unwrap();

        let ds = load_file(source.path()).unwrap();
        let filtered = filter_by_locality(&ds, "Wakad");
        assert_eq!(filtered.len(), 3);

        let mut exported = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        exported.write_all(&to_csv(&filtered).unwrap()).unwrap();
        exported.flush().unwrap();

        let reloaded = load_file(exported.path()).unwrap();
        assert_eq!(reloaded.len(), filtered.len());
        assert_eq!(reloaded.columns, filtered.columns);
        let names = |d: &Dataset| -> Vec<String> {
            d.rows
                .iter()
                .map(|r| Dataset::cell(r, "locality").to_string())
                .collect()
        };
        assert_eq!(names(&reloaded), names(&filtered));
        assert_eq!(reloaded, filtered);
    }
}
