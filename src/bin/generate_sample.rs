//! Writes a synthetic locality dataset for local development.
//!
//! Usage: `generate_sample [OUTPUT]`, default `dataset/sampledata.csv`.  An
//! output ending in `.parquet` is written as Parquet instead of CSV.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// (name, base price per sq.ft in the first year, yearly growth, base demand)
const LOCALITIES: &[(&str, f64, f64, f64)] = &[
    ("Wakad", 5600.0, 0.07, 120.0),
    ("Baner", 8200.0, 0.05, 95.0),
    ("Aundh", 9100.0, 0.04, 80.0),
    ("Akurdi", 4700.0, 0.06, 60.0),
    ("Hinjewadi", 6100.0, 0.08, 140.0),
    ("Kothrud East", 10400.0, 0.03, 70.0),
    ("Ambegaon Budruk", 5200.0, 0.05, 45.0),
];

const PROPERTY_TYPES: &[&str] = &["Apartment", "Villa", "Plot"];
const FIRST_YEAR: i64 = 2019;
const YEARS: i64 = 6;
const LISTINGS_PER_YEAR: usize = 4;

struct Listing {
    area: String,
    year: i64,
    rate: f64,
    demand: i64,
    property_type: String,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    /// Uniform in `[-1, 1)`.
    fn jitter(&mut self) -> f64 {
        ((self.next_u64() >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }
}

fn generate(rng: &mut SimpleRng) -> Vec<Listing> {
    let mut listings = Vec::new();
    for &(area, base, growth, demand) in LOCALITIES {
        for offset in 0..YEARS {
            let trend = base * (1.0 + growth).powi(offset as i32);
            for _ in 0..LISTINGS_PER_YEAR {
                listings.push(Listing {
                    area: area.to_string(),
                    year: FIRST_YEAR + offset,
                    rate: (trend * (1.0 + 0.08 * rng.jitter())).round(),
                    demand: (demand * (1.0 + 0.04 * offset as f64) * (1.0 + 0.25 * rng.jitter()))
                        .round() as i64,
                    property_type: rng.pick(PROPERTY_TYPES).to_string(),
                });
            }
        }
    }
    listings
}

fn write_csv(path: &Path, listings: &[Listing]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV output")?;
    writer.write_record(["Area", "Year", "Rate", "Demand", "Property Type"])?;
    for l in listings {
        writer.write_record([
            l.area.clone(),
            l.year.to_string(),
            l.rate.to_string(),
            l.demand.to_string(),
            l.property_type.clone(),
        ])?;
    }
    writer.flush().context("flushing CSV output")?;
    Ok(())
}

fn write_parquet(path: &Path, listings: &[Listing]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("Area", DataType::Utf8, false),
        Field::new("Year", DataType::Int64, false),
        Field::new("Rate", DataType::Float64, false),
        Field::new("Demand", DataType::Int64, false),
        Field::new("Property Type", DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from_iter_values(listings.iter().map(|l| l.area.as_str()))),
            Arc::new(Int64Array::from_iter_values(listings.iter().map(|l| l.year))),
            Arc::new(Float64Array::from_iter_values(listings.iter().map(|l| l.rate))),
            Arc::new(Int64Array::from_iter_values(listings.iter().map(|l| l.demand))),
            Arc::new(StringArray::from_iter_values(
                listings.iter().map(|l| l.property_type.as_str()),
            )),
        ],
    )
    .context("building record batch")?;

    let file = fs::File::create(path).context("creating Parquet output")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating Parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing Parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "dataset/sampledata.csv".to_string());
    let path = Path::new(&output);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let mut rng = SimpleRng::new(42);
    let listings = generate(&mut rng);

    let is_parquet = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("parquet"));
    if is_parquet {
        write_parquet(path, &listings)?;
    } else {
        write_csv(path, &listings)?;
    }

    println!(
        "Wrote {} listings across {} localities to {output}",
        listings.len(),
        LOCALITIES.len()
    );
    Ok(())
}
