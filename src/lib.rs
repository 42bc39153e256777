//! Locality analytics over a tabular real-estate dataset.
//!
//! The dataset is loaded once into a [`data::cache::DatasetCache`]; each
//! request filters it by locality and derives yearly trends, a text summary,
//! multi-locality rankings and PDF/PNG/CSV exports.  [`server`] exposes all of
//! it over HTTP.

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod query;
pub mod report;
pub mod server;
