//! Chart rendering and the single-page PDF report.

pub mod chart;
pub mod pdf;

pub use chart::{render_chart, render_chart_png};
pub use pdf::render_pdf;
