use std::fmt::Display;
use std::io::Cursor;

use image::{ImageFormat, RgbImage};
use once_cell::sync::Lazy;
use plotters::prelude::*;
use plotters::style::register_font;

use crate::analysis::PricePoint;
use crate::error::ReportError;

pub const CHART_WIDTH: u32 = 800;
pub const CHART_HEIGHT: u32 = 500;

const FONT: &str = "sans-serif";
const FONT_BYTES: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

const SERIES: RGBColor = RGBColor(31, 119, 180);
const GRID: RGBColor = RGBColor(225, 225, 225);

/// Registered once per process; every chart draws its text with it.
static FONT_REGISTERED: Lazy<Result<(), String>> = Lazy::new(|| {
    register_font(FONT, FontStyle::Normal, FONT_BYTES).map_err(|_| "InvalidFont".to_string())
});

/// Data-space bounds of the plot area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartExtent {
    pub years: (f64, f64),
    pub prices: (f64, f64),
}

impl ChartExtent {
    pub fn of(trend: &[PricePoint]) -> Self {
        if trend.is_empty() {
            return ChartExtent {
                years: (0.0, 1.0),
                prices: (0.0, 1.0),
            };
        }
        let (mut y0, mut y1) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut p0, mut p1) = (f64::INFINITY, f64::NEG_INFINITY);
        for point in trend {
            y0 = y0.min(point.year as f64);
            y1 = y1.max(point.year as f64);
            p0 = p0.min(point.avg_price);
            p1 = p1.max(point.avg_price);
        }
        let pad = if p1 > p0 {
            (p1 - p0) * 0.1
        } else {
            (p0.abs() * 0.1).max(1.0)
        };
        ChartExtent {
            years: (y0 - 0.5, y1 + 0.5),
            prices: (p0 - pad, p1 + pad),
        }
    }
}

/// Render the price trend as a line chart with point markers.
///
/// The image carries the caption `Price Trend - {label}`, the `Year` and
/// `Avg Price` axis descriptions and tick labels.  An empty trend gives an
/// empty labelled frame.
pub fn render_chart(label: &str, trend: &[PricePoint]) -> Result<RgbImage, ReportError> {
    FONT_REGISTERED
        .as_ref()
        .map_err(|e| ReportError::Chart(format!("font registration failed: {e}")))?;

    let mut buffer = vec![0u8; (CHART_WIDTH * CHART_HEIGHT * 3) as usize];
    let extent = ChartExtent::of(trend);

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (CHART_WIDTH, CHART_HEIGHT))
            .into_drawing_area();
        root.fill(&WHITE).map_err(chart_error)?;

        let (x0, x1) = extent.years;
        let (y0, y1) = extent.prices;
        let mut chart = ChartBuilder::on(&root)
            .caption(format!("Price Trend - {label}"), (FONT, 22))
            .margin(20)
            .x_label_area_size(45)
            .y_label_area_size(80)
            .build_cartesian_2d(x0..x1, y0..y1)
            .map_err(chart_error)?;

        chart
            .configure_mesh()
            .x_desc("Year")
            .y_desc("Avg Price")
            .axis_desc_style((FONT, 15))
            .label_style((FONT, 12))
            .light_line_style(WHITE)
            .bold_line_style(GRID)
            .x_label_formatter(&|x| year_label(*x))
            .y_label_formatter(&|y| format!("{y:.0}"))
            .draw()
            .map_err(chart_error)?;

        let points: Vec<(f64, f64)> = trend
            .iter()
            .map(|p| (p.year as f64, p.avg_price))
            .collect();
        chart
            .draw_series(LineSeries::new(
                points.iter().copied(),
                SERIES.stroke_width(2),
            ))
            .map_err(chart_error)?;
        chart
            .draw_series(points.iter().map(|&p| Circle::new(p, 5, SERIES.filled())))
            .map_err(chart_error)?;

        root.present().map_err(chart_error)?;
    }

    RgbImage::from_raw(CHART_WIDTH, CHART_HEIGHT, buffer)
        .ok_or_else(|| ReportError::Chart("pixel buffer size mismatch".to_string()))
}

/// The chart as PNG bytes.
pub fn render_chart_png(label: &str, trend: &[PricePoint]) -> Result<Vec<u8>, ReportError> {
    let image = render_chart(label, trend)?;
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

/// Whole years only; the half-year padding ticks stay blank.
fn year_label(x: f64) -> String {
    if (x - x.round()).abs() < 1e-6 {
        format!("{x:.0}")
    } else {
        String::new()
    }
}

fn chart_error<E: Display>(err: E) -> ReportError {
    ReportError::Chart(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trend() -> Vec<PricePoint> {
        vec![
            PricePoint { year: 2020, avg_price: 5000.0 },
            PricePoint { year: 2021, avg_price: 5600.0 },
            PricePoint { year: 2023, avg_price: 6200.0 },
        ]
    }

    fn has_dark_pixels(image: &RgbImage, rows: std::ops::Range<u32>) -> bool {
        rows.flat_map(|y| (0..image.width()).map(move |x| (x, y)))
            .any(|(x, y)| image.get_pixel(x, y).0.iter().all(|&c| c < 128))
    }

    #[test]
    fn extent_pads_years_and_prices() {
        let extent = ChartExtent::of(&trend());
        assert_eq!(extent.years, (2019.5, 2023.5));
        assert!((extent.prices.0 - 4880.0).abs() < 1e-9);
        assert!((extent.prices.1 - 6320.0).abs() < 1e-9);
    }

    #[test]
    fn flat_trend_gets_nonzero_price_span() {
        let extent = ChartExtent::of(&[PricePoint { year: 2022, avg_price: 0.0 }]);
        assert_eq!(extent.prices, (-1.0, 1.0));
        assert_eq!(extent.years, (2021.5, 2022.5));
    }

    #[test]
    fn renders_series_pixels() {
        let image = render_chart("Wakad", &trend()).unwrap();
        assert_eq!(image.dimensions(), (CHART_WIDTH, CHART_HEIGHT));
        assert!(image.pixels().any(|p| p.0 == [SERIES.0, SERIES.1, SERIES.2]));
        assert_eq!(image.get_pixel(0, 0).0, [255, 255, 255]);
    }

    #[test]
    fn caption_is_drawn_into_the_image() {
        let image = render_chart("Wakad", &trend()).unwrap();
        // Caption band above the plot area.
        assert!(has_dark_pixels(&image, 0..45));

        let other = render_chart("Kothrud East", &trend()).unwrap();
        assert_ne!(image, other);
    }

    #[test]
    fn axis_labels_are_drawn_outside_the_plot_area() {
        let image = render_chart("Baner", &trend()).unwrap();
        // x tick labels and the `Year` description sit in the bottom band.
        assert!(has_dark_pixels(&image, CHART_HEIGHT - 60..CHART_HEIGHT));
    }

    #[test]
    fn empty_trend_renders_labelled_frame() {
        let image = render_chart("Nowhere", &[]).unwrap();
        assert!(!image.pixels().any(|p| p.0 == [SERIES.0, SERIES.1, SERIES.2]));
        assert!(has_dark_pixels(&image, 0..45));
    }

    #[test]
    fn only_whole_years_are_labelled() {
        assert_eq!(year_label(2021.0), "2021");
        assert_eq!(year_label(2021.5), "");
    }

    #[test]
    fn png_has_signature() {
        let png = render_chart_png("Wakad", &trend()).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
