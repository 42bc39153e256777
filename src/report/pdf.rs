use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use super::chart::{render_chart, CHART_HEIGHT, CHART_WIDTH};
use crate::analysis::PricePoint;
use crate::error::ReportError;

// A4 portrait, in points.
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN_LEFT: i64 = 56;

const TITLE_SIZE: i64 = 20;
const BODY_SIZE: i64 = 11;
const BODY_LEADING: i64 = 15;
/// Characters per summary line at `BODY_SIZE` Helvetica across the text column.
const WRAP_CHARS: usize = 86;

// The chart is placed at 60% of its pixel size.
const IMAGE_WIDTH: i64 = CHART_WIDTH as i64 * 3 / 5;
const IMAGE_HEIGHT: i64 = CHART_HEIGHT as i64 * 3 / 5;

/// Compose the single-page locality report.
///
/// Layout top to bottom: title, summary paragraph, then the chart image with
/// its own caption and axis labels.  An empty trend still produces a
/// complete document.
pub fn render_pdf(
    label: &str,
    summary: &str,
    trend: &[PricePoint],
) -> Result<Vec<u8>, ReportError> {
    let chart = render_chart(label, trend)?;

    let mut ops = Vec::new();
    let mut y = PAGE_HEIGHT - 62;

    let title = format!("Real Estate Report - {label}");
    text(&mut ops, "F2", TITLE_SIZE, MARGIN_LEFT, y, &title);
    y -= 36;

    for line in wrap(summary, WRAP_CHARS) {
        text(&mut ops, "F1", BODY_SIZE, MARGIN_LEFT, y, &line);
        y -= BODY_LEADING;
    }
    y -= 20;

    let image_x = (PAGE_WIDTH - IMAGE_WIDTH) / 2;
    let image_y = y - IMAGE_HEIGHT;
    ops.push(Operation::new("q", vec![]));
    ops.push(Operation::new(
        "cm",
        vec![
            IMAGE_WIDTH.into(),
            0.into(),
            0.into(),
            IMAGE_HEIGHT.into(),
            image_x.into(),
            image_y.into(),
        ],
    ));
    ops.push(Operation::new("Do", vec!["Im1".into()]));
    ops.push(Operation::new("Q", vec![]));

    let content = Content { operations: ops }
        .encode()
        .map_err(|e| ReportError::Pdf(e.to_string()))?;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });

    let (width, height) = chart.dimensions();
    let mut image = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        chart.into_raw(),
    );
    let _ = image.compress();
    let image_id = doc.add_object(image);

    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular,
            "F2" => bold,
        },
        "XObject" => dictionary! {
            "Im1" => image_id,
        },
    });

    let mut contents = Stream::new(dictionary! {}, content);
    let _ = contents.compress();
    let content_id = doc.add_object(contents);

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(latin1(&title)),
        "Producer" => Object::string_literal("locality-insights"),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| ReportError::Pdf(e.to_string()))?;
    Ok(bytes)
}

fn text(ops: &mut Vec<Operation>, font: &str, size: i64, x: i64, y: i64, body: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec![font.into(), size.into()]));
    ops.push(Operation::new("Td", vec![x.into(), y.into()]));
    ops.push(Operation::new("Tj", vec![Object::string_literal(latin1(body))]));
    ops.push(Operation::new("ET", vec![]));
}

/// WinAnsi bytes for the standard fonts; characters outside Latin-1 become `?`.
fn latin1(body: &str) -> Vec<u8> {
    body.chars()
        .map(|c| match u32::from(c) {
            code @ (0x20..=0x7e | 0xa0..=0xff) => code as u8,
            _ => b'?',
        })
        .collect()
}

/// Greedy word wrap to at most `width` characters per line.  Words longer
/// than a line get a line of their own.
fn wrap(body: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in body.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
