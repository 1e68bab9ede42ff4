//! CSV and PDF rendering of reports.

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};

use crate::errors::AppError;
use crate::models::Report;

/// Columns of the CSV export, in order.
pub const CSV_FIELDS: [&str; 4] = ["city", "metric", "value", "timestamp"];

const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const MARGIN: f32 = 20.0;
const LINE_HEIGHT: f32 = 7.0;

/// Render reports as CSV with a header row.
pub fn reports_to_csv(reports: &[Report]) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_FIELDS).map_err(csv_error)?;

    for report in reports {
        let value = report.value.to_string();
        writer
            .write_record([
                report.city.as_str(),
                report.metric.as_str(),
                value.as_str(),
                report.timestamp.as_str(),
            ])
            .map_err(csv_error)?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("Error exporting CSV: {}", e)))
}

fn csv_error(err: csv::Error) -> AppError {
    AppError::Internal(format!("Error exporting CSV: {}", err))
}

/// One line of the PDF export.
pub fn pdf_line(report: &Report) -> String {
    format!(
        "City: {} | Metric: {} | Value: {} | Time: {}",
        report.city, report.metric, report.value, report.timestamp
    )
}

/// Render reports as an A4 PDF, one line per report, paginated.
///
/// Text is set in the built-in Helvetica font, which only covers Latin
/// characters. Anything outside it (Tamil city names, for instance) is left
/// out of the rendered line.
pub fn reports_to_pdf(reports: &[Report]) -> Result<Vec<u8>, AppError> {
    let (doc, page, layer) = PdfDocument::new("Reports Export", PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_error)?;

    let mut current = doc.get_page(page).get_layer(layer);
    let mut y = PAGE_HEIGHT.0 - MARGIN;

    current.use_text("Reports Export", 18.0, Mm(MARGIN), Mm(y), &bold);
    y -= LINE_HEIGHT * 2.0;

    for report in reports {
        if y < MARGIN {
            let (page, layer) = doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
            current = doc.get_page(page).get_layer(layer);
            y = PAGE_HEIGHT.0 - MARGIN;
        }
        write_line(&current, &pdf_line(report), y, &regular);
        y -= LINE_HEIGHT;
    }

    doc.save_to_bytes().map_err(pdf_error)
}

fn write_line(layer: &PdfLayerReference, text: &str, y: f32, font: &IndirectFontRef) {
    layer.use_text(text, 10.0, Mm(MARGIN), Mm(y), font);
}

fn pdf_error(err: printpdf::Error) -> AppError {
    AppError::Internal(format!("Error exporting PDF: {:?}", err))
}
