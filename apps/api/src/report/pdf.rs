//! PDF emission for a laid-out report.
//!
//! CPU-bound: callers run `render_pdf` inside `tokio::task::spawn_blocking`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use printpdf::{BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, Rgb};

use crate::report::layout::{ReportLayout, A4_H, A4_W, REPORT_TITLE};
use crate::report::ReportError;

const LAYER_NAME: &str = "Layer 1";

/// Font used for every run. The base-14 Helvetica has no Hangul glyphs, so deployments
/// that need Korean output configure an external TTF.
#[derive(Clone, Default)]
pub enum ReportFont {
    #[default]
    Helvetica,
    External(Arc<Vec<u8>>),
}

/// Writes every page of `layout` into a PDF document.
pub fn render_pdf(layout: &ReportLayout, font: &ReportFont) -> Result<Vec<u8>, ReportError> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(REPORT_TITLE, Mm(A4_W), Mm(A4_H), LAYER_NAME);

    let (regular, bold): (IndirectFontRef, IndirectFontRef) = match font {
        ReportFont::Helvetica => (
            doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?,
            doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_error)?,
        ),
        ReportFont::External(bytes) => {
            let font = doc.add_external_font(bytes.as_slice()).map_err(pdf_error)?;
            (font.clone(), font)
        }
    };

    let black = Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None));
    let gray = Color::Rgb(Rgb::new(0.39, 0.39, 0.39, None));

    for (index, runs) in layout.pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(Mm(A4_W), Mm(A4_H), LAYER_NAME);
            doc.get_page(page).get_layer(layer)
        };

        for run in runs {
            let color = if run.style.is_muted() { gray.clone() } else { black.clone() };
            layer.set_fill_color(color);
            let font = if run.style.is_bold() { &bold } else { &regular };
            layer.use_text(
                run.text.as_str(),
                run.style.font_size_pt(),
                Mm(run.x_mm),
                Mm(A4_H - run.y_mm),
                font,
            );
        }
    }

    doc.save_to_bytes().map_err(pdf_error)
}

fn pdf_error(e: printpdf::Error) -> ReportError {
    ReportError::Pdf(e.to_string())
}

/// `kt-ds-UX-Insight-{topic}-{millis}.pdf`, topic cut to 20 characters and stripped of
/// characters that are unsafe in file names.
pub fn report_file_name(topic: &str, at: DateTime<Utc>) -> String {
    const UNSAFE: &[char] = &['/', '\\', '?', '%', '*', '|', '"', '<', '>'];
    let topic: String = topic
        .chars()
        .take(20)
        .filter(|c| !UNSAFE.contains(c))
        .collect();
    format!("kt-ds-UX-Insight-{topic}-{}.pdf", at.timestamp_millis())
}
