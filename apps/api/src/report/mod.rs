// Report Renderer: analysis result → paginated A4 PDF.
// Layout is pure (layout.rs); PDF emission is CPU-bound and must run inside spawn_blocking.

pub mod font_metrics;
pub mod handlers;
pub mod layout;
pub mod pdf;

use thiserror::Error;

pub use layout::{layout_report, ReportLayout};
pub use pdf::{render_pdf, report_file_name, ReportFont};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("PDF generation failed: {0}")]
    Pdf(String),

    #[error("Report font could not be loaded: {0}")]
    Font(#[from] std::io::Error),
}

/// Loads the configured TTF, or the built-in Helvetica when no path is set.
pub fn load_report_font(path: Option<&std::path::Path>) -> Result<ReportFont, ReportError> {
    match path {
        Some(path) => Ok(ReportFont::External(std::sync::Arc::new(std::fs::read(path)?))),
        None => Ok(ReportFont::Helvetica),
    }
}
