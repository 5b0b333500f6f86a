use axum::{
    body::Bytes,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Local, Utc};
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::history::handlers::find_item;
use crate::models::analysis::AnalysisResult;
use crate::report::{layout_report, render_pdf, report_file_name};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    pub topic: String,
    pub result: AnalysisResult,
    /// Date printed in the title block, shown in server-local time; defaults to now.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

/// GET /api/history/:id/report.pdf
pub async fn handle_history_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let item = find_item(&state, &id).await?;
    pdf_response(&state, item.topic, item.result, item.created_at).await
}

/// POST /api/report
pub async fn handle_render_report(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, AppError> {
    let req: ReportRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("Invalid report request: {e}")))?;
    let topic = req.topic.trim().to_string();
    if topic.is_empty() {
        return Err(AppError::Validation("topic is required".to_string()));
    }
    pdf_response(&state, topic, req.result, req.date.unwrap_or_else(Utc::now)).await
}

async fn pdf_response(
    state: &AppState,
    topic: String,
    result: AnalysisResult,
    at: DateTime<Utc>,
) -> Result<Response, AppError> {
    let font = state.report_font.clone();
    let file_name = report_file_name(&topic, at);

    let pdf = tokio::task::spawn_blocking(move || {
        let layout = layout_report(&result, &topic, at.with_timezone(&Local).date_naive());
        render_pdf(&layout, &font)
    })
    .await
    .map_err(|e| AppError::Internal(e.into()))??;

    info!("Rendered report {file_name} ({} bytes)", pdf.len());
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(&file_name)),
        ],
        pdf,
    )
        .into_response())
}

/// `attachment` with an ASCII `filename` fallback and the UTF-8 name in `filename*`.
pub fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| if c.is_ascii_graphic() || c == ' ' { c } else { '_' })
        .filter(|c| *c != '"' && *c != '\\')
        .collect();
    format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        percent_encode(file_name)
    )
}

/// RFC 5987 `attr-char` encoding.
fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len() * 3);
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
