use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::request::RequestError;
use crate::llm_client::GatewayError;
use crate::report::ReportError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// The body is always `{ "error": <user-facing message>, "code": <machine code> }`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The operator has not configured a provider credential.
    #[error("Missing credential")]
    MissingCredential,

    #[error("Upstream error: {0}")]
    Upstream(#[from] GatewayError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<RequestError> for AppError {
    fn from(e: RequestError) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::MissingCredential => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "MISSING_CREDENTIAL",
                "API 키가 설정되지 않았습니다. 프로젝트 루트의 .env에 GOOGLE_GENERATIVE_AI_API_KEY=발급받은키 를 \
                 추가한 뒤 서버를 재시작해주세요."
                    .to_string(),
            ),
            AppError::Upstream(e) => {
                tracing::error!("Gemini API error: {e}");
                let code = match e {
                    GatewayError::Auth(_) => "UPSTREAM_AUTH_ERROR",
                    GatewayError::Upstream(_) => "UPSTREAM_ERROR",
                };
                (StatusCode::BAD_GATEWAY, code, e.user_message())
            }
            AppError::Report(e) => {
                tracing::error!("Report error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "REPORT_ERROR",
                    "보고서 PDF를 생성하지 못했습니다.".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "code": code,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::Validation("topic is required".into()), StatusCode::BAD_REQUEST),
            (AppError::MissingCredential, StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::Upstream(GatewayError::Upstream("x".into())), StatusCode::BAD_GATEWAY),
            (AppError::Upstream(GatewayError::Auth("401".into())), StatusCode::BAD_GATEWAY),
            (AppError::Conflict("busy".into()), StatusCode::CONFLICT),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_request_error_maps_to_validation() {
        let err: AppError = RequestError::MissingField("topic").into();
        assert!(matches!(err, AppError::Validation(ref m) if m == "topic is required"));
    }
}
