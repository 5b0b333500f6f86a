pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::history::handlers as history;
use crate::report::handlers as report;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Analysis + chat
        .route("/api/analyze", post(analysis::handle_analyze))
        .route("/api/chat", post(analysis::handle_chat))
        .route("/api/chat/stream", post(analysis::handle_chat_stream))
        // History
        .route("/api/history", get(history::handle_list_history))
        .route(
            "/api/history/:id",
            get(history::handle_get_history).delete(history::handle_delete_history),
        )
        .route(
            "/api/history/:id/select",
            post(history::handle_select_history),
        )
        .route(
            "/api/history/:id/sections",
            get(history::handle_history_sections),
        )
        // Reports
        .route(
            "/api/history/:id/report.pdf",
            get(report::handle_history_report),
        )
        .route("/api/report", post(report::handle_render_report))
        // Workspace session
        .route("/api/session", get(history::handle_get_session))
        .route("/api/session/reset", post(history::handle_reset_session))
        .with_state(state)
}
