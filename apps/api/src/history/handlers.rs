use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::analysis::parser::section_contents;
use crate::errors::AppError;
use crate::history::session::WorkspaceSnapshot;
use crate::models::analysis::HistoryItem;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SectionView {
    pub title: &'static str,
    pub body: String,
    pub references: Vec<String>,
}

/// GET /api/history
pub async fn handle_list_history(State(state): State<AppState>) -> Json<Vec<HistoryItem>> {
    Json(state.history.list().await)
}

/// GET /api/history/:id
pub async fn handle_get_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<HistoryItem>, AppError> {
    find_item(&state, &id).await.map(Json)
}

/// DELETE /api/history/:id
pub async fn handle_delete_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state
        .history
        .remove(&id)
        .await
        .ok_or_else(|| not_found(&id))?;
    state.workspace.forget(&id);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/history/:id/select
pub async fn handle_select_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    find_item(&state, &id).await?;
    state.workspace.select(&id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/history/:id/sections
/// The four sections in order, each split into body and references.
pub async fn handle_history_sections(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<SectionView>>, AppError> {
    let item = find_item(&state, &id).await?;
    let sections = section_contents(&item.result)
        .into_iter()
        .map(|(section, content)| SectionView {
            title: section.title(),
            body: content.body,
            references: content.references,
        })
        .collect();
    Ok(Json(sections))
}

/// GET /api/session
pub async fn handle_get_session(State(state): State<AppState>) -> Json<WorkspaceSnapshot> {
    Json(state.workspace.snapshot())
}

/// POST /api/session/reset
pub async fn handle_reset_session(State(state): State<AppState>) -> Json<WorkspaceSnapshot> {
    state.workspace.reset();
    Json(state.workspace.snapshot())
}

pub(crate) async fn find_item(state: &AppState, id: &str) -> Result<HistoryItem, AppError> {
    state.history.get(id).await.ok_or_else(|| not_found(id))
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("History item {id} not found"))
}
