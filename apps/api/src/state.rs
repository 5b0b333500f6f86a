use crate::history::session::WorkspaceHandle;
use crate::history::HistoryStore;
use crate::llm_client::CompletionGateway;
use crate::report::ReportFont;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// `None` when no provider credential is configured. Analysis then answers 500,
    /// chat answers with sample data.
    pub gateway: Option<CompletionGateway>,
    pub history: HistoryStore,
    /// The single workspace: in-flight guard and active history selection.
    pub workspace: WorkspaceHandle,
    pub report_font: ReportFont,
}
