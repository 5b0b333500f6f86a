mod analysis;
mod config;
mod errors;
mod history;
mod llm_client;
mod models;
mod report;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::history::session::WorkspaceHandle;
use crate::history::store::{KeyValueStore, MemoryStore, RedisStore};
use crate::history::HistoryStore;
use crate::llm_client::{CompletionGateway, GeminiClient};
use crate::report::load_report_font;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first; nothing is required, malformed numbers fail here
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting UX Insight API v{}", env!("CARGO_PKG_VERSION"));

    // History storage: Redis when configured, process memory otherwise
    let kv: Arc<dyn KeyValueStore> = match &config.redis_url {
        Some(url) => {
            let store = RedisStore::open(url)?;
            info!("History store: Redis");
            Arc::new(store)
        }
        None => {
            warn!("REDIS_URL not set, history is kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };
    let history = HistoryStore::new(kv, config.history_storage_key.clone());

    // Completion gateway; absent without a credential
    let gateway = match &config.gemini_api_key {
        Some(key) => {
            let client = GeminiClient::new(
                key.clone(),
                config.gemini_api_base.clone(),
                config.llm_timeout,
            )?;
            info!(
                "LLM client initialized (model: {}, fallback: {})",
                config.primary_model, config.fallback_model
            );
            Some(CompletionGateway::new(
                Arc::new(client),
                config.primary_model.clone(),
                config.fallback_model.clone(),
            ))
        }
        None => {
            warn!("No Gemini API key configured: analysis disabled, chat serves sample data");
            None
        }
    };

    // Report font: configured TTF or built-in Helvetica
    let report_font = load_report_font(config.report_font_path.as_deref())?;
    if config.report_font_path.is_none() {
        warn!("REPORT_FONT_PATH not set, PDF reports use Helvetica (no Hangul glyphs)");
    }

    // Build app state
    let state = AppState {
        gateway,
        history,
        workspace: WorkspaceHandle::new(),
        report_font,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
