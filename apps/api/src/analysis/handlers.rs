use std::convert::Infallible;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use futures::{future, stream, StreamExt};
use serde::Serialize;
use tracing::{info, warn};

use crate::analysis::parser::parse_sections;
use crate::analysis::prompts::{analysis_system_instruction, build_user_message, chat_system_prompt};
use crate::analysis::request::{parse_analysis_body, parse_chat_body};
use crate::analysis::sample::SAMPLE_RESEARCH_TEXT;
use crate::errors::AppError;
use crate::llm_client::TextStream;
use crate::models::analysis::{AnalysisResult, HistoryItem};
use crate::models::research::ChatInput;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub text: String,
    pub result: AnalysisResult,
    pub history_id: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub text: String,
}

/// POST /api/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let gateway = state.gateway.as_ref().ok_or(AppError::MissingCredential)?;
    let input = parse_analysis_body(&body)?;

    let ticket = state
        .workspace
        .try_begin()
        .ok_or_else(|| AppError::Conflict("An analysis is already in progress".to_string()))?;

    let system = analysis_system_instruction(&input);
    let message = build_user_message(&input);

    let text = match gateway.complete(system.as_deref(), &message).await {
        Ok(text) => text,
        Err(e) => {
            ticket.fail(e.user_message());
            return Err(e.into());
        }
    };

    let result = parse_sections(&text);
    if result.is_empty() {
        warn!("No section markers found in model output for topic {:?}", input.topic);
    }

    let item = HistoryItem::new(input.topic.clone(), result.clone(), input.category, Utc::now());
    let history_id = item.id.clone();
    state.history.record(item).await;
    ticket.complete(&history_id);

    info!("Analysis {history_id} completed ({} chars)", text.len());
    Ok(Json(AnalyzeResponse {
        text,
        result,
        history_id,
    }))
}

/// POST /api/chat
/// Always 200: any failure answers with the sample payload.
pub async fn handle_chat(State(state): State<AppState>, body: Bytes) -> Json<ChatResponse> {
    let text = match chat_input(&state, &body) {
        Some(input) => complete_chat(&state, &input).await,
        None => None,
    };
    Json(ChatResponse {
        text: text.unwrap_or_else(|| SAMPLE_RESEARCH_TEXT.to_string()),
    })
}

/// POST /api/chat/stream
/// Chunked `text/plain`. A stream that fails mid-way ends early; one that never opens or
/// ends before any text is replaced by the sample text.
pub async fn handle_chat_stream(State(state): State<AppState>, body: Bytes) -> Response {
    let opened = match chat_input(&state, &body) {
        Some(input) => open_chat_stream(&state, &input).await,
        None => None,
    };

    let started = match opened {
        Some(mut chunks) => first_text(&mut chunks)
            .await
            .map(|first| stream::once(future::ready(Ok(first))).chain(chunks).boxed()),
        None => None,
    };

    let body = match started {
        Some(chunks) => Body::from_stream(until_first_error(chunks)),
        None => Body::from(SAMPLE_RESEARCH_TEXT),
    };

    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
}

/// Parses the chat body, or `None` when chat cannot reach the model anyway.
fn chat_input(state: &AppState, body: &[u8]) -> Option<ChatInput> {
    if state.gateway.is_none() {
        warn!("Chat answered with sample data: no API key configured");
        return None;
    }
    match parse_chat_body(body) {
        Ok(input) => Some(input),
        Err(e) => {
            warn!("Chat answered with sample data: {e}");
            None
        }
    }
}

async fn complete_chat(state: &AppState, input: &ChatInput) -> Option<String> {
    let gateway = state.gateway.as_ref()?;
    let system = chat_system_prompt(input);
    match gateway.complete(Some(&system), &input.message).await {
        Ok(text) if !text.trim().is_empty() => Some(text),
        Ok(_) => {
            warn!("Chat answered with sample data: empty completion");
            None
        }
        Err(e) => {
            warn!("Chat answered with sample data: {e}");
            None
        }
    }
}

async fn open_chat_stream(state: &AppState, input: &ChatInput) -> Option<TextStream> {
    let gateway = state.gateway.as_ref()?;
    let system = chat_system_prompt(input);
    match gateway.stream(Some(&system), &input.message).await {
        Ok(stream) => Some(stream),
        Err(e) => {
            warn!("Chat stream answered with sample data: {e}");
            None
        }
    }
}

/// Waits for the first non-empty chunk. `None` when the stream errors or ends first.
async fn first_text(stream: &mut TextStream) -> Option<String> {
    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(text) if !text.is_empty() => return Some(text),
            Ok(_) => continue,
            Err(e) => {
                warn!("Chat stream answered with sample data: {e}");
                return None;
            }
        }
    }
    warn!("Chat stream answered with sample data: no text received");
    None
}

/// Forwards text chunks until the provider stream errors.
fn until_first_error(
    stream: TextStream,
) -> impl futures::Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
    stream
        .map(|chunk| match chunk {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Chat stream ended early: {e}");
                None
            }
        })
        .take_while(|chunk| future::ready(chunk.is_some()))
        .filter_map(future::ready)
        .map(|text| Ok(Bytes::from(text)))
}
