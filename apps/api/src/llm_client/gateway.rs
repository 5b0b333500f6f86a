//! Completion Gateway — primary model first, one fallback model on "model not found".

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, warn};

use crate::llm_client::{CompletionProvider, ProviderError, TextStream};

/// Terminal failure after the model list is exhausted.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The provider rejected the credential.
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Upstream failure: {0}")]
    Upstream(String),
}

impl GatewayError {
    /// Message shown to the end user. The two cases need different operator actions.
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::Auth(_) => "API 키가 유효하지 않거나 만료되었습니다. Google AI Studio에서 새 키를 발급받아 \
                .env를 수정한 뒤 서버를 재시작해주세요."
                .to_string(),
            GatewayError::Upstream(message) => {
                format!("Gemini API 오류: {message}. 네트워크와 API 키를 확인해주세요.")
            }
        }
    }

    fn classify(last_error: Option<ProviderError>) -> Self {
        let message = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Unknown error".to_string());
        if is_auth_failure(&message) {
            GatewayError::Auth(message)
        } else {
            GatewayError::Upstream(message)
        }
    }
}

/// True when the error says the requested model does not exist.
pub fn is_model_not_found(message: &str) -> bool {
    let lower = message.to_lowercase();
    ["404", "not found", "invalid model"]
        .iter()
        .any(|token| lower.contains(token))
}

/// True when the error points at the credential rather than the service.
pub fn is_auth_failure(message: &str) -> bool {
    ["API_KEY", "403", "401", "invalid"]
        .iter()
        .any(|token| message.contains(token))
}

/// Shared entry point for every completion call.
#[derive(Clone)]
pub struct CompletionGateway {
    provider: Arc<dyn CompletionProvider>,
    models: [String; 2],
}

impl CompletionGateway {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        primary_model: impl Into<String>,
        fallback_model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            models: [primary_model.into(), fallback_model.into()],
        }
    }

    /// Returns the first non-empty completion.
    ///
    /// A "model not found" error moves on to the fallback model; any other error stops
    /// immediately. An empty completion also moves on.
    pub async fn complete(&self, system: Option<&str>, message: &str) -> Result<String, GatewayError> {
        let mut last_error: Option<ProviderError> = None;

        for model in &self.models {
            match self.provider.generate(model, system, message).await {
                Ok(text) if !text.is_empty() => return Ok(text),
                Ok(_) => {
                    warn!("Model {model} returned empty text");
                }
                Err(e) => {
                    let fallback = is_model_not_found(&e.to_string());
                    last_error = Some(e);
                    if !fallback {
                        break;
                    }
                    warn!("Model {model} unavailable, trying next model");
                }
            }
        }

        let err = GatewayError::classify(last_error);
        error!("Completion failed: {err}");
        Err(err)
    }

    /// Opens a streamed completion with the same fallback policy as `complete`.
    pub async fn stream(&self, system: Option<&str>, message: &str) -> Result<TextStream, GatewayError> {
        let mut last_error: Option<ProviderError> = None;

        for model in &self.models {
            match self.provider.stream(model, system, message).await {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    let fallback = is_model_not_found(&e.to_string());
                    last_error = Some(e);
                    if !fallback {
                        break;
                    }
                    warn!("Model {model} unavailable for streaming, trying next model");
                }
            }
        }

        Err(GatewayError::classify(last_error))
    }
}
