/// LLM Client — the single point of entry for all text-completion calls.
///
/// ARCHITECTURAL RULE: handlers never talk to the provider directly.
/// They go through `CompletionGateway`, which owns the primary/fallback model policy.
///
/// `CompletionProvider` is the seam: `GeminiClient` in production, scripted fakes in tests.
use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

pub mod gateway;
pub mod gemini;
pub mod sse;

pub use gateway::{CompletionGateway, GatewayError};
pub use gemini::GeminiClient;

/// Default primary model.
pub const PRIMARY_MODEL: &str = "gemini-2.0-flash";
/// Model tried once when the primary is not found.
pub const FALLBACK_MODEL: &str = "gemini-1.5-flash";

/// Incremental text chunks of a streamed completion.
pub type TextStream = BoxStream<'static, Result<String, ProviderError>>;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Stream error: {0}")]
    Stream(String),
}

/// An opaque text-completion service.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generates the full completion text for one user message.
    async fn generate(
        &self,
        model: &str,
        system: Option<&str>,
        message: &str,
    ) -> Result<String, ProviderError>;

    /// Opens a streamed completion. Errors before the first byte surface here;
    /// errors mid-stream surface as stream items.
    async fn stream(
        &self,
        model: &str,
        system: Option<&str>,
        message: &str,
    ) -> Result<TextStream, ProviderError>;
}

#[cfg(test)]
pub mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use futures::stream;

    use super::{CompletionProvider, ProviderError, TextStream};

    /// Replays scripted results in order and records which models were asked.
    ///
    /// `stream` splits a scripted text at spaces. A stream scripted with `with_stream`
    /// replays its exact chunks instead, errors included.
    pub struct ScriptedProvider {
        script: Mutex<VecDeque<Result<String, ProviderError>>>,
        streams: Mutex<VecDeque<Vec<Result<String, ProviderError>>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        pub fn new(script: Vec<Result<String, ProviderError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                streams: Mutex::new(VecDeque::new()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn with_stream(self, chunks: Vec<Result<String, ProviderError>>) -> Self {
            self.streams.lock().unwrap().push_back(chunks);
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn next(&self, model: &str) -> Result<String, ProviderError> {
            self.calls.lock().unwrap().push(model.to_string());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::Stream("script exhausted".to_string())))
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn generate(
            &self,
            model: &str,
            _system: Option<&str>,
            _message: &str,
        ) -> Result<String, ProviderError> {
            self.next(model)
        }

        async fn stream(
            &self,
            model: &str,
            _system: Option<&str>,
            _message: &str,
        ) -> Result<TextStream, ProviderError> {
            if let Some(chunks) = self.streams.lock().unwrap().pop_front() {
                self.calls.lock().unwrap().push(model.to_string());
                return Ok(Box::pin(stream::iter(chunks)));
            }
            let text = self.next(model)?;
            let chunks: Vec<Result<String, ProviderError>> = text
                .split_inclusive(' ')
                .map(|chunk| Ok(chunk.to_string()))
                .collect();
            Ok(Box::pin(stream::iter(chunks)))
        }
    }
}
