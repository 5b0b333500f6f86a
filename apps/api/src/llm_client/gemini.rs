//! Gemini `generateContent` / `streamGenerateContent` over REST.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::llm_client::sse::SseDecoder;
use crate::llm_client::{CompletionProvider, ProviderError, TextStream};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    pub prompt_token_count: Option<u32>,
    pub candidates_token_count: Option<u32>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate's parts.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    details: Vec<GeminiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    reason: Option<String>,
}

/// Error text of a failed call. Gemini reports a bad key as `400 INVALID_ARGUMENT` with the
/// `API_KEY_INVALID` reason only in `details`, so status and reasons are kept in the message.
fn api_error_message(body: &str) -> String {
    let Ok(GeminiError { error }) = serde_json::from_str::<GeminiError>(body) else {
        return body.to_string();
    };
    let tags: Vec<&str> = error
        .status
        .as_deref()
        .into_iter()
        .chain(error.details.iter().filter_map(|d| d.reason.as_deref()))
        .collect();
    if tags.is_empty() {
        error.message
    } else {
        format!("{} [{}]", error.message, tags.join(": "))
    }
}

/// Gemini REST client. The API key travels in the `x-goog-api-key` header.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post(
        &self,
        model: &str,
        method: &str,
        system: Option<&str>,
        message: &str,
    ) -> Result<Response, ProviderError> {
        let body = GenerateRequest {
            system_instruction: system.map(|text| Content {
                role: None,
                parts: vec![Part { text }],
            }),
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: message }],
            }],
        };

        let mut url = format!("{}/models/{model}:{method}", self.base_url);
        if method == "streamGenerateContent" {
            url.push_str("?alt=sse");
        }

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = api_error_message(&body);
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl CompletionProvider for GeminiClient {
    async fn generate(
        &self,
        model: &str,
        system: Option<&str>,
        message: &str,
    ) -> Result<String, ProviderError> {
        let response: GenerateResponse = self
            .post(model, "generateContent", system, message)
            .await?
            .json()
            .await?;

        if let Some(usage) = &response.usage_metadata {
            debug!(
                "Gemini call succeeded: model={model}, prompt_tokens={:?}, output_tokens={:?}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }
        Ok(response.text())
    }

    async fn stream(
        &self,
        model: &str,
        system: Option<&str>,
        message: &str,
    ) -> Result<TextStream, ProviderError> {
        let response = self
            .post(model, "streamGenerateContent", system, message)
            .await?;
        Ok(decode_sse_text(response.bytes_stream().boxed()))
    }
}

struct DecodeState<S> {
    bytes: S,
    decoder: SseDecoder,
    pending: VecDeque<Result<String, ProviderError>>,
    done: bool,
}

/// Turns an SSE byte stream of `GenerateResponse` events into text chunks.
fn decode_sse_text<S>(bytes: S) -> TextStream
where
    S: futures::Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + Unpin + 'static,
{
    let state = DecodeState {
        bytes,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.done {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    for data in state.decoder.feed(&chunk) {
                        push_event(&mut state.pending, &data);
                    }
                }
                Some(Err(e)) => {
                    state.done = true;
                    state.pending.push_back(Err(ProviderError::Http(e)));
                }
                None => {
                    state.done = true;
                    if let Some(data) = state.decoder.finish() {
                        push_event(&mut state.pending, &data);
                    }
                }
            }
        }
    })
    .boxed()
}

fn push_event(pending: &mut VecDeque<Result<String, ProviderError>>, data: &str) {
    match serde_json::from_str::<GenerateResponse>(data) {
        Ok(event) => {
            let text = event.text();
            if !text.is_empty() {
                pending.push_back(Ok(text));
            }
        }
        Err(e) => pending.push_back(Err(ProviderError::Parse(e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_to_gemini_shape() {
        let body = GenerateRequest {
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part { text: "sys" }],
            }),
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: "hi" }],
            }],
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "sys");
        assert!(value["systemInstruction"].get("role").is_none());
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hi");
    }

    #[test]
    fn test_request_without_system_omits_field() {
        let body = GenerateRequest {
            system_instruction: None,
            contents: vec![],
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("systemInstruction").is_none());
    }

    #[test]
    fn test_response_text_joins_parts() {
        let json = r#"{
            "candidates": [{"content": {"parts": [{"text": "시장 "}, {"text": "현황"}], "role": "model"}}],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 4}
        }"#;
        let response: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), "시장 현황");
        assert_eq!(response.usage_metadata.unwrap().prompt_token_count, Some(10));
    }

    const BAD_KEY_BODY: &str = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT","details":[{"@type":"type.googleapis.com/google.rpc.ErrorInfo","reason":"API_KEY_INVALID","domain":"googleapis.com"}]}}"#;

    #[test]
    fn test_api_error_message_keeps_status_and_reason() {
        assert_eq!(
            api_error_message(BAD_KEY_BODY),
            "API key not valid. Please pass a valid API key. [INVALID_ARGUMENT: API_KEY_INVALID]"
        );
        assert_eq!(
            api_error_message(r#"{"error":{"code":404,"message":"models/x is not found"}}"#),
            "models/x is not found"
        );
        assert_eq!(api_error_message("<html>bad gateway</html>"), "<html>bad gateway</html>");
    }

    #[tokio::test]
    async fn test_bad_key_response_is_classified_as_auth() {
        use std::sync::Arc;

        use crate::llm_client::testing::ScriptedProvider;
        use crate::llm_client::{CompletionGateway, GatewayError};

        let provider = Arc::new(ScriptedProvider::new(vec![Err(ProviderError::Api {
            status: 400,
            message: api_error_message(BAD_KEY_BODY),
        })]));
        let err = CompletionGateway::new(provider.clone(), "primary", "fallback")
            .complete(None, "q")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Auth(_)), "got {err:?}");
        assert_eq!(provider.calls(), ["primary"]);
    }

    #[test]
    fn test_response_without_candidates_is_empty() {
        let response: GenerateResponse = serde_json::from_str(r#"{"promptFeedback": {}}"#).unwrap();
        assert_eq!(response.text(), "");
    }

    #[tokio::test]
    async fn test_decode_sse_text_yields_chunks_in_order() {
        let raw = concat!(
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hello \"}]}}]}\r\n\r\n",
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"world\"}]}}]}\r\n\r\n",
        )
        .as_bytes();
        let (a, b) = raw.split_at(30);
        let chunks: Vec<Result<bytes::Bytes, reqwest::Error>> = vec![
            Ok(bytes::Bytes::copy_from_slice(a)),
            Ok(bytes::Bytes::copy_from_slice(b)),
        ];

        let texts: Vec<String> = decode_sse_text(stream::iter(chunks))
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(texts, ["Hello ", "world"]);
    }

    #[tokio::test]
    async fn test_decode_sse_text_reports_bad_event() {
        let chunks: Vec<Result<bytes::Bytes, reqwest::Error>> =
            vec![Ok(bytes::Bytes::from_static(b"data: not json\n\n"))];
        let items: Vec<Result<String, ProviderError>> =
            decode_sse_text(stream::iter(chunks)).collect().await;
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(ProviderError::Parse(_))));
    }
}
