//! Google Gemini API client
//!
//! Calls the `generateContent` endpoint for atomic responses and the
//! `streamGenerateContent` endpoint (server-sent events) for streamed ones.

use std::collections::VecDeque;
use std::fmt;

use async_trait::async_trait;
use futures::{stream, Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::prompt::build_prompt;
use super::sse::SseDecoder;
use super::{ExplanationProvider, ExplanationRequest, FragmentStream, ProviderError};

/// Base URL for the Gemini REST API
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: Option<u16>,
    #[serde(default)]
    message: String,
    status: Option<String>,
}

/// Client for the Gemini generative language API
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    streaming: bool,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("streaming", &self.streaming)
            .finish()
    }
}

impl GeminiClient {
    /// Create a new streaming client for the default model
    ///
    /// A missing key is not an error here; every fetch reports it instead.
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_client(Client::new(), api_key)
    }

    /// Create a new GeminiClient with a custom HTTP client
    pub fn with_client(client: Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: GEMINI_BASE_URL.to_string(),
            streaming: true,
        }
    }

    /// Use a different model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Use a different API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Choose between streamed and atomic responses
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    /// Returns true if responses are streamed
    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Returns the configured model name
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        if self.streaming {
            format!(
                "{}/models/{}:streamGenerateContent?alt=sse",
                self.base_url, self.model
            )
        } else {
            format!("{}/models/{}:generateContent", self.base_url, self.model)
        }
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ProviderError::MissingApiKey)
    }

    async fn send(&self, api_key: &str, prompt: &str) -> Result<reqwest::Response, ProviderError> {
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &text));
        }
        Ok(response)
    }
}

#[async_trait]
impl ExplanationProvider for GeminiClient {
    async fn explain(&self, request: &ExplanationRequest) -> Result<FragmentStream, ProviderError> {
        let api_key = self.api_key()?;
        let prompt = build_prompt(request);

        tracing::debug!(
            term = %request.term,
            model = %self.model,
            streaming = self.streaming,
            "Sending Gemini request"
        );
        let response = self.send(api_key, &prompt).await?;

        if self.streaming {
            return Ok(sse_fragments(Box::pin(response.bytes_stream())));
        }

        let text = response.text().await?;
        let fragment = parse_chunk(&text)?.ok_or(ProviderError::EmptyResponse)?;
        Ok(super::atomic(fragment))
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Extracts the text of one `GenerateContentResponse` JSON object
///
/// # Returns
/// * `Ok(Some(text))` with all candidate text parts concatenated
/// * `Ok(None)` if the object carries no text (e.g. a final usage chunk)
/// * `Err(ProviderError)` for API errors, blocked prompts or invalid JSON
fn parse_chunk(json: &str) -> Result<Option<String>, ProviderError> {
    let response: GenerateContentResponse = serde_json::from_str(json)?;

    if let Some(error) = response.error {
        return Err(ProviderError::Api {
            status: error.code.unwrap_or(0),
            message: describe_api_error(&error),
        });
    }
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ProviderError::Blocked(reason));
    }

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    Ok((!text.is_empty()).then_some(text))
}

/// Builds an API error from a non-success status and response body
fn api_error(status: u16, body: &str) -> ProviderError {
    let message = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => describe_api_error(&envelope.error),
        Err(_) if body.trim().is_empty() => "no response body".to_string(),
        Err(_) => body.trim().to_string(),
    };
    ProviderError::Api { status, message }
}

fn describe_api_error(error: &ApiErrorBody) -> String {
    match &error.status {
        Some(status) if !error.message.is_empty() => format!("{} ({})", error.message, status),
        Some(status) => status.clone(),
        None => error.message.clone(),
    }
}

struct SseState<S> {
    body: S,
    decoder: SseDecoder,
    ready: VecDeque<Result<String, ProviderError>>,
    finished: bool,
}

impl<S> SseState<S> {
    fn push_event(&mut self, data: &str) {
        if self.finished || data.trim() == "[DONE]" {
            return;
        }
        match parse_chunk(data) {
            Ok(Some(text)) => self.ready.push_back(Ok(text)),
            Ok(None) => {}
            Err(e) => {
                self.ready.push_back(Err(e));
                self.finished = true;
            }
        }
    }
}

/// Turns a server-sent-event body into a stream of text fragments
///
/// Fragments are yielded in the order the server sent them. The stream ends
/// after the first error.
fn sse_fragments<S, B, E>(body: S) -> FragmentStream
where
    S: Stream<Item = Result<B, E>> + Unpin + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<ProviderError> + Send + 'static,
{
    let state = SseState {
        body,
        decoder: SseDecoder::new(),
        ready: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.ready.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }
            match state.body.next().await {
                Some(Ok(bytes)) => {
                    for data in state.decoder.feed(bytes.as_ref()) {
                        state.push_event(&data);
                    }
                }
                Some(Err(e)) => {
                    state.ready.push_back(Err(e.into()));
                    state.finished = true;
                }
                None => {
                    if let Some(data) = state.decoder.finish() {
                        state.push_event(&data);
                    }
                    state.finished = true;
                }
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    fn chunk_json(text: &str) -> String {
        serde_json::json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
        })
        .to_string()
    }

    #[test]
    fn test_parse_chunk_concatenates_parts() {
        let json = serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "### Meaning\n" }, { "text": "A particle." }] }
            }]
        })
        .to_string();
        assert_eq!(
            parse_chunk(&json).unwrap(),
            Some("### Meaning\nA particle.".to_string())
        );
    }

    #[test]
    fn test_parse_chunk_without_text_is_none() {
        let json = r#"{"candidates":[{"finishReason":"STOP"}],"usageMetadata":{"totalTokenCount":12}}"#;
        assert_eq!(parse_chunk(json).unwrap(), None);
        assert_eq!(parse_chunk("{}").unwrap(), None);
    }

    #[test]
    fn test_parse_chunk_blocked_prompt() {
        let json = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        assert!(matches!(
            parse_chunk(json),
            Err(ProviderError::Blocked(reason)) if reason == "SAFETY"
        ));
    }

    #[test]
    fn test_parse_chunk_inline_error() {
        let json = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        match parse_chunk(json) {
            Err(ProviderError::Api { status, message }) => {
                assert_eq!(status, 429);
                assert_eq!(message, "Quota exceeded (RESOURCE_EXHAUSTED)");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_chunk_malformed_json() {
        assert!(matches!(
            parse_chunk("not json"),
            Err(ProviderError::ParseError(_))
        ));
    }

    #[test]
    fn test_api_error_reads_google_envelope() {
        let body = r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#;
        match api_error(400, body) {
            ProviderError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid. (INVALID_ARGUMENT)");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_api_error_falls_back_to_body_text() {
        match api_error(502, "  Bad Gateway \n") {
            ProviderError::Api { message, .. } => assert_eq!(message, "Bad Gateway"),
            other => panic!("Expected Api error, got {:?}", other),
        }
        match api_error(500, "") {
            ProviderError::Api { message, .. } => assert_eq!(message, "no response body"),
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_endpoint_depends_on_streaming() {
        let client = GeminiClient::new(Some("key".to_string()))
            .with_base_url("http://localhost:9999/v1beta/");
        assert_eq!(
            client.endpoint(),
            "http://localhost:9999/v1beta/models/gemini-2.0-flash:streamGenerateContent?alt=sse"
        );

        let client = client.with_streaming(false).with_model("gemini-1.5-pro");
        assert_eq!(
            client.endpoint(),
            "http://localhost:9999/v1beta/models/gemini-1.5-pro:generateContent"
        );
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let client = GeminiClient::new(Some("super-secret".to_string()));
        let debug = format!("{:?}", client);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[tokio::test]
    async fn test_missing_api_key_short_circuits() {
        // Unroutable base URL: reaching the network would fail differently.
        let client = GeminiClient::new(None).with_base_url("http://127.0.0.1:9");
        let request = ExplanationRequest::new("Lah", "MY");

        match client.explain(&request).await {
            Err(ProviderError::MissingApiKey) => {}
            Err(other) => panic!("Expected MissingApiKey, got {:?}", other),
            Ok(_) => panic!("Expected MissingApiKey, got a stream"),
        }
    }

    #[tokio::test]
    async fn test_blank_api_key_counts_as_missing() {
        let client = GeminiClient::new(Some("   ".to_string()));
        let request = ExplanationRequest::new("Lah", "MY");
        assert!(matches!(
            client.explain(&request).await,
            Err(ProviderError::MissingApiKey)
        ));
    }

    #[tokio::test]
    async fn test_sse_fragments_in_emission_order() {
        let body = format!(
            "data: {}\r\n\r\ndata: {}\r\n\r\ndata: {}\r\n\r\n",
            chunk_json("### Meaning\n"),
            chunk_json("A softening particle."),
            r#"{"candidates":[{"finishReason":"STOP"}]}"#,
        )
        .into_bytes();

        // Split the body into awkward pieces to exercise buffering.
        let pieces: Vec<Result<Vec<u8>, ProviderError>> =
            body.chunks(7).map(|c| Ok(c.to_vec())).collect();

        let fragments: Vec<String> = sse_fragments(stream::iter(pieces))
            .try_collect()
            .await
            .expect("Stream should succeed");

        assert_eq!(fragments, vec!["### Meaning\n", "A softening particle."]);
    }

    #[tokio::test]
    async fn test_sse_fragments_stop_after_error() {
        let body = format!(
            "data: {}\n\ndata: {}\n\ndata: {}\n\n",
            chunk_json("partial"),
            r#"{"error":{"code":500,"message":"Internal","status":"INTERNAL"}}"#,
            chunk_json("never"),
        );
        let pieces: Vec<Result<Vec<u8>, ProviderError>> = vec![Ok(body.into_bytes())];

        let items: Vec<Result<String, ProviderError>> =
            sse_fragments(stream::iter(pieces)).collect().await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "partial");
        assert!(matches!(items[1], Err(ProviderError::Api { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_sse_events_after_error_are_dropped_across_chunks() {
        let blocked = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let pieces: Vec<Result<Vec<u8>, ProviderError>> = vec![
            Ok(format!("data: {}\n\ndata: {}\n\n", blocked, chunk_json("same chunk")).into_bytes()),
            Ok(format!("data: {}\n\n", chunk_json("next chunk")).into_bytes()),
        ];

        let items: Vec<Result<String, ProviderError>> =
            sse_fragments(stream::iter(pieces)).collect().await;

        assert_eq!(items.len(), 1);
        assert!(matches!(&items[0], Err(ProviderError::Blocked(r)) if r == "SAFETY"));
    }

    #[tokio::test]
    async fn test_sse_transport_error_is_forwarded() {
        let pieces: Vec<Result<Vec<u8>, ProviderError>> = vec![
            Ok(format!("data: {}\n\n", chunk_json("first")).into_bytes()),
            Err(ProviderError::Stream("connection reset".to_string())),
        ];

        let items: Vec<Result<String, ProviderError>> =
            sse_fragments(stream::iter(pieces)).collect().await;

        assert_eq!(items.len(), 2);
        assert!(matches!(&items[1], Err(ProviderError::Stream(m)) if m == "connection reset"));
    }

    #[tokio::test]
    async fn test_sse_unterminated_final_event_is_flushed() {
        let pieces: Vec<Result<Vec<u8>, ProviderError>> =
            vec![Ok(format!("data: {}", chunk_json("tail")).into_bytes())];

        let fragments: Vec<String> = sse_fragments(stream::iter(pieces))
            .try_collect()
            .await
            .unwrap();

        assert_eq!(fragments, vec!["tail"]);
    }
}
