//! Explanation providers
//!
//! A provider turns a term into a natural-language explanation. Every provider
//! answers with a stream of text fragments; a provider without streaming
//! support returns a stream holding a single fragment.

pub mod gemini;
pub mod prompt;
#[cfg(any(test, feature = "test-util"))]
pub mod scripted;
pub mod sse;

pub use gemini::GeminiClient;
pub use prompt::{build_prompt, DEFAULT_REGION};
#[cfg(any(test, feature = "test-util"))]
pub use scripted::{ScriptedProvider, ScriptedResponse};

use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use thiserror::Error;

use crate::cache::{FailureKind, FetchFailure};

/// Stream of explanation fragments in emission order
pub type FragmentStream = BoxStream<'static, Result<String, ProviderError>>;

/// Errors that can occur while fetching an explanation
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No API key configured; no request was sent
    #[error("GEMINI_API_KEY is not set. Add it to the environment or a .env file")]
    MissingApiKey,

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The API answered with an error
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// The prompt was blocked by the provider
    #[error("Request blocked by provider: {0}")]
    Blocked(String),

    /// The response stream broke off
    #[error("Response stream interrupted: {0}")]
    Stream(String),

    /// The provider finished without producing any text
    #[error("Provider returned an empty response")]
    EmptyResponse,
}

impl ProviderError {
    /// Classifies the error for display and logging
    pub fn kind(&self) -> FailureKind {
        match self {
            ProviderError::MissingApiKey => FailureKind::Configuration,
            _ => FailureKind::Provider,
        }
    }
}

impl From<ProviderError> for FetchFailure {
    fn from(error: ProviderError) -> Self {
        FetchFailure::new(error.kind(), error.to_string())
    }
}

/// A term to explain and the region whose slang it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplanationRequest {
    /// The term's display string
    pub term: String,
    /// Region qualifier, e.g. "MY"
    pub region: String,
}

impl ExplanationRequest {
    /// Creates a request for `term` in `region`
    pub fn new(term: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            region: region.into(),
        }
    }
}

/// Source of term explanations
#[async_trait]
pub trait ExplanationProvider: Send + Sync {
    /// Starts explaining a term
    ///
    /// Errors detected before any text is produced (missing credentials,
    /// rejected requests) are returned directly; later errors arrive as an
    /// `Err` item on the stream.
    async fn explain(&self, request: &ExplanationRequest) -> Result<FragmentStream, ProviderError>;

    /// Short provider name for logs
    fn name(&self) -> &str;
}

/// Wraps a complete response as a single-fragment stream
pub fn atomic(text: String) -> FragmentStream {
    stream::iter([Ok(text)]).boxed()
}
