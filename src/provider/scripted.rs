//! Scripted provider for tests
//!
//! Answers from a per-term queue of canned responses and records every call,
//! so tests can assert how many requests reached the provider.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use super::{atomic, ExplanationProvider, ExplanationRequest, FragmentStream, ProviderError};

/// One canned provider answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedResponse {
    /// A complete response in one piece
    Atomic(String),
    /// A streamed response
    Fragments(Vec<String>),
    /// Some fragments, then a broken stream
    FailAfter {
        fragments: Vec<String>,
        message: String,
    },
    /// The request itself is rejected
    Error { status: u16, message: String },
    /// No credential configured
    MissingApiKey,
    /// Never produces anything
    Stall,
}

/// Provider that replays scripted responses
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    scripts: Mutex<HashMap<String, VecDeque<ScriptedResponse>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    /// Creates a provider that answers every term with [`sample_explanation`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response for the next call about `term`
    pub fn with_response(self, term: &str, response: ScriptedResponse) -> Self {
        self.push_response(term, response);
        self
    }

    /// Queues a response for the next call about `term`
    pub fn push_response(&self, term: &str, response: ScriptedResponse) {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(term.to_string())
            .or_default()
            .push_back(response);
    }

    /// Returns every requested term in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns how many calls were made for `term`
    pub fn calls_for(&self, term: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|t| t.as_str() == term)
            .count()
    }

    fn next_response(&self, term: &str) -> ScriptedResponse {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(term)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| ScriptedResponse::Atomic(sample_explanation(term)))
    }
}

#[async_trait]
impl ExplanationProvider for ScriptedProvider {
    async fn explain(&self, request: &ExplanationRequest) -> Result<FragmentStream, ProviderError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.term.clone());

        match self.next_response(&request.term) {
            ScriptedResponse::Atomic(text) => Ok(atomic(text)),
            ScriptedResponse::Fragments(fragments) => {
                Ok(stream::iter(fragments.into_iter().map(Ok)).boxed())
            }
            ScriptedResponse::FailAfter { fragments, message } => {
                let items = fragments
                    .into_iter()
                    .map(Ok)
                    .chain(std::iter::once(Err(ProviderError::Stream(message))));
                Ok(stream::iter(items).boxed())
            }
            ScriptedResponse::Error { status, message } => {
                Err(ProviderError::Api { status, message })
            }
            ScriptedResponse::MissingApiKey => Err(ProviderError::MissingApiKey),
            ScriptedResponse::Stall => Ok(stream::pending().boxed()),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Builds an explanation in the fixed Meaning / Usage / Examples layout
pub fn sample_explanation(term: &str) -> String {
    format!(
        "### Meaning\n\
         '{term}' is a common Malaysian expression.\n\n\
         ### Typical Usage Context\n\
         Used in casual conversation among friends.\n\n\
         ### Example Sentences\n\
         1. First example with {term}.\n\
         2. Second example with {term}.\n\
         3. Third example with {term}."
    )
}
