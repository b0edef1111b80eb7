//! Background explanation fetching
//!
//! Turns term selections into provider calls. Each fetch runs on its own tokio
//! task and reports back over a channel; the UI thread applies the messages to
//! the cache between frames, so the cache is only ever touched from one place.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::{FutureExt, StreamExt};
use tokio::sync::mpsc;

use crate::cache::{
    Explanation, ExplanationRecord, FailureKind, FetchFailure, FetchHandle, FetchId, FetchOutcome,
    FetchRejected, TermExplanationCache,
};
use crate::provider::{ExplanationProvider, ExplanationRequest, ProviderError, DEFAULT_REGION};

/// Messages sent from fetch tasks to the main loop
///
/// For one fetch, every `Chunk` is sent before its `Finished`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchMessage {
    /// A streamed fragment arrived
    Chunk {
        id: FetchId,
        term: String,
        fragment: String,
    },
    /// The fetch completed, successfully or not
    Finished {
        id: FetchId,
        term: String,
        outcome: FetchOutcome,
    },
}

/// State changes reported to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// More streamed text is available for a pending term
    Progress { term: String },
    /// The term's explanation is ready
    Ready { term: String },
    /// The fetch failed; the term can be selected again to retry
    Failed { term: String, failure: FetchFailure },
}

/// What happened when a term was selected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The explanation is cached; no request was made
    Cached(Explanation),
    /// A fetch for this term is already running
    Waiting,
    /// Another term holds the session-wide fetch slot
    Busy { pending: String },
    /// A new fetch was started
    Started(FetchId),
}

/// Configuration for explanation fetches
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Region qualifier passed to the provider
    pub region: String,
    /// Upper bound on a whole fetch, including streaming
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Coordinates provider calls for a [`TermExplanationCache`]
///
/// Holds the handle of every fetch it started until the matching `Finished`
/// message is applied.
pub struct FetchCoordinator {
    provider: Arc<dyn ExplanationProvider>,
    config: FetchConfig,
    in_flight: HashMap<FetchId, FetchHandle>,
    sender: mpsc::Sender<FetchMessage>,
    receiver: mpsc::Receiver<FetchMessage>,
}

impl FetchCoordinator {
    /// Creates a coordinator for the given provider
    pub fn new(provider: Arc<dyn ExplanationProvider>, config: FetchConfig) -> Self {
        let (sender, receiver) = mpsc::channel(32);
        Self {
            provider,
            config,
            in_flight: HashMap::new(),
            sender,
            receiver,
        }
    }

    /// Returns the fetch configuration
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Returns the number of fetches not yet applied as finished
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Handles a term selection
    ///
    /// Starts a fetch only when the term has no record and the cache grants
    /// the claim. Must be called within a tokio runtime.
    pub fn select(&mut self, cache: &mut TermExplanationCache, term: &str) -> Selection {
        match cache.lookup(term) {
            ExplanationRecord::Ready(explanation) => return Selection::Cached(explanation),
            ExplanationRecord::Pending { .. } => return Selection::Waiting,
            ExplanationRecord::Absent | ExplanationRecord::Failed(_) => {}
        }

        match cache.begin_fetch(term) {
            Ok(handle) => {
                let id = handle.id();
                tracing::info!(term, fetch_id = id, provider = self.provider.name(), "Fetch started");
                self.spawn_fetch(term, id);
                self.in_flight.insert(id, handle);
                Selection::Started(id)
            }
            Err(FetchRejected::AlreadyInFlight) => {
                tracing::debug!(term, "Fetch already in flight");
                Selection::Waiting
            }
            Err(FetchRejected::AlreadyCached) => match cache.lookup(term) {
                ExplanationRecord::Ready(explanation) => Selection::Cached(explanation),
                _ => Selection::Waiting,
            },
            Err(FetchRejected::SessionBusy { pending }) => {
                tracing::debug!(term, pending = %pending, "Selection refused while another fetch runs");
                Selection::Busy { pending }
            }
        }
    }

    fn spawn_fetch(&self, term: &str, id: FetchId) {
        let provider = Arc::clone(&self.provider);
        let request = ExplanationRequest::new(term, self.config.region.as_str());
        let timeout = self.config.timeout;
        let sender = self.sender.clone();

        tokio::spawn(async move {
            let fetch = stream_explanation(provider.as_ref(), &request, id, &sender);
            let guarded = AssertUnwindSafe(tokio::time::timeout(timeout, fetch)).catch_unwind();
            let outcome = match guarded.await {
                Ok(Ok(Ok(text))) => FetchOutcome::Success(text),
                Ok(Ok(Err(error))) => FetchOutcome::Failure(error.into()),
                Ok(Err(_)) => FetchOutcome::Failure(FetchFailure::new(
                    FailureKind::Timeout,
                    format!("No response within {} seconds", timeout.as_secs_f32()),
                )),
                Err(panic) => {
                    let reason = panic_reason(panic.as_ref());
                    tracing::error!(
                        term = %request.term,
                        fetch_id = id,
                        "Provider panicked: {}",
                        reason
                    );
                    FetchOutcome::Failure(FetchFailure::new(
                        FailureKind::Provider,
                        format!("Provider crashed: {}", reason),
                    ))
                }
            };

            let _ = sender
                .send(FetchMessage::Finished {
                    id,
                    term: request.term,
                    outcome,
                })
                .await;
        });
    }

    /// Checks for a pending fetch message without blocking
    pub fn try_recv(&mut self) -> Option<FetchMessage> {
        self.receiver.try_recv().ok()
    }

    /// Waits for the next fetch message
    pub async fn next_message(&mut self) -> Option<FetchMessage> {
        self.receiver.recv().await
    }

    /// Applies one fetch message to the cache
    ///
    /// # Returns
    /// * `Some(CacheEvent)` describing the visible state change
    /// * `None` if the message belongs to no known fetch
    pub fn apply(
        &mut self,
        cache: &mut TermExplanationCache,
        message: FetchMessage,
    ) -> Option<CacheEvent> {
        match message {
            FetchMessage::Chunk { id, term, fragment } => {
                let Some(handle) = self.in_flight.get(&id) else {
                    tracing::debug!(term = %term, fetch_id = id, "Dropping chunk for unknown fetch");
                    return None;
                };
                cache
                    .append_chunk(handle, &fragment)
                    .then_some(CacheEvent::Progress { term })
            }
            FetchMessage::Finished { id, term, outcome } => {
                let handle = self.in_flight.remove(&id)?;
                match cache.resolve(handle, outcome) {
                    ExplanationRecord::Ready(explanation) => {
                        tracing::info!(
                            term = %term,
                            fetch_id = id,
                            chars = explanation.text.chars().count(),
                            "Fetch completed"
                        );
                        Some(CacheEvent::Ready { term })
                    }
                    ExplanationRecord::Failed(failure) => {
                        tracing::warn!(
                            term = %term,
                            fetch_id = id,
                            kind = %failure.kind,
                            "Fetch failed: {}",
                            failure.message
                        );
                        Some(CacheEvent::Failed { term, failure })
                    }
                    _ => None,
                }
            }
        }
    }

    /// Receives and applies messages until every started fetch has finished
    pub async fn settle(&mut self, cache: &mut TermExplanationCache) -> Vec<CacheEvent> {
        let mut events = Vec::new();
        while !self.in_flight.is_empty() {
            let Some(message) = self.next_message().await else {
                break;
            };
            if let Some(event) = self.apply(cache, message) {
                events.push(event);
            }
        }
        events
    }
}

/// Extracts the message of a caught panic payload
fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Runs one provider call, forwarding fragments as they arrive
///
/// # Returns
/// The concatenation of all fragments, or the first error. A response with no
/// visible text is an error.
async fn stream_explanation(
    provider: &dyn ExplanationProvider,
    request: &ExplanationRequest,
    id: FetchId,
    sender: &mpsc::Sender<FetchMessage>,
) -> Result<String, ProviderError> {
    let mut fragments = provider.explain(request).await?;
    let mut text = String::new();

    while let Some(fragment) = fragments.next().await {
        let fragment = fragment?;
        if fragment.is_empty() {
            continue;
        }
        text.push_str(&fragment);
        let _ = sender
            .send(FetchMessage::Chunk {
                id,
                term: request.term.clone(),
                fragment,
            })
            .await;
    }

    if text.trim().is_empty() {
        return Err(ProviderError::EmptyResponse);
    }
    Ok(text)
}
