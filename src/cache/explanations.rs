//! Session cache of term explanations with single-flight fetch claims
//!
//! Every term moves through `Absent -> Pending -> Ready` on success, or
//! `Absent -> Pending -> Absent` on failure. A `Ready` entry is never replaced
//! for the lifetime of the cache.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Identifier of one fetch claim, unique within a cache
pub type FetchId = u64;

/// A successfully fetched explanation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    /// The assembled markdown text
    pub text: String,
    /// When the fetch completed
    pub fetched_at: DateTime<Utc>,
}

impl Explanation {
    /// Creates an explanation stamped with the current time
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fetched_at: Utc::now(),
        }
    }
}

/// Classification of a failed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FailureKind {
    /// Credential or configuration missing
    #[error("configuration error")]
    Configuration,
    /// Transport, API or response error
    #[error("provider error")]
    Provider,
    /// The provider did not finish in time
    #[error("timeout")]
    Timeout,
}

/// Why a fetch attempt failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct FetchFailure {
    /// Failure classification
    pub kind: FailureKind,
    /// Human-readable message shown to the user
    pub message: String,
}

impl FetchFailure {
    /// Creates a failure of the given kind
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Result of a provider call, handed to [`TermExplanationCache::resolve`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The full explanation text
    Success(String),
    /// The fetch failed
    Failure(FetchFailure),
}

/// The state of a term as seen by the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExplanationRecord {
    /// No entry yet
    Absent,
    /// A fetch is in flight; `streamed` holds the fragments received so far
    Pending { streamed: String },
    /// Terminal successful value
    Ready(Explanation),
    /// Returned by `resolve` for a failed attempt; never stored
    Failed(FetchFailure),
}

impl ExplanationRecord {
    /// Returns true for `Ready`
    pub fn is_ready(&self) -> bool {
        matches!(self, ExplanationRecord::Ready(_))
    }

    /// Returns true for `Pending`
    pub fn is_pending(&self) -> bool {
        matches!(self, ExplanationRecord::Pending { .. })
    }
}

/// How many fetches may be in flight at once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPolicy {
    /// At most one fetch across all terms
    #[default]
    SessionExclusive,
    /// At most one fetch per term
    PerTerm,
}

/// Claim on a pending fetch, returned by `begin_fetch`
///
/// Consumed by `resolve`, so each successful claim is resolved at most once.
#[derive(Debug, PartialEq, Eq)]
pub struct FetchHandle {
    term: String,
    id: FetchId,
}

impl FetchHandle {
    /// The term being fetched
    pub fn term(&self) -> &str {
        &self.term
    }

    /// The unique fetch identifier
    pub fn id(&self) -> FetchId {
        self.id
    }
}

/// Reasons `begin_fetch` refuses to start a fetch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchRejected {
    /// A fetch for this term is already running
    #[error("A fetch for this term is already running")]
    AlreadyInFlight,
    /// The term already has an explanation
    #[error("The term already has an explanation")]
    AlreadyCached,
    /// Another term holds the session-wide fetch slot
    #[error("Still fetching '{pending}'")]
    SessionBusy { pending: String },
}

#[derive(Debug)]
enum Slot {
    Pending { id: FetchId, streamed: String },
    Ready(Explanation),
}

/// In-memory explanation cache scoped to one session
#[derive(Debug, Default)]
pub struct TermExplanationCache {
    entries: HashMap<String, Slot>,
    policy: FetchPolicy,
    next_id: FetchId,
}

impl TermExplanationCache {
    /// Creates an empty cache with the session-exclusive policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty cache with the given fetch policy
    pub fn with_policy(policy: FetchPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Returns the fetch policy
    pub fn policy(&self) -> FetchPolicy {
        self.policy
    }

    /// Returns the current record for `term` without side effects
    ///
    /// Never returns `Failed`: a failed term is `Absent`.
    pub fn lookup(&self, term: &str) -> ExplanationRecord {
        match self.entries.get(term) {
            None => ExplanationRecord::Absent,
            Some(Slot::Pending { streamed, .. }) => ExplanationRecord::Pending {
                streamed: streamed.clone(),
            },
            Some(Slot::Ready(explanation)) => ExplanationRecord::Ready(explanation.clone()),
        }
    }

    /// Claims the fetch slot for `term`, marking it `Pending`
    ///
    /// # Returns
    /// * `Ok(FetchHandle)` if the caller must now run the fetch
    /// * `Err(FetchRejected)` if no fetch may start; the cache is unchanged
    pub fn begin_fetch(&mut self, term: &str) -> Result<FetchHandle, FetchRejected> {
        match self.entries.get(term) {
            Some(Slot::Pending { .. }) => return Err(FetchRejected::AlreadyInFlight),
            Some(Slot::Ready(_)) => return Err(FetchRejected::AlreadyCached),
            None => {}
        }

        if self.policy == FetchPolicy::SessionExclusive {
            if let Some(pending) = self.pending_term() {
                return Err(FetchRejected::SessionBusy {
                    pending: pending.to_string(),
                });
            }
        }

        self.next_id += 1;
        let id = self.next_id;
        self.entries.insert(
            term.to_string(),
            Slot::Pending {
                id,
                streamed: String::new(),
            },
        );

        Ok(FetchHandle {
            term: term.to_string(),
            id,
        })
    }

    /// Appends a streamed fragment to the pending record
    ///
    /// Returns false if the handle no longer owns the pending entry.
    pub fn append_chunk(&mut self, handle: &FetchHandle, fragment: &str) -> bool {
        match self.entries.get_mut(&handle.term) {
            Some(Slot::Pending { id, streamed }) if *id == handle.id => {
                streamed.push_str(fragment);
                true
            }
            _ => false,
        }
    }

    /// Completes the fetch claimed by `handle`
    ///
    /// `Success` stores the text as `Ready`; `Failure` removes the entry so the
    /// next selection retries. A stale handle leaves the cache unchanged.
    ///
    /// # Returns
    /// The record to present: `Ready`, `Failed`, or the current record when
    /// the handle was stale.
    pub fn resolve(&mut self, handle: FetchHandle, outcome: FetchOutcome) -> ExplanationRecord {
        let owns_entry = matches!(
            self.entries.get(&handle.term),
            Some(Slot::Pending { id, .. }) if *id == handle.id
        );
        if !owns_entry {
            return self.lookup(&handle.term);
        }

        match outcome {
            FetchOutcome::Success(text) => {
                let explanation = Explanation::new(text);
                self.entries
                    .insert(handle.term, Slot::Ready(explanation.clone()));
                ExplanationRecord::Ready(explanation)
            }
            FetchOutcome::Failure(failure) => {
                self.entries.remove(&handle.term);
                ExplanationRecord::Failed(failure)
            }
        }
    }

    /// Returns the term currently being fetched, if any
    ///
    /// Under `PerTerm` several terms may be pending; the one with the lowest
    /// fetch id is returned.
    pub fn pending_term(&self) -> Option<&str> {
        self.entries
            .iter()
            .filter_map(|(term, slot)| match slot {
                Slot::Pending { id, .. } => Some((*id, term.as_str())),
                Slot::Ready(_) => None,
            })
            .min_by_key(|(id, _)| *id)
            .map(|(_, term)| term)
    }

    /// Returns the number of pending fetches
    pub fn pending_count(&self) -> usize {
        self.entries
            .values()
            .filter(|slot| matches!(slot, Slot::Pending { .. }))
            .count()
    }

    /// Returns the number of entries, pending or ready
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been fetched or claimed
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
