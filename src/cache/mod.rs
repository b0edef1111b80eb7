//! Cache module for term explanations
//!
//! This module provides the session-scoped explanation cache. It tracks which
//! terms are being fetched, keeps every successful explanation for the rest of
//! the session, and forgets failed attempts so they can be retried.

mod explanations;

pub use explanations::{
    Explanation, ExplanationRecord, FailureKind, FetchFailure, FetchHandle, FetchId,
    FetchOutcome, FetchPolicy, FetchRejected, TermExplanationCache,
};
