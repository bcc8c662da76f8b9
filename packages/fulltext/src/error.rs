//! Typed errors for the collaborator boundaries.
//!
//! Uses `thiserror` for library errors (not `anyhow`). Resolution failures
//! are not errors at all: the resolver reports them as data through
//! [`crate::types::ResolveOutcome`]. The types here cover the external
//! collaborators whose failures the orchestrator downgrades to per-candidate
//! outcomes before they can cross its boundary.

use thiserror::Error;

/// Errors surfaced by content-extraction collaborators.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The fetch exceeded its wall-clock budget
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The collaborator declined the URL (blocked host, robots, etc.)
    #[error("fetch skipped: {reason}")]
    Skipped { reason: String },

    /// Extraction ran but produced no usable document
    #[error("extraction failed: {0}")]
    Failed(String),
}

/// Errors surfaced by scoring collaborators (relevance, LLM verification).
#[derive(Debug, Error)]
pub enum ScoreError {
    /// The scoring service returned an error
    #[error("scoring service error: {0}")]
    Service(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The scoring service could not be reached
    #[error("scoring service unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Errors surfaced by reputation persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend read/write failed
    #[error("storage error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Result type alias for content extraction.
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

/// Result type alias for scoring operations.
pub type ScoreResult<T> = std::result::Result<T, ScoreError>;

/// Result type alias for reputation storage.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
