//! Relevance and verification collaborator seams.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ScoreResult;

/// Collaborator that scores semantic similarity between two texts.
#[async_trait]
pub trait RelevanceScorer: Send + Sync {
    /// Similarity in `[0, 1]` between the story text and candidate content.
    async fn similarity(&self, text_a: &str, text_b: &str) -> ScoreResult<f32>;
}

/// The verifier's judgment of one candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verification {
    /// Whether the content reports the same specific event as the headline
    pub is_same_event: bool,

    /// Relevance on a 0-10 scale
    pub relevance_score: f32,

    /// Free-form quality note, when the verifier offers one
    pub content_quality: Option<String>,
}

impl Verification {
    /// An accepting verdict.
    pub fn same_event(score: f32) -> Self {
        Self {
            is_same_event: true,
            relevance_score: score,
            content_quality: None,
        }
    }

    /// A rejecting verdict.
    pub fn different_event(score: f32) -> Self {
        Self {
            is_same_event: false,
            relevance_score: score,
            content_quality: None,
        }
    }
}

/// Collaborator that classifies same-event-ness of candidate content.
///
/// A failed call means "skip verification and accept the content" — the
/// gate is an upgrade when available, never a hard dependency.
#[async_trait]
pub trait LlmVerifier: Send + Sync {
    async fn verify(
        &self,
        title: &str,
        description: &str,
        content: &str,
    ) -> ScoreResult<Verification>;
}
