//! Testing utilities including mock collaborators.
//!
//! Useful for exercising the orchestrator without real network, embedding,
//! or LLM calls. Mocks share state through `Arc`, so a clone kept by the
//! test observes calls made through the orchestrator's copy.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{ExtractError, ExtractResult, ScoreError, ScoreResult};
use crate::traits::extractor::{ContentExtractor, ExtractedContent, FetchMode};
use crate::traits::scorer::{LlmVerifier, RelevanceScorer, Verification};
use crate::types::candidate::host_of;

/// A mock content extractor with canned responses per URL.
#[derive(Default, Clone)]
pub struct MockExtractor {
    pages: Arc<RwLock<HashMap<String, ExtractedContent>>>,
    delay: Option<Duration>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockExtractor {
    /// Create a mock with no canned pages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a canned successful page for a URL.
    pub fn with_content(self, url: impl Into<String>, markdown: impl Into<String>) -> Self {
        self.pages
            .write()
            .unwrap()
            .insert(url.into(), ExtractedContent::new(markdown));
        self
    }

    /// Add a canned response for a URL.
    pub fn with_page(self, url: impl Into<String>, content: ExtractedContent) -> Self {
        self.pages.write().unwrap().insert(url.into(), content);
        self
    }

    /// Sleep this long before answering, to exercise fetch timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// URLs fetched through this mock, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl ContentExtractor for MockExtractor {
    async fn fetch(
        &self,
        url: &str,
        _mode: FetchMode,
        blocked_hosts: &HashSet<String>,
    ) -> ExtractResult<ExtractedContent> {
        self.calls.write().unwrap().push(url.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(host) = host_of(url) {
            if blocked_hosts.contains(&host) {
                return Ok(ExtractedContent::skipped("blocked_host"));
            }
        }

        match self.pages.read().unwrap().get(url) {
            Some(content) => Ok(content.clone()),
            None => Err(ExtractError::Failed(format!("no canned page for {url}"))),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A mock relevance scorer.
///
/// Scores are matched by substring against the candidate content, falling
/// back to a fixed default; `hashed()` gives a deterministic pseudo-random
/// score derived from both texts instead.
#[derive(Clone)]
pub struct MockScorer {
    scores: Arc<RwLock<Vec<(String, f32)>>>,
    default_score: f32,
    hashed: bool,
}

impl Default for MockScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockScorer {
    /// Create a scorer that answers 0.9 unless told otherwise.
    pub fn new() -> Self {
        Self {
            scores: Arc::new(RwLock::new(Vec::new())),
            default_score: 0.9,
            hashed: false,
        }
    }

    /// Create a scorer whose answers derive from a hash of both texts.
    pub fn hashed() -> Self {
        Self {
            scores: Arc::new(RwLock::new(Vec::new())),
            default_score: 0.0,
            hashed: true,
        }
    }

    /// Score content containing `needle` with `score`.
    pub fn with_score(self, needle: impl Into<String>, score: f32) -> Self {
        self.scores.write().unwrap().push((needle.into(), score));
        self
    }

    /// Change the fallback score.
    pub fn with_default(mut self, score: f32) -> Self {
        self.default_score = score;
        self
    }

    fn hash_score(text_a: &str, text_b: &str) -> f32 {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(text_a.as_bytes());
        hasher.update(b"\x00");
        hasher.update(text_b.as_bytes());
        let digest = hasher.finalize();
        f32::from(u16::from_be_bytes([digest[0], digest[1]])) / f32::from(u16::MAX)
    }
}

#[async_trait]
impl RelevanceScorer for MockScorer {
    async fn similarity(&self, text_a: &str, text_b: &str) -> ScoreResult<f32> {
        if self.hashed {
            return Ok(Self::hash_score(text_a, text_b));
        }
        for (needle, score) in self.scores.read().unwrap().iter() {
            if text_b.contains(needle.as_str()) {
                return Ok(*score);
            }
        }
        Ok(self.default_score)
    }
}

/// A mock LLM verifier.
#[derive(Clone)]
pub struct MockVerifier {
    verdicts: Arc<RwLock<Vec<(String, Verification)>>>,
    reject_by_default: bool,
    unavailable: bool,
    calls: Arc<RwLock<Vec<String>>>,
}

impl Default for MockVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl MockVerifier {
    /// Create a verifier that accepts everything with a score of 8.
    pub fn new() -> Self {
        Self {
            verdicts: Arc::new(RwLock::new(Vec::new())),
            reject_by_default: false,
            unavailable: false,
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Reject anything without a canned verdict.
    pub fn rejecting(mut self) -> Self {
        self.reject_by_default = true;
        self
    }

    /// Fail every call, exercising the accept-on-error policy.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Answer `verdict` for content containing `needle`.
    pub fn with_verdict(self, needle: impl Into<String>, verdict: Verification) -> Self {
        self.verdicts.write().unwrap().push((needle.into(), verdict));
        self
    }

    /// Titles verified through this mock, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl LlmVerifier for MockVerifier {
    async fn verify(
        &self,
        title: &str,
        _description: &str,
        content: &str,
    ) -> ScoreResult<Verification> {
        self.calls.write().unwrap().push(title.to_string());

        if self.unavailable {
            return Err(ScoreError::Unavailable {
                reason: "mock verifier offline".to_string(),
            });
        }
        for (needle, verdict) in self.verdicts.read().unwrap().iter() {
            if content.contains(needle.as_str()) {
                return Ok(verdict.clone());
            }
        }
        if self.reject_by_default {
            Ok(Verification::different_event(2.0))
        } else {
            Ok(Verification::same_event(8.0))
        }
    }
}
