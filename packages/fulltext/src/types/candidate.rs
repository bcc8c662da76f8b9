//! Stories and their backup-article candidates.

use serde::{Deserialize, Serialize};

/// Where a candidate sits in the crawl lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    /// Not yet attempted
    Pending,
    /// Cleared every gate, or cleared the quality gate with low relevance
    Success,
    /// Failed a gate (length, relevance follow-up, verification)
    Failed,
    /// Content was present but unusable
    Garbage,
    /// Fetch raised an error or timed out
    Error,
    /// A sibling succeeded first
    Skipped,
}

/// Marks a success whose similarity fell below the relevance threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelevanceFlag {
    Low,
}

/// One backup article proposed for a story.
///
/// Created by the upstream ranking step in `Pending` status and mutated in
/// place by the orchestrator as it moves through resolve → fetch → gate →
/// score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub title: String,
    pub source: String,
    pub source_domain: String,
    pub link: String,
    pub embedding_score: Option<f32>,
    pub is_preferred: bool,
    pub crawl_status: CandidateStatus,
    pub crawl_error: Option<String>,
    pub relevance_score: Option<f32>,
    pub relevance_flag: Option<RelevanceFlag>,
    pub llm_same_event: Option<bool>,
    pub llm_score: Option<f32>,
    pub resolved_url: Option<String>,
    pub resolved_domain: Option<String>,
    pub content: Option<String>,
    pub content_length: usize,
}

impl Candidate {
    /// Create a pending candidate.
    pub fn new(
        title: impl Into<String>,
        source: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        let link = link.into();
        Self {
            title: title.into(),
            source: source.into(),
            source_domain: host_of(&link).unwrap_or_default(),
            link,
            embedding_score: None,
            is_preferred: false,
            crawl_status: CandidateStatus::Pending,
            crawl_error: None,
            relevance_score: None,
            relevance_flag: None,
            llm_same_event: None,
            llm_score: None,
            resolved_url: None,
            resolved_domain: None,
            content: None,
            content_length: 0,
        }
    }

    /// Set the semantic-ranking score.
    pub fn with_embedding_score(mut self, score: f32) -> Self {
        self.embedding_score = Some(score);
        self
    }

    /// Mark this candidate as the ranking step's preferred pick.
    pub fn preferred(mut self) -> Self {
        self.is_preferred = true;
        self
    }

    /// Set an already-resolved target URL (skips the resolver).
    pub fn with_resolved_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.resolved_domain = host_of(&url);
        self.resolved_url = Some(url);
        self
    }

    /// Whether this candidate can still be attempted.
    pub fn is_pending(&self) -> bool {
        self.crawl_status == CandidateStatus::Pending
    }

    /// Record a terminal failure state with its reason string.
    pub(crate) fn mark(&mut self, status: CandidateStatus, error: impl Into<String>) {
        self.crawl_status = status;
        self.crawl_error = Some(error.into());
    }
}

/// A headline plus its set of backup candidates.
///
/// Owned exclusively by the orchestrator for the duration of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    pub title: String,
    pub description: String,
    pub candidates: Vec<Candidate>,
}

impl Story {
    /// Create a story with no candidates yet.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            candidates: Vec::new(),
        }
    }

    /// Append a candidate.
    pub fn with_candidate(mut self, candidate: Candidate) -> Self {
        self.candidates.push(candidate);
        self
    }

    /// The text compared against candidate content for relevance.
    pub fn text(&self) -> String {
        if self.description.is_empty() {
            self.title.clone()
        } else {
            format!("{} {}", self.title, self.description)
        }
    }
}

/// Hostname of a URL, lowercased, or `None` when it will not parse.
pub fn host_of(url: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_builder_fills_domains() {
        let candidate = Candidate::new("Title", "Example Wire", "https://Example.com/story")
            .with_embedding_score(0.8)
            .with_resolved_url("https://news.example.org/a/1");

        assert_eq!(candidate.source_domain, "example.com");
        assert_eq!(
            candidate.resolved_domain.as_deref(),
            Some("news.example.org")
        );
        assert_eq!(candidate.embedding_score, Some(0.8));
        assert!(candidate.is_pending());
    }

    #[test]
    fn story_text_joins_title_and_description() {
        let story = Story::new("s1", "Headline", "More detail");
        assert_eq!(story.text(), "Headline More detail");

        let bare = Story::new("s2", "Headline", "");
        assert_eq!(bare.text(), "Headline");
    }

    #[test]
    fn host_of_rejects_garbage() {
        assert_eq!(host_of("not a url"), None);
        assert_eq!(host_of("https://A.B.C/x"), Some("a.b.c".to_string()));
    }
}
