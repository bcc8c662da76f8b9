//! Configuration for the resolver and the crawl orchestrator.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where the aggregator lives and how to talk to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Hostname whose links require resolution
    pub domain: String,

    /// Base URL for landing pages and the batch endpoint
    pub base_url: String,

    /// Per-request timeout for resolution HTTP calls
    pub request_timeout: Duration,

    /// User agent presented to the aggregator
    pub user_agent: String,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            domain: "news.google.com".to_string(),
            base_url: "https://news.google.com".to_string(),
            request_timeout: Duration::from_secs(30),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".to_string(),
        }
    }
}

impl AggregatorConfig {
    /// Point the resolver at a different aggregator host.
    pub fn with_domain(mut self, domain: impl Into<String>, base_url: impl Into<String>) -> Self {
        self.domain = domain.into();
        self.base_url = base_url.into();
        self
    }

    /// Set the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Knobs for the fallback crawl orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// How many stories are processed in parallel
    pub concurrency: usize,

    /// Wall-clock budget for one content fetch
    pub fetch_timeout: Duration,

    /// Courtesy delay between attempts on different candidates
    pub attempt_delay: Duration,

    /// Minimum spacing between requests to the same host
    pub host_interval: Duration,

    /// Content shorter than this needs the short-but-real exception
    pub min_content_length: usize,

    /// Floor for the short-but-real exception
    pub short_content_min: usize,

    /// Content must be at least this multiple of the description length
    pub short_content_ratio: f32,

    /// Similarity below this marks a success as low-relevance
    pub relevance_threshold: f32,

    /// How much content feeds the relevance and verification scorers
    pub content_prefix: usize,

    /// Whether to run the LLM verification gate when a verifier is present
    pub verify_with_llm: bool,

    /// Outcomes required before a host's aggregates are trusted
    pub min_domain_history: u32,

    /// Wilson score assumed for unproven hosts
    pub neutral_wilson: f32,

    /// LLM average assumed for unproven hosts
    pub neutral_llm: f32,

    /// Weight of the semantic-ranking score
    pub embedding_weight: f32,

    /// Weight of the host's Wilson score
    pub wilson_weight: f32,

    /// Weight of the host's normalized LLM average
    pub llm_weight: f32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            fetch_timeout: Duration::from_secs(90),
            attempt_delay: Duration::from_millis(1500),
            host_interval: Duration::from_secs(3),
            min_content_length: 500,
            short_content_min: 150,
            short_content_ratio: 1.5,
            relevance_threshold: 0.25,
            content_prefix: 1500,
            verify_with_llm: true,
            min_domain_history: 3,
            neutral_wilson: 0.4,
            neutral_llm: 5.0,
            embedding_weight: 0.50,
            wilson_weight: 0.25,
            llm_weight: 0.25,
        }
    }
}

impl CrawlerConfig {
    /// Set story-level parallelism.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the content fetch budget.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Set the inter-attempt courtesy delay.
    pub fn with_attempt_delay(mut self, delay: Duration) -> Self {
        self.attempt_delay = delay;
        self
    }

    /// Set the per-host minimum spacing.
    pub fn with_host_interval(mut self, interval: Duration) -> Self {
        self.host_interval = interval;
        self
    }

    /// Set the relevance threshold.
    pub fn with_relevance_threshold(mut self, threshold: f32) -> Self {
        self.relevance_threshold = threshold;
        self
    }

    /// Disable the LLM verification gate.
    pub fn without_llm_verification(mut self) -> Self {
        self.verify_with_llm = false;
        self
    }
}
