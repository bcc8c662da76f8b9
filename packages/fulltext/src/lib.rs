//! Redirect resolution and fallback crawl orchestration for syndicated
//! news stories.
//!
//! Given a headline and a ranked list of backup articles, this library
//! finds a freely-readable full text for the story: it decodes or
//! reverse-resolves aggregator redirect links, fetches candidates through
//! an external extraction collaborator under per-host rate limits, grades
//! what comes back, and feeds every outcome into a per-domain reputation
//! score that biases the next run's ordering.
//!
//! # Design Philosophy
//!
//! Failures are data. Every resolution attempt ends in a typed
//! [`ResolveOutcome`] and every crawl attempt in a reason code; nothing a
//! remote host does can abort a batch. The orchestrator deliberately
//! favors recall over precision: short-but-real articles and
//! low-relevance matches are kept and flagged rather than discarded.
//!
//! # Usage
//!
//! ```rust,ignore
//! use fulltext::{FallbackCrawler, MemoryReputationStore, Story, Candidate};
//!
//! let crawler = FallbackCrawler::new(extractor, scorer, MemoryReputationStore::new());
//! let mut stories = vec![
//!     Story::new("s1", "Headline", "What happened")
//!         .with_candidate(Candidate::new("Backup title", "Example Wire", link)),
//! ];
//! let report = crawler.process_batch(&mut stories).await;
//! println!("{} of {} stories crawled", report.succeeded, report.stories);
//! ```
//!
//! # Modules
//!
//! - [`resolver`] - Redirect resolution engine (decode, challenge API, canonical fallback)
//! - [`crawler`] - Fallback crawl orchestrator, rate limiting, quality gate
//! - [`types`] - Stories, candidates, outcomes, reputation, configuration
//! - [`traits`] - Collaborator seams (extraction, scoring, persistence)
//! - [`stores`] - Reputation storage implementations
//! - [`testing`] - Mock collaborators

pub mod crawler;
pub mod error;
pub mod resolver;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{ExtractError, ExtractResult, ScoreError, ScoreResult, StoreError, StoreResult};
pub use traits::{
    extractor::{ContentExtractor, ExtractedContent, FetchMode},
    scorer::{LlmVerifier, RelevanceScorer, Verification},
    store::ReputationStore,
};
pub use types::{
    candidate::{host_of, Candidate, CandidateStatus, RelevanceFlag, Story},
    config::{AggregatorConfig, CrawlerConfig},
    outcome::{CrawlOutcome, ReasonCode, ResolveOutcome, ResolveStrategy},
    reputation::{wilson_lower_bound, DomainReputation, DomainStatus},
};

// Re-export the engines
pub use crawler::{
    quality::{classify, GarbageReason},
    ranking::weighted_score,
    rate_limit::HostRateLimiter,
    FallbackCrawler, RunContext, RunReport, StoryResult,
};
pub use resolver::RedirectResolver;

// Re-export stores and mocks
pub use stores::MemoryReputationStore;
pub use testing::{MockExtractor, MockScorer, MockVerifier};
