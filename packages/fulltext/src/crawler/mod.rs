//! Fallback crawl orchestration.
//!
//! For each story, tries ranked backup candidates until one yields usable,
//! relevant content: resolve → rate-limit → fetch → quality gate →
//! relevance gate → optional LLM verification. Every failure is local to
//! one candidate; a story only fails when its candidate list is exhausted,
//! and a batch always runs to completion.

pub mod quality;
pub mod ranking;
pub mod rate_limit;

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::resolver::RedirectResolver;
use crate::traits::extractor::{ContentExtractor, FetchMode};
use crate::traits::scorer::{LlmVerifier, RelevanceScorer};
use crate::traits::store::ReputationStore;
use crate::types::candidate::{host_of, Candidate, CandidateStatus, RelevanceFlag, Story};
use crate::types::config::CrawlerConfig;
use crate::types::outcome::{CrawlOutcome, ReasonCode};
use crate::types::reputation::DomainReputation;

use quality::char_prefix;
use rate_limit::HostRateLimiter;

/// What one story's crawl produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoryResult {
    pub success: bool,
    pub attempts: u32,
}

/// Batch-level summary, including per-reason tallies of terminal candidate
/// failures.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct RunReport {
    pub stories: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub attempts: u64,
    pub reason_counts: HashMap<ReasonCode, u64>,
}

/// Mutable state shared by every story task in one run.
///
/// Owned state passed in explicitly rather than process-wide globals, so
/// batches can run with independent state. The locks are held only for
/// map access, never across an await.
#[derive(Default)]
pub struct RunContext {
    block_set: RwLock<HashSet<String>>,
    reputation: RwLock<HashMap<String, DomainReputation>>,
    reason_counts: RwLock<HashMap<ReasonCode, u64>>,
}

impl RunContext {
    /// Empty context with no seeded history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Context seeded from the persisted reputation store: a snapshot for
    /// ranking plus the blocked domains for the run's block set.
    pub async fn seeded<S: ReputationStore + ?Sized>(store: &S) -> Self {
        let ctx = Self::new();
        match store.snapshot().await {
            Ok(snapshot) => *ctx.reputation.write().unwrap() = snapshot,
            Err(e) => warn!(error = %e, "reputation snapshot unavailable, starting cold"),
        }
        match store.blocked_domains().await {
            Ok(domains) => ctx.block_set.write().unwrap().extend(domains),
            Err(e) => warn!(error = %e, "blocklist unavailable, starting empty"),
        }
        ctx
    }

    /// Add a host to the run's block set.
    pub fn block_host(&self, host: &str) {
        if !host.is_empty() {
            self.block_set.write().unwrap().insert(host.to_string());
        }
    }

    /// Whether a host failed earlier in this run.
    pub fn is_blocked(&self, host: &str) -> bool {
        self.block_set.read().unwrap().contains(host)
    }

    /// Snapshot of the block set, handed to the extraction collaborator.
    pub fn blocked_hosts(&self) -> HashSet<String> {
        self.block_set.read().unwrap().clone()
    }

    /// Current view of one domain's reputation.
    pub fn reputation_of(&self, domain: &str) -> Option<DomainReputation> {
        self.reputation.read().unwrap().get(domain).cloned()
    }

    /// Per-reason tallies accumulated so far.
    pub fn reason_counts(&self) -> HashMap<ReasonCode, u64> {
        self.reason_counts.read().unwrap().clone()
    }

    fn apply_outcome(&self, domain: &str, outcome: &CrawlOutcome) {
        self.reputation
            .write()
            .unwrap()
            .entry(domain.to_string())
            .or_insert_with(|| DomainReputation::new(domain))
            .apply(outcome);
    }

    fn record_reason(&self, reason: ReasonCode) {
        *self.reason_counts.write().unwrap().entry(reason).or_insert(0) += 1;
    }
}

/// Story text the gates compare candidate content against.
struct StoryText {
    title: String,
    description: String,
    text: String,
    description_len: usize,
}

impl StoryText {
    fn of(story: &Story) -> Self {
        Self {
            title: story.title.clone(),
            description: story.description.clone(),
            text: story.text(),
            description_len: story.description.chars().count(),
        }
    }
}

/// Drives the try-next-candidate loop across many stories.
pub struct FallbackCrawler<E, R, S> {
    extractor: E,
    scorer: R,
    reputation: S,
    verifier: Option<std::sync::Arc<dyn LlmVerifier>>,
    resolver: RedirectResolver,
    limiter: HostRateLimiter,
    config: CrawlerConfig,
}

impl<E, R, S> FallbackCrawler<E, R, S>
where
    E: ContentExtractor,
    R: RelevanceScorer,
    S: ReputationStore,
{
    /// Create an orchestrator with default configuration and resolver.
    pub fn new(extractor: E, scorer: R, reputation: S) -> Self {
        let config = CrawlerConfig::default();
        Self {
            extractor,
            scorer,
            reputation,
            verifier: None,
            resolver: RedirectResolver::default(),
            limiter: HostRateLimiter::new(config.host_interval),
            config,
        }
    }

    /// Replace the configuration (rebuilds the per-host limiter).
    pub fn with_config(mut self, config: CrawlerConfig) -> Self {
        self.limiter = HostRateLimiter::new(config.host_interval);
        self.config = config;
        self
    }

    /// Attach an LLM verification collaborator.
    pub fn with_verifier(mut self, verifier: std::sync::Arc<dyn LlmVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Replace the redirect resolver.
    pub fn with_resolver(mut self, resolver: RedirectResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    /// The reputation store backing this orchestrator.
    pub fn reputation(&self) -> &S {
        &self.reputation
    }

    /// Process a whole batch under the configured concurrency limit.
    ///
    /// Seeds a fresh [`RunContext`] from the reputation store, processes
    /// every story, and reports counts plus per-reason tallies. Never
    /// aborts mid-batch because of a single bad URL or host.
    pub async fn process_batch(&self, stories: &mut [Story]) -> RunReport {
        let ctx = RunContext::seeded(&self.reputation).await;
        self.process_batch_with(stories, &ctx).await
    }

    /// Process a batch against caller-owned run state.
    pub async fn process_batch_with(&self, stories: &mut [Story], ctx: &RunContext) -> RunReport {
        let cancel = CancellationToken::new();
        let concurrency = self.config.concurrency.max(1);

        let results: Vec<StoryResult> = stream::iter(stories.iter_mut())
            .map(|story| {
                let token = cancel.child_token();
                async move { self.process_story(story, ctx, &token).await }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut report = RunReport {
            stories: results.len(),
            ..Default::default()
        };
        for result in &results {
            report.attempts += u64::from(result.attempts);
            if result.success {
                report.succeeded += 1;
            } else {
                report.failed += 1;
            }
        }
        report.reason_counts = ctx.reason_counts();

        info!(
            stories = report.stories,
            succeeded = report.succeeded,
            failed = report.failed,
            attempts = report.attempts,
            "batch complete"
        );
        report
    }

    /// Process one story: resolve, rank, and attempt candidates until one
    /// clears every gate or the list is exhausted.
    pub async fn process_story(
        &self,
        story: &mut Story,
        ctx: &RunContext,
        cancel: &CancellationToken,
    ) -> StoryResult {
        // Resolve candidates that arrived without a target URL.
        for candidate in story.candidates.iter_mut() {
            if !candidate.is_pending() || candidate.resolved_url.is_some() {
                continue;
            }
            let outcome = self.resolver.resolve(&candidate.link).await;
            if outcome.success {
                if let Some(target) = outcome.resolved_url {
                    candidate.resolved_domain = host_of(&target);
                    candidate.resolved_url = Some(target);
                }
            } else {
                ctx.record_reason(outcome.reason);
                candidate.mark(
                    CandidateStatus::Failed,
                    format!("resolution failed: {}", outcome.reason),
                );
            }
        }

        // Rank what survived by the blended score.
        let mut scored: Vec<(usize, f32)> = story
            .candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_pending() && c.resolved_url.is_some())
            .map(|(idx, c)| {
                let rep = c
                    .resolved_domain
                    .as_deref()
                    .and_then(|d| ctx.reputation_of(d));
                (idx, ranking::weighted_score(c, rep.as_ref(), &self.config))
            })
            .collect();

        if scored.is_empty() {
            debug!(story = %story.id, "no resolvable candidates");
            return StoryResult {
                success: false,
                attempts: 0,
            };
        }
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let story_text = StoryText::of(story);
        let mut attempts = 0u32;

        for (position, (idx, score)) in scored.iter().enumerate() {
            if cancel.is_cancelled() {
                info!(story = %story.id, attempts, "story cancelled");
                return StoryResult {
                    success: false,
                    attempts,
                };
            }
            if position > 0 && !self.config.attempt_delay.is_zero() {
                tokio::time::sleep(self.config.attempt_delay).await;
            }

            attempts += 1;
            let candidate = &mut story.candidates[*idx];
            debug!(
                story = %story.id,
                url = %candidate.resolved_url.as_deref().unwrap_or(&candidate.link),
                score = f64::from(*score),
                "attempting candidate"
            );

            if self.attempt_candidate(candidate, &story_text, ctx).await {
                for sibling in story.candidates.iter_mut() {
                    if sibling.is_pending() {
                        sibling.crawl_status = CandidateStatus::Skipped;
                    }
                }
                info!(story = %story.id, attempts, "story crawled");
                return StoryResult {
                    success: true,
                    attempts,
                };
            }
        }

        info!(story = %story.id, attempts, "candidates exhausted");
        StoryResult {
            success: false,
            attempts,
        }
    }

    /// Run one candidate through fetch and every gate.
    ///
    /// Returns true when the candidate is a final success for its story.
    async fn attempt_candidate(
        &self,
        candidate: &mut Candidate,
        story: &StoryText,
        ctx: &RunContext,
    ) -> bool {
        let Some(url) = candidate.resolved_url.clone() else {
            return false;
        };
        let host = candidate.resolved_domain.clone().unwrap_or_default();

        self.limiter.wait(&host).await;

        let blocked = ctx.blocked_hosts();
        let fetched = tokio::time::timeout(
            self.config.fetch_timeout,
            self.extractor.fetch(&url, FetchMode::Standard, &blocked),
        )
        .await;

        let content = match fetched {
            Err(_) => {
                warn!(url = %url, "content fetch timed out");
                candidate.mark(CandidateStatus::Error, "fetch timed out");
                ctx.block_host(&host);
                self.record(ctx, &host, ReasonCode::FetchTimeout).await;
                return false;
            }
            Ok(Err(e)) => {
                warn!(url = %url, error = %e, "content fetch failed");
                candidate.mark(CandidateStatus::Error, format!("fetch failed: {e}"));
                ctx.block_host(&host);
                self.record(ctx, &host, ReasonCode::FetchFailed).await;
                return false;
            }
            Ok(Ok(content)) => content,
        };

        if !content.success {
            let reason = content
                .skip_reason
                .unwrap_or_else(|| "extractor declined".to_string());
            candidate.mark(CandidateStatus::Failed, format!("fetch skipped: {reason}"));
            self.record(ctx, &host, ReasonCode::FetchFailed).await;
            return false;
        }

        // Accept long content outright; short content only when it still
        // says materially more than the headline's own description.
        let length = content.markdown_length;
        let long_enough = length > self.config.min_content_length;
        let short_but_real = length >= self.config.short_content_min
            && length as f32 >= self.config.short_content_ratio * story.description_len as f32;
        if !(long_enough || short_but_real) {
            candidate.mark(
                CandidateStatus::Failed,
                format!("content too short: {length} chars"),
            );
            self.record(ctx, &host, ReasonCode::BelowLengthThreshold).await;
            return false;
        }

        candidate.content = Some(content.markdown.clone());
        candidate.content_length = length;

        if let Some(garbage) = quality::classify(&content.markdown) {
            debug!(url = %url, reason = %garbage, "quality gate rejected content");
            candidate.mark(CandidateStatus::Garbage, garbage.to_string());
            self.record(ctx, &host, garbage.into()).await;
            return false;
        }

        let excerpt = char_prefix(&content.markdown, self.config.content_prefix);
        match self.scorer.similarity(&story.text, excerpt).await {
            Ok(similarity) => {
                candidate.relevance_score = Some(similarity);
                if similarity < self.config.relevance_threshold {
                    debug!(
                        url = %url,
                        similarity = f64::from(similarity),
                        "below relevance threshold, keeping as low-relevance"
                    );
                    candidate.crawl_status = CandidateStatus::Success;
                    candidate.relevance_flag = Some(RelevanceFlag::Low);
                    ctx.record_reason(ReasonCode::LowRelevance);
                    self.record_outcome(ctx, &host, CrawlOutcome::Success { llm_score: None })
                        .await;
                    return false;
                }
            }
            Err(e) => {
                warn!(url = %url, error = %e, "relevance scorer unavailable, skipping gate");
            }
        }

        if self.config.verify_with_llm {
            if let Some(verifier) = &self.verifier {
                match verifier
                    .verify(&story.title, &story.description, excerpt)
                    .await
                {
                    Ok(verdict) => {
                        candidate.llm_same_event = Some(verdict.is_same_event);
                        candidate.llm_score = Some(verdict.relevance_score);
                        if !verdict.is_same_event {
                            debug!(url = %url, "verifier judged content a different event");
                            candidate
                                .mark(CandidateStatus::Failed, "verification: different event");
                            ctx.record_reason(ReasonCode::LlmRejected);
                            self.record_outcome(ctx, &host, CrawlOutcome::LlmRejected).await;
                            return false;
                        }
                    }
                    Err(e) => {
                        warn!(url = %url, error = %e, "verification unavailable, accepting content");
                    }
                }
            }
        }

        candidate.crawl_status = CandidateStatus::Success;
        self.record_outcome(
            ctx,
            &host,
            CrawlOutcome::Success {
                llm_score: candidate.llm_score,
            },
        )
        .await;
        true
    }

    /// Record a failure reason against a host, in the run and the store.
    async fn record(&self, ctx: &RunContext, host: &str, reason: ReasonCode) {
        ctx.record_reason(reason);
        self.record_outcome(ctx, host, CrawlOutcome::Failure { reason })
            .await;
    }

    /// Fold a terminal outcome into the run view and the persistent store.
    async fn record_outcome(&self, ctx: &RunContext, host: &str, outcome: CrawlOutcome) {
        if host.is_empty() {
            return;
        }
        ctx.apply_outcome(host, &outcome);
        if let Err(e) = self.reputation.record_outcome(host, &outcome).await {
            warn!(domain = %host, error = %e, "failed to persist domain outcome");
        }
    }
}
