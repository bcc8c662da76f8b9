//! End-to-end orchestrator scenarios with mock collaborators.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use fulltext::{
    Candidate, CandidateStatus, CrawlerConfig, DomainReputation, FallbackCrawler,
    MemoryReputationStore, MockExtractor, MockScorer, MockVerifier, RelevanceFlag,
    ReputationStore, RunContext, Story, Verification,
};

/// Varied prose long enough to clear the length gate without tripping the
/// repeated-words check.
fn long_article(marker: &str) -> String {
    let mut text = format!("{marker}. ");
    for i in 0..140 {
        text.push_str(&format!("Sentence {i} adds new reporting detail{i}. "));
    }
    text
}

/// Extraction output that leaked stylesheet markup into the "article".
fn css_garbage() -> String {
    format!(
        "body {{ font-family: Arial; display: block; margin: 0 auto; }} \
         @media screen and (max-width: 600px) {{ .nav {{ padding: 0; }} }} {}",
        long_article("styles")
    )
}

fn fast_config() -> CrawlerConfig {
    CrawlerConfig::default()
        .with_attempt_delay(Duration::ZERO)
        .with_host_interval(Duration::from_millis(10))
        .with_fetch_timeout(Duration::from_secs(5))
}

fn candidate(n: u32, embedding: f32) -> Candidate {
    let url = format!("https://cand{n}.example/article");
    Candidate::new(format!("Backup {n}"), format!("Wire {n}"), &url)
        .with_embedding_score(embedding)
        .with_resolved_url(&url)
}

#[tokio::test]
async fn garbage_then_low_relevance_then_full_pass() {
    // Candidate 1 trips the markup gate, candidate 2 passes quality but
    // scores below the relevance threshold, candidate 3 clears everything.
    let story = Story::new("s1", "City approves transit plan", "The council voted on funding")
        .with_candidate(candidate(1, 0.9))
        .with_candidate(candidate(2, 0.8))
        .with_candidate(candidate(3, 0.7));

    let extractor = MockExtractor::new()
        .with_content("https://cand1.example/article", css_garbage())
        .with_content(
            "https://cand2.example/article",
            long_article("tangent topic"),
        )
        .with_content(
            "https://cand3.example/article",
            long_article("transit plan approved"),
        );
    let scorer = MockScorer::new().with_score("tangent topic", 0.10);
    let store = Arc::new(MemoryReputationStore::new());

    let crawler = FallbackCrawler::new(extractor, scorer, Arc::clone(&store))
        .with_config(fast_config())
        .with_verifier(Arc::new(MockVerifier::new()));

    let mut story = story;
    let ctx = RunContext::new();
    let result = crawler
        .process_story(&mut story, &ctx, &CancellationToken::new())
        .await;

    assert!(result.success);
    assert_eq!(result.attempts, 3);

    let [c1, c2, c3] = &story.candidates[..] else {
        panic!("expected three candidates");
    };
    assert_eq!(c1.crawl_status, CandidateStatus::Garbage);
    assert_eq!(c1.crawl_error.as_deref(), Some("css_js_code"));

    assert_eq!(c2.crawl_status, CandidateStatus::Success);
    assert_eq!(c2.relevance_flag, Some(RelevanceFlag::Low));
    assert_eq!(c2.relevance_score, Some(0.10));

    assert_eq!(c3.crawl_status, CandidateStatus::Success);
    assert_eq!(c3.relevance_flag, None);
    assert!(c3.content.is_some());

    // Outcomes reached the reputation store.
    assert_eq!(store.get("cand1.example").unwrap().fail_count, 1);
    assert_eq!(store.get("cand2.example").unwrap().success_count, 1);
    assert_eq!(store.get("cand3.example").unwrap().success_count, 1);
}

#[tokio::test]
async fn timeouts_exhaust_the_story_and_block_both_hosts() {
    let mut story = Story::new("s2", "Headline", "Description")
        .with_candidate(candidate(1, 0.9))
        .with_candidate(candidate(2, 0.8));

    let extractor = MockExtractor::new()
        .with_content("https://cand1.example/article", long_article("one"))
        .with_content("https://cand2.example/article", long_article("two"))
        .with_delay(Duration::from_millis(200));
    let store = Arc::new(MemoryReputationStore::new());

    let crawler = FallbackCrawler::new(extractor, MockScorer::new(), Arc::clone(&store))
        .with_config(fast_config().with_fetch_timeout(Duration::from_millis(50)));

    let ctx = RunContext::new();
    let result = crawler
        .process_story(&mut story, &ctx, &CancellationToken::new())
        .await;

    assert!(!result.success);
    assert_eq!(result.attempts, 2);
    for candidate in &story.candidates {
        assert_eq!(candidate.crawl_status, CandidateStatus::Error);
        assert_eq!(candidate.crawl_error.as_deref(), Some("fetch timed out"));
    }
    assert!(ctx.is_blocked("cand1.example"));
    assert!(ctx.is_blocked("cand2.example"));
    assert_eq!(store.get("cand1.example").unwrap().fail_count, 1);
}

#[tokio::test]
async fn first_success_skips_remaining_siblings() {
    let mut story = Story::new("s3", "Headline", "Description")
        .with_candidate(candidate(1, 0.9))
        .with_candidate(candidate(2, 0.8))
        .with_candidate(candidate(3, 0.7));

    let extractor = MockExtractor::new()
        .with_content("https://cand1.example/article", long_article("match"))
        .with_content("https://cand2.example/article", long_article("unused"))
        .with_content("https://cand3.example/article", long_article("unused"));

    let crawler = FallbackCrawler::new(
        extractor.clone(),
        MockScorer::new(),
        MemoryReputationStore::new(),
    )
    .with_config(fast_config());

    let result = crawler
        .process_story(&mut story, &RunContext::new(), &CancellationToken::new())
        .await;

    assert!(result.success);
    assert_eq!(result.attempts, 1);
    assert_eq!(story.candidates[0].crawl_status, CandidateStatus::Success);
    assert_eq!(story.candidates[1].crawl_status, CandidateStatus::Skipped);
    assert_eq!(story.candidates[2].crawl_status, CandidateStatus::Skipped);
    // Only the winning candidate was ever fetched.
    assert_eq!(extractor.calls().len(), 1);
}

#[tokio::test]
async fn ranking_prefers_proven_hosts_over_embedding_order() {
    // cand1 has the better embedding, but its host has a poor record with
    // enough history to trust; cand2's host is proven good.
    let mut story = Story::new("s4", "Headline", "Description")
        .with_candidate(candidate(1, 0.9))
        .with_candidate(candidate(2, 0.8));

    let store = MemoryReputationStore::new();
    for _ in 0..5 {
        store
            .record_outcome(
                "cand1.example",
                &fulltext::CrawlOutcome::Failure {
                    reason: fulltext::ReasonCode::FetchTimeout,
                },
            )
            .await
            .unwrap();
        store
            .record_outcome(
                "cand2.example",
                &fulltext::CrawlOutcome::Success {
                    llm_score: Some(8.0),
                },
            )
            .await
            .unwrap();
    }

    let extractor = MockExtractor::new()
        .with_content("https://cand1.example/article", long_article("one"))
        .with_content("https://cand2.example/article", long_article("two"));
    let store = Arc::new(store);
    let crawler = FallbackCrawler::new(extractor.clone(), MockScorer::new(), Arc::clone(&store))
        .with_config(fast_config());

    let ctx = RunContext::seeded(store.as_ref()).await;
    let result = crawler
        .process_story(&mut story, &ctx, &CancellationToken::new())
        .await;

    assert!(result.success);
    assert_eq!(result.attempts, 1);
    // The proven host was attempted first despite the lower embedding.
    assert_eq!(extractor.calls(), vec!["https://cand2.example/article"]);
    assert_eq!(story.candidates[0].crawl_status, CandidateStatus::Skipped);
    assert_eq!(story.candidates[1].crawl_status, CandidateStatus::Success);
}

#[tokio::test]
async fn verifier_rejection_moves_to_next_candidate() {
    let mut story = Story::new("s5", "Headline", "Description")
        .with_candidate(candidate(1, 0.9))
        .with_candidate(candidate(2, 0.8));

    let extractor = MockExtractor::new()
        .with_content("https://cand1.example/article", long_article("wrong event"))
        .with_content("https://cand2.example/article", long_article("right event"));
    let verifier = MockVerifier::new().with_verdict("wrong event", Verification::different_event(1.0));
    let store = Arc::new(MemoryReputationStore::new());

    let crawler = FallbackCrawler::new(extractor, MockScorer::new(), Arc::clone(&store))
        .with_config(fast_config())
        .with_verifier(Arc::new(verifier));

    let result = crawler
        .process_story(&mut story, &RunContext::new(), &CancellationToken::new())
        .await;

    assert!(result.success);
    assert_eq!(result.attempts, 2);

    let rejected = &story.candidates[0];
    assert_eq!(rejected.crawl_status, CandidateStatus::Failed);
    assert_eq!(rejected.llm_same_event, Some(false));
    assert_eq!(store.get("cand1.example").unwrap().llm_fail_streak, 1);

    let accepted = &story.candidates[1];
    assert_eq!(accepted.crawl_status, CandidateStatus::Success);
    assert_eq!(accepted.llm_same_event, Some(true));
    // Acceptance resets the streak bookkeeping for the winning host.
    assert_eq!(store.get("cand2.example").unwrap().llm_fail_streak, 0);
}

#[tokio::test]
async fn verifier_outage_accepts_content() {
    let mut story =
        Story::new("s6", "Headline", "Description").with_candidate(candidate(1, 0.9));

    let extractor =
        MockExtractor::new().with_content("https://cand1.example/article", long_article("fine"));
    let crawler = FallbackCrawler::new(extractor, MockScorer::new(), MemoryReputationStore::new())
        .with_config(fast_config())
        .with_verifier(Arc::new(MockVerifier::new().unavailable()));

    let result = crawler
        .process_story(&mut story, &RunContext::new(), &CancellationToken::new())
        .await;

    assert!(result.success);
    assert_eq!(story.candidates[0].crawl_status, CandidateStatus::Success);
    // No verdict was recorded, but the content still went through.
    assert_eq!(story.candidates[0].llm_same_event, None);
}

#[tokio::test]
async fn lone_low_relevance_candidate_is_kept_but_not_final() {
    let mut story =
        Story::new("s7", "Headline", "Description").with_candidate(candidate(1, 0.9));

    let extractor = MockExtractor::new()
        .with_content("https://cand1.example/article", long_article("off topic"));
    let scorer = MockScorer::new().with_score("off topic", 0.05);

    let crawler = FallbackCrawler::new(extractor, scorer, MemoryReputationStore::new())
        .with_config(fast_config());

    let result = crawler
        .process_story(&mut story, &RunContext::new(), &CancellationToken::new())
        .await;

    // The content is kept on the candidate, but no candidate was final.
    assert!(!result.success);
    assert_eq!(result.attempts, 1);
    assert_eq!(story.candidates[0].crawl_status, CandidateStatus::Success);
    assert_eq!(story.candidates[0].relevance_flag, Some(RelevanceFlag::Low));
    assert!(story.candidates[0].content.is_some());
}

#[tokio::test]
async fn persisted_blocklist_seeds_the_run() {
    let mut blocked = DomainReputation::new("cand1.example");
    for _ in 0..3 {
        blocked.apply(&fulltext::CrawlOutcome::LlmRejected);
    }
    let store = Arc::new(MemoryReputationStore::new().with_domain(blocked));

    let mut stories = vec![
        Story::new("s8", "Headline", "Description").with_candidate(candidate(1, 0.9)),
    ];
    let extractor = MockExtractor::new()
        .with_content("https://cand1.example/article", long_article("anything"));

    let crawler = FallbackCrawler::new(extractor, MockScorer::new(), Arc::clone(&store))
        .with_config(fast_config());

    let report = crawler.process_batch(&mut stories).await;

    assert_eq!(report.stories, 1);
    assert_eq!(report.failed, 1);
    // The extractor declined the blocked host, so the candidate failed
    // without the host ever being fetched for content.
    assert_eq!(stories[0].candidates[0].crawl_status, CandidateStatus::Failed);
    assert_eq!(
        stories[0].candidates[0].crawl_error.as_deref(),
        Some("fetch skipped: blocked_host")
    );
}

#[tokio::test]
async fn cancelled_story_stops_before_attempting() {
    let mut story =
        Story::new("s9", "Headline", "Description").with_candidate(candidate(1, 0.9));

    let extractor = MockExtractor::new()
        .with_content("https://cand1.example/article", long_article("anything"));
    let crawler = FallbackCrawler::new(
        extractor.clone(),
        MockScorer::new(),
        MemoryReputationStore::new(),
    )
    .with_config(fast_config());

    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = crawler
        .process_story(&mut story, &RunContext::new(), &cancel)
        .await;

    assert!(!result.success);
    assert_eq!(result.attempts, 0);
    assert_eq!(story.candidates[0].crawl_status, CandidateStatus::Pending);
    assert!(extractor.calls().is_empty());
}

#[tokio::test]
async fn batch_reports_counts_and_reasons() {
    let mut stories = vec![
        Story::new("ok", "Headline one", "Description")
            .with_candidate(candidate(1, 0.9)),
        // No candidates at all: fails with zero attempts.
        Story::new("empty", "Headline two", "Description"),
    ];

    let extractor = MockExtractor::new()
        .with_content("https://cand1.example/article", long_article("good"));
    let crawler = FallbackCrawler::new(extractor, MockScorer::new(), MemoryReputationStore::new())
        .with_config(fast_config().with_concurrency(4));

    let report = crawler.process_batch(&mut stories).await;

    assert_eq!(report.stories, 2);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.attempts, 1);
    assert!(report.reason_counts.is_empty());
}

#[tokio::test]
async fn plain_links_resolve_by_passthrough_inside_the_orchestrator() {
    // Candidate arrives without a resolved URL; its link is not a redirect
    // link, so the resolver passes it through with no network traffic.
    let url = "https://cand1.example/article";
    let mut story = Story::new("s10", "Headline", "Description").with_candidate(
        Candidate::new("Backup", "Wire", url).with_embedding_score(0.9),
    );

    let extractor = MockExtractor::new().with_content(url, long_article("good"));
    let crawler = FallbackCrawler::new(extractor, MockScorer::new(), MemoryReputationStore::new())
        .with_config(fast_config());

    let result = crawler
        .process_story(&mut story, &RunContext::new(), &CancellationToken::new())
        .await;

    assert!(result.success);
    assert_eq!(story.candidates[0].resolved_url.as_deref(), Some(url));
    assert_eq!(
        story.candidates[0].resolved_domain.as_deref(),
        Some("cand1.example")
    );
}
