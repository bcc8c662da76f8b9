//! Candidate ordering.
//!
//! Blends the upstream semantic score with the destination host's track
//! record. Hosts with fewer than `min_domain_history` recorded outcomes
//! fall back to neutral defaults so a thin history cannot dominate the
//! ordering either way.

use crate::types::candidate::Candidate;
use crate::types::config::CrawlerConfig;
use crate::types::reputation::DomainReputation;

/// Embedding score assumed when the ranking step provided none.
const DEFAULT_EMBEDDING_SCORE: f32 = 0.5;

/// Blended ranking value for one candidate.
pub fn weighted_score(
    candidate: &Candidate,
    reputation: Option<&DomainReputation>,
    config: &CrawlerConfig,
) -> f32 {
    let embedding = candidate
        .embedding_score
        .unwrap_or(DEFAULT_EMBEDDING_SCORE);

    let (wilson, llm_avg) = match reputation {
        Some(rep) if rep.total_outcomes() >= config.min_domain_history => {
            (rep.wilson_score, rep.avg_llm_score)
        }
        _ => (config.neutral_wilson, config.neutral_llm),
    };

    config.embedding_weight * embedding
        + config.wilson_weight * wilson
        + config.llm_weight * (llm_avg / 10.0)
}
