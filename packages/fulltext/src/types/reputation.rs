//! Per-host reputation aggregates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::outcome::CrawlOutcome;

/// Consecutive verifier rejections before a host is blocked.
const LLM_FAIL_STREAK_LIMIT: u32 = 3;

/// Whether a host is still eligible for crawling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainStatus {
    Active,
    Blocked,
}

/// Aggregate crawl history for one destination host.
///
/// Long-lived and shared across runs. Accounting is approximate: concurrent
/// writers may race on read-modify-write, which is accepted because the
/// scores only bias candidate ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainReputation {
    pub domain: String,
    pub status: DomainStatus,
    pub success_count: u32,
    pub fail_count: u32,
    pub wilson_score: f32,
    pub avg_llm_score: f32,
    pub llm_score_count: u32,
    pub llm_fail_streak: u32,
    pub updated_at: DateTime<Utc>,
}

impl DomainReputation {
    /// Fresh row for a host with no history.
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            status: DomainStatus::Active,
            success_count: 0,
            fail_count: 0,
            wilson_score: 0.0,
            avg_llm_score: 0.0,
            llm_score_count: 0,
            llm_fail_streak: 0,
            updated_at: Utc::now(),
        }
    }

    /// Total recorded outcomes for this host.
    pub fn total_outcomes(&self) -> u32 {
        self.success_count + self.fail_count
    }

    /// Fold a terminal candidate outcome into the aggregates.
    pub fn apply(&mut self, outcome: &CrawlOutcome) {
        match outcome {
            CrawlOutcome::Success { llm_score } => {
                self.success_count += 1;
                if let Some(score) = llm_score {
                    let total = self.avg_llm_score * self.llm_score_count as f32 + score;
                    self.llm_score_count += 1;
                    self.avg_llm_score = total / self.llm_score_count as f32;
                    // A verified success clears any rejection streak.
                    self.llm_fail_streak = 0;
                    self.status = DomainStatus::Active;
                }
            }
            CrawlOutcome::Failure { .. } => {
                self.fail_count += 1;
            }
            CrawlOutcome::LlmRejected => {
                self.fail_count += 1;
                self.llm_fail_streak += 1;
                if self.llm_fail_streak >= LLM_FAIL_STREAK_LIMIT {
                    self.status = DomainStatus::Blocked;
                }
            }
        }
        self.wilson_score = wilson_lower_bound(self.success_count, self.fail_count);
        self.updated_at = Utc::now();
    }
}

/// Lower bound of the Wilson score interval at 95% confidence.
///
/// Conservative when the sample is small, so one lucky early success cannot
/// out-rank a proven host.
pub fn wilson_lower_bound(successes: u32, failures: u32) -> f32 {
    let n = f64::from(successes + failures);
    if n == 0.0 {
        return 0.0;
    }
    const Z: f64 = 1.96;
    let p = f64::from(successes) / n;
    let z2 = Z * Z;
    let center = p + z2 / (2.0 * n);
    let margin = Z * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt();
    (((center - margin) / (1.0 + z2 / n)).max(0.0)) as f32
}
