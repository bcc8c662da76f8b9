//! Reputation persistence seam.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::types::outcome::CrawlOutcome;
use crate::types::reputation::DomainReputation;

/// Persistent store of per-host reputation rows.
///
/// Upsert semantics, last write wins per domain. Within a run the
/// orchestrator is the only writer by convention; exactly-once accounting
/// is not guaranteed and not required.
#[async_trait]
pub trait ReputationStore: Send + Sync {
    /// Read every known domain row at run start.
    async fn snapshot(&self) -> StoreResult<HashMap<String, DomainReputation>>;

    /// Fold one terminal candidate outcome into a domain's row.
    async fn record_outcome(&self, domain: &str, outcome: &CrawlOutcome) -> StoreResult<()>;

    /// Domains currently marked blocked, used to seed a run's block set.
    async fn blocked_domains(&self) -> StoreResult<Vec<String>>;
}

#[async_trait]
impl<S: ReputationStore> ReputationStore for std::sync::Arc<S> {
    async fn snapshot(&self) -> StoreResult<HashMap<String, DomainReputation>> {
        self.as_ref().snapshot().await
    }

    async fn record_outcome(&self, domain: &str, outcome: &CrawlOutcome) -> StoreResult<()> {
        self.as_ref().record_outcome(domain, outcome).await
    }

    async fn blocked_domains(&self) -> StoreResult<Vec<String>> {
        self.as_ref().blocked_domains().await
    }
}
