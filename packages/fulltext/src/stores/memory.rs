//! In-memory reputation storage for testing and development.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::traits::store::ReputationStore;
use crate::types::outcome::CrawlOutcome;
use crate::types::reputation::{DomainReputation, DomainStatus};

/// In-memory domain reputation store.
///
/// Useful for tests and single-process runs. Data is lost on restart.
#[derive(Default)]
pub struct MemoryReputationStore {
    domains: RwLock<HashMap<String, DomainReputation>>,
}

impl MemoryReputationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with a prebuilt row.
    pub fn with_domain(self, reputation: DomainReputation) -> Self {
        self.domains
            .write()
            .unwrap()
            .insert(reputation.domain.clone(), reputation);
        self
    }

    /// Number of domains with recorded history.
    pub fn len(&self) -> usize {
        self.domains.read().unwrap().len()
    }

    /// Whether the store has no history at all.
    pub fn is_empty(&self) -> bool {
        self.domains.read().unwrap().is_empty()
    }

    /// Current row for one domain.
    pub fn get(&self, domain: &str) -> Option<DomainReputation> {
        self.domains.read().unwrap().get(domain).cloned()
    }
}

#[async_trait]
impl ReputationStore for MemoryReputationStore {
    async fn snapshot(&self) -> StoreResult<HashMap<String, DomainReputation>> {
        Ok(self.domains.read().unwrap().clone())
    }

    async fn record_outcome(&self, domain: &str, outcome: &CrawlOutcome) -> StoreResult<()> {
        self.domains
            .write()
            .unwrap()
            .entry(domain.to_string())
            .or_insert_with(|| DomainReputation::new(domain))
            .apply(outcome);
        Ok(())
    }

    async fn blocked_domains(&self) -> StoreResult<Vec<String>> {
        Ok(self
            .domains
            .read()
            .unwrap()
            .values()
            .filter(|rep| rep.status == DomainStatus::Blocked)
            .map(|rep| rep.domain.clone())
            .collect())
    }
}
