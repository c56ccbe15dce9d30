//! In-process record store.
//!
//! Used in dev mode and tests. Nothing survives a restart.

use std::collections::HashSet;

use async_trait::async_trait;
use sitevisit_id::CustomerId;
use tokio::sync::RwLock;
use tracing::debug;

use super::{StoreError, VisitStore};
use crate::model::SiteVisit;

#[derive(Default)]
struct Log {
    visits: Vec<SiteVisit>,
    customer_ids: HashSet<CustomerId>,
}

/// Insertion-ordered in-memory store.
#[derive(Default)]
pub struct MemoryVisitStore {
    log: RwLock<Log>,
}

impl MemoryVisitStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.log.read().await.visits.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl VisitStore for MemoryVisitStore {
    async fn last_customer_id(&self) -> Result<Option<CustomerId>, StoreError> {
        let log = self.log.read().await;
        Ok(log.visits.last().map(|v| v.customer_id))
    }

    async fn insert(&self, visit: SiteVisit) -> Result<SiteVisit, StoreError> {
        let mut log = self.log.write().await;
        if !log.customer_ids.insert(visit.customer_id) {
            return Err(StoreError::DuplicateCustomerId(visit.customer_id));
        }
        debug!(customer_id = %visit.customer_id, "Stored site visit in memory");
        log.visits.push(visit.clone());
        Ok(visit)
    }

    async fn list(&self, limit: usize) -> Result<Vec<SiteVisit>, StoreError> {
        let log = self.log.read().await;
        Ok(log.visits.iter().rev().take(limit).cloned().collect())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
