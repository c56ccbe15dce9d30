//! Issuing customer IDs against the record store.
//!
//! Reading the last ID and writing its successor is not atomic. When two
//! requests race, the store rejects the second insert as a duplicate and the
//! loser re-reads the log and tries again with a fresh ID. A duplicate while
//! the log has not moved means the last record was given an ID behind the
//! sequence; issuance then steps forward past the stored IDs.

use chrono::Utc;
use sitevisit_id::{CustomerId, Rollover};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::export::{SheetExporter, SheetRow};
use crate::model::{FieldViolation, NewSiteVisit, SiteVisit};
use crate::store::{StoreError, VisitStore};

/// Errors from creating a site visit.
#[derive(Debug, Error)]
pub enum IssueError {
    #[error("site visit failed validation")]
    Invalid(Vec<FieldViolation>),

    /// The caller supplied a customer ID that is already stored.
    #[error("customer ID {0} is already in use")]
    Conflict(CustomerId),

    /// Auto-issued IDs kept colliding with stored records.
    #[error("could not issue a unique customer ID after {attempts} attempts")]
    Exhausted { attempts: u32 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The ID the next record would get, without reserving it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preview {
    pub previous: Option<CustomerId>,
    pub next: CustomerId,
}

/// Computes the next customer ID from the store's last issued one.
pub async fn preview_next(store: &dyn VisitStore) -> Result<Preview, StoreError> {
    let previous = store.last_customer_id().await?;
    let next = previous.map_or(CustomerId::FIRST, |prev| prev.next());
    Ok(Preview { previous, next })
}

/// Validates and stores a site visit, then exports it.
///
/// Without a supplied customer ID the next one is issued, retrying up to
/// `retries` more times if a concurrent writer takes it first. IDs already
/// stored ahead of a stale last record are skipped without using a retry. A
/// supplied ID that is already in use is a conflict and is not retried.
pub async fn create_visit(
    store: &dyn VisitStore,
    exporter: &dyn SheetExporter,
    new: NewSiteVisit,
    retries: u32,
) -> Result<SiteVisit, IssueError> {
    let supplied = new.validate().map_err(IssueError::Invalid)?;

    let stored = match supplied {
        Some(customer_id) => {
            let visit = new.into_site_visit(customer_id, Utc::now());
            match store.insert(visit).await {
                Ok(visit) => visit,
                Err(StoreError::DuplicateCustomerId(id)) => return Err(IssueError::Conflict(id)),
                Err(e) => return Err(e.into()),
            }
        }
        None => insert_with_issued_id(store, new, retries).await?,
    };

    info!(
        customer_id = %stored.customer_id,
        id = %stored.id,
        service_type = stored.service_type.as_str(),
        "Site visit created"
    );

    let row = SheetRow::from(&stored);
    if let Err(e) = exporter.append(&row).await {
        warn!(
            error = %e,
            exporter = exporter.name(),
            customer_id = %stored.customer_id,
            "Failed to export site visit to sheet"
        );
    }

    Ok(stored)
}

/// Upper bound on stepping past stored IDs while the log's last entry stays
/// put, for a log whose last record sits behind IDs issued earlier.
const MAX_SKIPS: u32 = 10_000;

async fn insert_with_issued_id(
    store: &dyn VisitStore,
    new: NewSiteVisit,
    retries: u32,
) -> Result<SiteVisit, IssueError> {
    let mut last = store.last_customer_id().await?;
    let mut candidate = successor(last);
    let mut attempts: u32 = 0;
    let mut races: u32 = 0;
    let mut skips: u32 = 0;

    loop {
        attempts += 1;
        let visit = new.clone().into_site_visit(candidate, Utc::now());
        let taken = match store.insert(visit).await {
            Ok(visit) => return Ok(visit),
            Err(StoreError::DuplicateCustomerId(id)) => id,
            Err(e) => return Err(e.into()),
        };

        let current = store.last_customer_id().await?;
        if current == last {
            // No concurrent writer; the ID was stored before the last record.
            skips += 1;
            if skips > MAX_SKIPS {
                return Err(IssueError::Exhausted { attempts });
            }
            debug!(customer_id = %taken, "Customer ID already stored; skipping ahead");
            candidate = successor(Some(taken));
        } else {
            races += 1;
            if races > retries {
                return Err(IssueError::Exhausted { attempts });
            }
            warn!(
                customer_id = %taken,
                attempt = attempts,
                "Issued customer ID taken by a concurrent writer; retrying"
            );
            last = current;
            candidate = successor(last);
        }
    }
}

fn successor(previous: Option<CustomerId>) -> CustomerId {
    let Some(prev) = previous else {
        return CustomerId::FIRST;
    };
    let (next, rollover) = prev.next_with_rollover();
    if rollover == Rollover::Wrapped {
        warn!(
            previous = %prev,
            customer_id = %next,
            "Customer ID space exhausted; sequence wrapped to the start"
        );
    }
    next
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use super::*;
    use crate::export::{DisabledExporter, ExportError};
    use crate::model::ServiceType;
    use crate::store::MemoryVisitStore;

    fn new_visit(customer_id: Option<&str>) -> NewSiteVisit {
        NewSiteVisit {
            customer_id: customer_id.map(str::to_string),
            customer_name: "Ruwan".to_string(),
            date_received: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            phone_number: "0759876543".to_string(),
            has_whatsapp: false,
            has_whatsapp_number: false,
            whatsapp_number: None,
            district: "Galle".to_string(),
            city: "Hikkaduwa".to_string(),
            address: None,
            latitude: None,
            longitude: None,
            has_removals: false,
            removal_charge: None,
            has_additional_labour: false,
            additional_labour_charge: None,
            service_type: ServiceType::Roof,
            status: "Pending".to_string(),
            quotation_number: None,
            details: None,
        }
    }

    /// Counts rows and optionally fails every append.
    #[derive(Default)]
    struct RecordingExporter {
        rows: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl SheetExporter for RecordingExporter {
        async fn append(&self, _row: &SheetRow) -> Result<(), ExportError> {
            self.rows.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(ExportError::Status { status: 500 })
            } else {
                Ok(())
            }
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    /// Reports a stale last ID a fixed number of times, simulating a
    /// concurrent writer that got there first.
    struct StaleReadStore {
        inner: MemoryVisitStore,
        stale: CustomerId,
        stale_reads: AtomicUsize,
    }

    #[async_trait]
    impl VisitStore for StaleReadStore {
        async fn last_customer_id(&self) -> Result<Option<CustomerId>, StoreError> {
            let remaining = self.stale_reads.load(Ordering::SeqCst);
            if remaining > 0 {
                self.stale_reads.store(remaining - 1, Ordering::SeqCst);
                return Ok(Some(self.stale));
            }
            self.inner.last_customer_id().await
        }

        async fn insert(&self, visit: SiteVisit) -> Result<SiteVisit, StoreError> {
            self.inner.insert(visit).await
        }

        async fn list(&self, limit: usize) -> Result<Vec<SiteVisit>, StoreError> {
            self.inner.list(limit).await
        }

        async fn health_check(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    /// Every insert loses to a writer that has just moved the log forward.
    #[derive(Default)]
    struct ContendedStore {
        inserts: AtomicUsize,
    }

    #[async_trait]
    impl VisitStore for ContendedStore {
        async fn last_customer_id(&self) -> Result<Option<CustomerId>, StoreError> {
            let mut id = CustomerId::FIRST;
            for _ in 0..self.inserts.load(Ordering::SeqCst) {
                id = id.next();
            }
            Ok(Some(id))
        }

        async fn insert(&self, visit: SiteVisit) -> Result<SiteVisit, StoreError> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::DuplicateCustomerId(visit.customer_id))
        }

        async fn list(&self, _limit: usize) -> Result<Vec<SiteVisit>, StoreError> {
            Ok(Vec::new())
        }

        async fn health_check(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_preview_on_empty_store() {
        let store = MemoryVisitStore::new();
        let preview = preview_next(&store).await.unwrap();
        assert_eq!(preview.previous, None);
        assert_eq!(preview.next, CustomerId::FIRST);
    }

    #[tokio::test]
    async fn test_preview_does_not_reserve() {
        let store = MemoryVisitStore::new();
        let first = preview_next(&store).await.unwrap();
        let second = preview_next(&store).await.unwrap();
        assert_eq!(first, second);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_issues_sequential_ids() {
        let store = MemoryVisitStore::new();
        let exporter = RecordingExporter::default();

        let a = create_visit(&store, &exporter, new_visit(None), 0).await.unwrap();
        let b = create_visit(&store, &exporter, new_visit(None), 0).await.unwrap();

        assert_eq!(a.customer_id.to_string(), "A-000a01");
        assert_eq!(b.customer_id.to_string(), "A-000a02");
        assert_eq!(exporter.rows.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_supplied_id_continues_sequence() {
        let store = MemoryVisitStore::new();
        create_visit(&store, &DisabledExporter, new_visit(Some("A-000z99")), 0)
            .await
            .unwrap();
        let next = create_visit(&store, &DisabledExporter, new_visit(None), 0)
            .await
            .unwrap();
        assert_eq!(next.customer_id.to_string(), "A-001a01");
    }

    #[tokio::test]
    async fn test_supplied_duplicate_is_conflict() {
        let store = MemoryVisitStore::new();
        create_visit(&store, &DisabledExporter, new_visit(Some("B-000a01")), 3)
            .await
            .unwrap();
        let err = create_visit(&store, &DisabledExporter, new_visit(Some("B-000a01")), 3)
            .await
            .unwrap_err();
        assert!(matches!(err, IssueError::Conflict(id) if id.to_string() == "B-000a01"));
    }

    #[tokio::test]
    async fn test_invalid_visit_is_rejected_before_store() {
        let store = MemoryVisitStore::new();
        let mut visit = new_visit(Some("AB-12a3"));
        visit.city = String::new();

        let err = create_visit(&store, &DisabledExporter, visit, 0)
            .await
            .unwrap_err();
        let IssueError::Invalid(violations) = err else {
            panic!("expected validation error");
        };
        assert_eq!(violations.len(), 2);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_export_failure_does_not_fail_intake() {
        let store = MemoryVisitStore::new();
        let exporter = RecordingExporter {
            fail: true,
            ..Default::default()
        };
        let visit = create_visit(&store, &exporter, new_visit(None), 0).await.unwrap();
        assert_eq!(visit.customer_id, CustomerId::FIRST);
        assert_eq!(exporter.rows.load(Ordering::SeqCst), 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_retries_after_losing_race() {
        let inner = MemoryVisitStore::new();
        inner
            .insert(new_visit(None).into_site_visit(CustomerId::FIRST, Utc::now()))
            .await
            .unwrap();
        inner
            .insert(new_visit(None).into_site_visit(CustomerId::FIRST.next(), Utc::now()))
            .await
            .unwrap();

        // The first read still sees A-000a01, so A-000a02 collides once.
        let store = StaleReadStore {
            inner,
            stale: CustomerId::FIRST,
            stale_reads: AtomicUsize::new(1),
        };

        let visit = create_visit(&store, &DisabledExporter, new_visit(None), 1)
            .await
            .unwrap();
        assert_eq!(visit.customer_id.to_string(), "A-000a03");
    }

    #[tokio::test]
    async fn test_gives_up_after_retries() {
        let store = ContendedStore::default();
        let err = create_visit(&store, &DisabledExporter, new_visit(None), 2)
            .await
            .unwrap_err();
        assert!(matches!(err, IssueError::Exhausted { attempts: 3 }));
        assert_eq!(store.inserts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_skips_ids_stored_after_a_backwards_record() {
        let store = MemoryVisitStore::new();
        for _ in 0..2 {
            create_visit(&store, &DisabledExporter, new_visit(None), 0)
                .await
                .unwrap();
        }
        // Valid but behind the sequence: its successor A-000a01 is taken.
        create_visit(&store, &DisabledExporter, new_visit(Some("A-000a00")), 0)
            .await
            .unwrap();

        let mut issued = Vec::new();
        for _ in 0..3 {
            let visit = create_visit(&store, &DisabledExporter, new_visit(None), 0)
                .await
                .unwrap();
            issued.push(visit.customer_id.to_string());
        }
        assert_eq!(issued, vec!["A-000a03", "A-000a04", "A-000a05"]);
        assert_eq!(store.len().await, 6);
    }

    #[tokio::test]
    async fn test_concurrent_writers_get_unique_ids() {
        let store = Arc::new(MemoryVisitStore::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                create_visit(store.as_ref(), &DisabledExporter, new_visit(None), 32).await
            }));
        }

        let mut ids = std::collections::HashSet::new();
        for handle in handles {
            let visit = handle.await.unwrap().unwrap();
            assert!(ids.insert(visit.customer_id));
        }
        assert_eq!(ids.len(), 16);
    }
}
