//! Site-visit record storage.
//!
//! The store is the authority on two things the sequencer cannot guarantee
//! on its own: which customer ID was issued last, and that no customer ID is
//! stored twice.

mod memory;
mod postgres;

pub use memory::MemoryVisitStore;
pub use postgres::PgVisitStore;

use async_trait::async_trait;
use sitevisit_id::{CustomerId, IdError};
use thiserror::Error;

use crate::db::DbError;
use crate::model::SiteVisit;

/// Errors from record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record with this customer ID already exists.
    #[error("customer ID {0} is already in use")]
    DuplicateCustomerId(CustomerId),

    /// A stored customer ID no longer parses.
    #[error("stored customer ID '{value}' is malformed: {source}")]
    CorruptCustomerId {
        value: String,
        #[source]
        source: IdError,
    },

    /// A stored row could not be decoded.
    #[error("corrupt stored record: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Db(#[from] DbError),
}

/// Append-only log of site visits, ordered by insertion.
#[async_trait]
pub trait VisitStore: Send + Sync {
    /// Customer ID of the most recently inserted record, if any.
    async fn last_customer_id(&self) -> Result<Option<CustomerId>, StoreError>;

    /// Appends a record.
    ///
    /// Returns [`StoreError::DuplicateCustomerId`] when the customer ID is
    /// already present.
    async fn insert(&self, visit: SiteVisit) -> Result<SiteVisit, StoreError>;

    /// Most recent records first.
    async fn list(&self, limit: usize) -> Result<Vec<SiteVisit>, StoreError>;

    /// Checks the backing storage is reachable.
    async fn health_check(&self) -> Result<(), StoreError>;
}

pub(crate) fn parse_stored_id(value: String) -> Result<CustomerId, StoreError> {
    CustomerId::parse(&value).map_err(|source| StoreError::CorruptCustomerId { value, source })
}
