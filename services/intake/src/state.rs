//! Application state shared across request handlers.

use std::sync::Arc;

use crate::export::SheetExporter;
use crate::store::VisitStore;

/// Shared application state.
///
/// The store and exporter are constructed by the caller and passed in, so
/// tests and the binary can each choose their own.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn VisitStore>,
    exporter: Arc<dyn SheetExporter>,
    issue_retries: u32,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        store: Arc<dyn VisitStore>,
        exporter: Arc<dyn SheetExporter>,
        issue_retries: u32,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                store,
                exporter,
                issue_retries,
            }),
        }
    }

    pub fn store(&self) -> &dyn VisitStore {
        self.inner.store.as_ref()
    }

    pub fn exporter(&self) -> &dyn SheetExporter {
        self.inner.exporter.as_ref()
    }

    /// Extra attempts allowed when an auto-issued customer ID collides.
    pub fn issue_retries(&self) -> u32 {
        self.inner.issue_retries
    }
}
