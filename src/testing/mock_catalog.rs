//! Mock catalog backend.

use super::lock;
use crate::catalog::{CatalogBackend, ReleaseDetail, ReleaseSummary};
use crate::error::{HentError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory catalog.
///
/// Every search returns all added releases in insertion order; release
/// lookups return the detail registered for the id, if any.
#[derive(Debug, Default)]
pub struct MockCatalog {
    releases: Mutex<Vec<ReleaseSummary>>,
    details: Mutex<HashMap<String, ReleaseDetail>>,
    queries: Mutex<Vec<String>>,
    lookups: Mutex<Vec<String>>,
    search_error: Mutex<Option<String>>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a release to search results, with an optional detail for lookups.
    pub fn add_release(&self, summary: ReleaseSummary, detail: Option<ReleaseDetail>) {
        if let Some(detail) = detail {
            lock(&self.details).insert(summary.id.clone(), detail);
        }
        lock(&self.releases).push(summary);
    }

    /// Make every search fail with this message.
    pub fn fail_searches(&self, message: &str) {
        *lock(&self.search_error) = Some(message.to_string());
    }

    /// Query strings received so far.
    pub fn recorded_queries(&self) -> Vec<String> {
        lock(&self.queries).clone()
    }

    /// Release ids looked up so far.
    pub fn recorded_lookups(&self) -> Vec<String> {
        lock(&self.lookups).clone()
    }
}

#[async_trait]
impl CatalogBackend for MockCatalog {
    async fn search_releases(&self, query: &str) -> Result<Vec<ReleaseSummary>> {
        lock(&self.queries).push(query.to_string());
        if let Some(message) = lock(&self.search_error).clone() {
            return Err(HentError::Catalog(message));
        }
        Ok(lock(&self.releases).clone())
    }

    async fn release(&self, id: &str) -> Result<Option<ReleaseDetail>> {
        lock(&self.lookups).push(id.to_string());
        Ok(lock(&self.details).get(id).cloned())
    }
}
