pub mod cursor;
pub mod factory;
pub mod sled_store;
pub mod store;

pub use cursor::Cursor;
pub use factory::{create_in_memory_store, create_store};
pub use sled_store::SledStore;
pub use store::InMemoryStore;

use crate::error::Result;
use crate::models::{ErpModule, Incident, Severity, Status};
use async_trait::async_trait;

/// Trait for incident storage operations
#[async_trait]
pub trait IncidentStore: Send + Sync {
    /// Persist a freshly created incident
    async fn create(&self, incident: &Incident) -> Result<()>;

    /// Get an incident by id
    async fn get(&self, id: &str) -> Result<Option<Incident>>;

    /// Apply a status update; `updated_at` is always refreshed. Fails
    /// with NotFound when the id is absent. Write-once fields are
    /// never touched.
    async fn update_status(&self, id: &str, status: Option<Status>) -> Result<Incident>;

    /// List incidents matching the filter, paginated by opaque cursor
    async fn list(
        &self,
        filter: &IncidentFilter,
        limit: usize,
        cursor: Option<&str>,
    ) -> Result<IncidentPage>;
}

/// Equality filters for querying incidents, AND-combined
#[derive(Debug, Clone, Default)]
pub struct IncidentFilter {
    pub status: Option<Status>,
    pub severity: Option<Severity>,
    pub module: Option<ErpModule>,
}

impl IncidentFilter {
    pub fn matches(&self, incident: &Incident) -> bool {
        self.status.map_or(true, |s| incident.status == s)
            && self.severity.map_or(true, |s| incident.severity == s)
            && self.module.map_or(true, |m| incident.erp_module == m)
    }
}

/// One page of a filtered scan
#[derive(Debug, Clone)]
pub struct IncidentPage {
    /// Page contents, sorted by `created_at` descending
    pub items: Vec<Incident>,
    /// Count of every row matching the filter at scan time
    pub total: u64,
    /// Token resuming the scan after the last returned row
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

/// Shared single-traversal pagination: walk rows in key order, count
/// every filter match for `total`, and collect the page window of rows
/// past the cursor position. Detecting one match beyond the window is
/// what sets `has_more`, so no second scan is needed.
pub(crate) struct ScanAccumulator<'a> {
    filter: &'a IncidentFilter,
    resume_after: Option<String>,
    limit: usize,
    total: u64,
    page: Vec<Incident>,
    last_key: Option<String>,
    overflow: bool,
}

impl<'a> ScanAccumulator<'a> {
    pub(crate) fn new(filter: &'a IncidentFilter, limit: usize, cursor: Option<&str>) -> Self {
        // Forgiving decode: a bad token restarts the scan
        let resume_after = cursor
            .and_then(Cursor::decode)
            .map(|cursor| cursor.last_key);

        Self {
            filter,
            resume_after,
            limit,
            total: 0,
            page: Vec::new(),
            last_key: None,
            overflow: false,
        }
    }

    /// Feed one row, in ascending key order
    pub(crate) fn push(&mut self, key: &str, incident: Incident) {
        if !self.filter.matches(&incident) {
            return;
        }
        self.total += 1;

        let past_cursor = self
            .resume_after
            .as_deref()
            .map_or(true, |resume| key > resume);
        if !past_cursor {
            return;
        }

        if self.page.len() < self.limit {
            self.last_key = Some(key.to_string());
            self.page.push(incident);
        } else {
            self.overflow = true;
        }
    }

    pub(crate) fn finish(self) -> IncidentPage {
        let mut items = self.page;
        // No creation-time index in the store; order the page after the
        // fetch, newest first
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let next_cursor = if self.overflow {
            self.last_key.map(|key| Cursor::new(key).encode())
        } else {
            None
        };

        IncidentPage {
            items,
            total: self.total,
            has_more: self.overflow,
            next_cursor,
        }
    }
}
