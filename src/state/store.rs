use crate::error::{AppError, Result};
use crate::models::{Incident, Status};
use crate::state::{IncidentFilter, IncidentPage, IncidentStore, ScanAccumulator};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;

/// In-memory incident store (for development and testing)
#[derive(Clone)]
pub struct InMemoryStore {
    incidents: Arc<DashMap<String, Incident>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            incidents: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IncidentStore for InMemoryStore {
    async fn create(&self, incident: &Incident) -> Result<()> {
        self.incidents
            .insert(incident.id.clone(), incident.clone());
        tracing::debug!(incident_id = %incident.id, "Incident saved");
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Incident>> {
        Ok(self.incidents.get(id).map(|entry| entry.clone()))
    }

    async fn update_status(&self, id: &str, status: Option<Status>) -> Result<Incident> {
        let mut entry = self
            .incidents
            .get_mut(id)
            .ok_or_else(|| AppError::not_found("Incident", id))?;

        if let Some(status) = status {
            entry.status = status;
        }
        entry.updated_at = Utc::now();

        tracing::debug!(incident_id = %id, "Incident updated");
        Ok(entry.clone())
    }

    async fn list(
        &self,
        filter: &IncidentFilter,
        limit: usize,
        cursor: Option<&str>,
    ) -> Result<IncidentPage> {
        // DashMap iteration order is arbitrary; scan in id order so
        // cursors stay stable across calls
        let mut keys: Vec<String> = self.incidents.iter().map(|e| e.key().clone()).collect();
        keys.sort();

        let mut scan = ScanAccumulator::new(filter, limit, cursor);
        for key in keys {
            if let Some(entry) = self.incidents.get(&key) {
                scan.push(&key, entry.clone());
            }
        }

        Ok(scan.finish())
    }
}
