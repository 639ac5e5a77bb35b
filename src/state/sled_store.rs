use crate::error::{AppError, Result};
use crate::models::{Incident, Status};
use crate::state::{IncidentFilter, IncidentPage, IncidentStore, ScanAccumulator};
use async_trait::async_trait;
use chrono::Utc;
use sled::Db;
use std::path::Path;
use std::sync::Arc;

/// Persistent incident store using the Sled embedded database.
///
/// Rows are keyed by incident id, so the natural tree order is the
/// scan order pagination cursors resume from.
#[derive(Clone)]
pub struct SledStore {
    db: Arc<Db>,
    incidents: sled::Tree,
}

impl SledStore {
    /// Open (or create) a Sled store at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(&path)
            .map_err(|e| AppError::Database(format!("Failed to open Sled database: {}", e)))?;

        let incidents = db
            .open_tree("incidents")
            .map_err(|e| AppError::Database(format!("Failed to open incidents tree: {}", e)))?;

        tracing::info!(path = ?path.as_ref(), "Initialized Sled store");

        Ok(Self {
            db: Arc::new(db),
            incidents,
        })
    }

    fn serialize(incident: &Incident) -> Result<Vec<u8>> {
        bincode::serialize(incident)
            .map_err(|e| AppError::Serialization(format!("Failed to serialize incident: {}", e)))
    }

    fn deserialize(bytes: &[u8]) -> Result<Incident> {
        bincode::deserialize(bytes)
            .map_err(|e| AppError::Serialization(format!("Failed to deserialize incident: {}", e)))
    }

    fn put(&self, incident: &Incident) -> Result<()> {
        let value = Self::serialize(incident)?;
        self.incidents
            .insert(incident.id.as_bytes(), value)
            .map_err(|e| AppError::Database(format!("Failed to write incident: {}", e)))?;
        self.incidents
            .flush()
            .map_err(|e| AppError::Database(format!("Failed to flush incidents tree: {}", e)))?;
        Ok(())
    }

    /// Flush pending writes to disk
    pub async fn flush(&self) -> Result<()> {
        self.db
            .flush_async()
            .await
            .map_err(|e| AppError::Database(format!("Failed to flush database: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl IncidentStore for SledStore {
    async fn create(&self, incident: &Incident) -> Result<()> {
        self.put(incident)?;
        tracing::debug!(incident_id = %incident.id, "Incident saved to Sled");
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Incident>> {
        match self.incidents.get(id.as_bytes()) {
            Ok(Some(bytes)) => Ok(Some(Self::deserialize(&bytes)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(AppError::Database(format!("Failed to get incident: {}", e))),
        }
    }

    async fn update_status(&self, id: &str, status: Option<Status>) -> Result<Incident> {
        let mut incident = self
            .get(id)
            .await?
            .ok_or_else(|| AppError::not_found("Incident", id))?;

        if let Some(status) = status {
            incident.status = status;
        }
        incident.updated_at = Utc::now();

        self.put(&incident)?;
        tracing::debug!(incident_id = %id, "Incident updated in Sled");
        Ok(incident)
    }

    async fn list(
        &self,
        filter: &IncidentFilter,
        limit: usize,
        cursor: Option<&str>,
    ) -> Result<IncidentPage> {
        let mut scan = ScanAccumulator::new(filter, limit, cursor);

        for row in self.incidents.iter() {
            let (key, value) =
                row.map_err(|e| AppError::Database(format!("Failed to scan incidents: {}", e)))?;
            let id = String::from_utf8_lossy(&key).into_owned();
            scan.push(&id, Self::deserialize(&value)?);
        }

        Ok(scan.finish())
    }
}
