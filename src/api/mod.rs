pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::enrichment::EnrichmentService;
use crate::state::IncidentStore;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn IncidentStore>,
    pub enrichment: Arc<EnrichmentService>,
}

impl AppState {
    pub fn new(store: Arc<dyn IncidentStore>, enrichment: Arc<EnrichmentService>) -> Self {
        Self { store, enrichment }
    }
}
