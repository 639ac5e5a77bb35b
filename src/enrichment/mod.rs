//! Incident classification
//!
//! The primary path asks a chat-completion API to triage the incident;
//! a deterministic keyword fallback covers every failure mode. By
//! contract, enrichment never fails: classification must never block
//! incident creation.

pub mod fallback;
pub mod openai;

pub use openai::OpenAiClient;

use crate::config::EnrichmentConfig;
use crate::models::{Category, CreateIncidentInput, EnrichmentSource, Severity};
use tracing::{info, warn};

/// Result of classifying an incident
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentResult {
    pub severity: Severity,
    pub category: Category,
    pub summary: String,
    pub suggested_action: String,
    pub source: EnrichmentSource,
}

/// Facade over the AI path and the rule-based fallback
pub struct EnrichmentService {
    client: Option<OpenAiClient>,
}

impl EnrichmentService {
    /// Build from configuration, resolving the API key from the
    /// configured environment variable. Without a usable key the AI
    /// path is disabled and every request takes the fallback.
    pub fn from_config(config: &EnrichmentConfig) -> Self {
        let api_key = std::env::var(&config.api_key_env).ok().filter(|key| {
            !key.trim().is_empty() && key != "sk-your-openai-api-key-here"
        });

        let client = match api_key {
            Some(key) => match OpenAiClient::from_config(config, key) {
                Ok(client) => {
                    info!(model = %config.model, "AI enrichment enabled");
                    Some(client)
                }
                Err(e) => {
                    warn!(error = %e, "Failed to build completion client, using fallback enrichment");
                    None
                }
            },
            None => {
                warn!(
                    env_var = %config.api_key_env,
                    "Completion API key not configured, using fallback enrichment"
                );
                None
            }
        };

        Self { client }
    }

    /// Fallback-only service (no AI client)
    pub fn fallback_only() -> Self {
        Self { client: None }
    }

    /// Service backed by a specific completion client
    pub fn with_client(client: OpenAiClient) -> Self {
        Self {
            client: Some(client),
        }
    }

    /// Classify an incident. Infallible: any AI-path failure degrades
    /// to the deterministic fallback.
    pub async fn enrich(&self, input: &CreateIncidentInput) -> EnrichmentResult {
        if let Some(client) = &self.client {
            match client.classify(input).await {
                Ok(result) => return result,
                Err(e) => {
                    warn!(error = %e, "AI enrichment failed, using fallback");
                }
            }
        }

        fallback::enrich(input)
    }
}
