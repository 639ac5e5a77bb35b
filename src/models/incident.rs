use crate::enrichment::EnrichmentResult;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Id alphabet: uppercase letters and digits minus the visually
/// ambiguous ones (0/O, 1/I/L)
const ID_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Generate a human-readable incident id, format `INC-XXXXXX`
pub fn generate_incident_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("INC-{suffix}")
}

/// Oracle ERP module the incident was reported against
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display,
)]
pub enum ErpModule {
    AP,
    AR,
    GL,
    Inventory,
    HR,
    Payroll,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display,
)]
pub enum Environment {
    Prod,
    Test,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display,
)]
pub enum BusinessUnit {
    Finance,
    Operations,
    #[serde(rename = "Human Resources")]
    #[strum(serialize = "Human Resources")]
    HumanResources,
    #[serde(rename = "Information Technology")]
    #[strum(serialize = "Information Technology")]
    InformationTechnology,
    Sales,
    #[serde(rename = "Supply Chain")]
    #[strum(serialize = "Supply Chain")]
    SupplyChain,
}

/// Workflow status; any value is settable from any other
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display,
)]
pub enum Status {
    Open,
    #[serde(rename = "In Progress")]
    #[strum(serialize = "In Progress")]
    InProgress,
    Resolved,
    Closed,
}

/// Severity levels for incident prioritization
///
/// P1 - production-blocking, immediate attention required
/// P2 - major impact, needs attention soon
/// P3 - minor issue, can be scheduled
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display,
)]
pub enum Severity {
    P1,
    P2,
    P3,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display,
)]
pub enum Category {
    #[serde(rename = "Configuration Issue")]
    #[strum(serialize = "Configuration Issue")]
    ConfigurationIssue,
    #[serde(rename = "Data Issue")]
    #[strum(serialize = "Data Issue")]
    DataIssue,
    #[serde(rename = "Integration Failure")]
    #[strum(serialize = "Integration Failure")]
    IntegrationFailure,
    #[serde(rename = "Security/Access")]
    #[strum(serialize = "Security/Access")]
    SecurityAccess,
    Unknown,
}

/// Which classification path produced the enrichment fields
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EnrichmentSource {
    Ai,
    Fallback,
}

/// Validated input for creating a new incident (before enrichment)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIncidentInput {
    pub title: String,
    pub description: String,
    pub erp_module: ErpModule,
    pub environment: Environment,
    pub business_unit: BusinessUnit,
}

/// Represents an incident in the system
///
/// `severity`, `category`, `summary`, `suggested_action` and
/// `enrichment_source` are set once at creation and never mutated;
/// updates only touch `status` and `updated_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    /// Unique identifier, format `INC-XXXXXX`
    pub id: String,

    pub title: String,
    pub description: String,
    pub erp_module: ErpModule,
    pub environment: Environment,
    pub business_unit: BusinessUnit,

    /// Current workflow status
    pub status: Status,

    // Enrichment fields (write-once)
    pub severity: Severity,
    pub category: Category,
    pub summary: String,
    pub suggested_action: String,
    pub enrichment_source: EnrichmentSource,

    /// Creation timestamp; never changes
    pub created_at: DateTime<Utc>,

    /// Refreshed on every mutation
    pub updated_at: DateTime<Utc>,
}

impl Incident {
    /// Create a new incident from validated input and an enrichment result
    pub fn new(input: CreateIncidentInput, enrichment: EnrichmentResult) -> Self {
        let now = Utc::now();

        Self {
            id: generate_incident_id(),
            title: input.title,
            description: input.description,
            erp_module: input.erp_module,
            environment: input.environment,
            business_unit: input.business_unit,
            status: Status::Open,
            severity: enrichment.severity,
            category: enrichment.category,
            summary: enrichment.summary,
            suggested_action: enrichment.suggested_action,
            enrichment_source: enrichment.source,
            created_at: now,
            updated_at: now,
        }
    }
}
