use crate::api::AppState;
use crate::error::{AppError, FieldError, Result};
use crate::models::{
    BusinessUnit, CreateIncidentInput, Environment, ErpModule, Incident, Severity, Status,
};
use crate::state::IncidentFilter;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::Validate;

const SERVICE_NAME: &str = "ERP Incident Triage API";

const DEFAULT_PAGE_SIZE: usize = 10;
const MAX_PAGE_SIZE: usize = 100;

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: SERVICE_NAME.to_string(),
    })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

/// Create an incident; classification runs before the write and never
/// blocks creation
pub async fn create_incident(
    State(state): State<AppState>,
    Json(request): Json<CreateIncidentRequest>,
) -> Result<(StatusCode, Json<Incident>)> {
    let input = request.into_input()?;

    let enrichment = state.enrichment.enrich(&input).await;
    let incident = Incident::new(input, enrichment);
    state.store.create(&incident).await?;

    tracing::info!(
        incident_id = %incident.id,
        severity = %incident.severity,
        category = %incident.category,
        enrichment_source = %incident.enrichment_source,
        "Incident created"
    );

    Ok((StatusCode::CREATED, Json(incident)))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateIncidentRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    #[serde(default)]
    pub title: Option<String>,
    #[validate(length(
        min = 1,
        max = 5000,
        message = "Description must be between 1 and 5000 characters"
    ))]
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub erp_module: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub business_unit: Option<String>,
}

impl CreateIncidentRequest {
    /// Validate every field, collecting all violations before failing
    pub fn into_input(self) -> Result<CreateIncidentInput> {
        let mut details = Vec::new();

        if let Err(errors) = self.validate() {
            details.extend(collect_field_errors(&errors));
        }

        let title = require(&mut details, "title", self.title, "Title is required");
        let description = require(
            &mut details,
            "description",
            self.description,
            "Description is required",
        );
        let erp_module = parse_field::<ErpModule>(
            &mut details,
            "erpModule",
            self.erp_module.as_deref(),
            "Invalid ERP module",
        );
        let environment = parse_field::<Environment>(
            &mut details,
            "environment",
            self.environment.as_deref(),
            "Invalid environment",
        );
        let business_unit = parse_field::<BusinessUnit>(
            &mut details,
            "businessUnit",
            self.business_unit.as_deref(),
            "Invalid business unit",
        );

        match (title, description, erp_module, environment, business_unit) {
            (Some(title), Some(description), Some(erp_module), Some(environment), Some(business_unit))
                if details.is_empty() =>
            {
                Ok(CreateIncidentInput {
                    title,
                    description,
                    erp_module,
                    environment,
                    business_unit,
                })
            }
            _ => Err(AppError::Validation(details)),
        }
    }
}

/// List incidents with optional filters and cursor pagination
pub async fn list_incidents(
    State(state): State<AppState>,
    Query(params): Query<ListIncidentsParams>,
) -> Result<Json<ListIncidentsResponse>> {
    let (filter, limit, cursor) = params.into_query()?;

    let page = state.store.list(&filter, limit, cursor.as_deref()).await?;

    Ok(Json(ListIncidentsResponse {
        items: page.items,
        total: page.total,
        next_cursor: page.next_cursor,
        has_more: page.has_more,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListIncidentsParams {
    pub status: Option<String>,
    pub severity: Option<String>,
    pub module: Option<String>,
    pub limit: Option<String>,
    pub cursor: Option<String>,
}

impl ListIncidentsParams {
    pub fn into_query(self) -> Result<(IncidentFilter, usize, Option<String>)> {
        let mut details = Vec::new();

        let status = parse_optional::<Status>(
            &mut details,
            "status",
            self.status.as_deref(),
            "Invalid status",
        );
        let severity = parse_optional::<Severity>(
            &mut details,
            "severity",
            self.severity.as_deref(),
            "Invalid severity",
        );
        let module = parse_optional::<ErpModule>(
            &mut details,
            "module",
            self.module.as_deref(),
            "Invalid ERP module",
        );

        let limit = match self.limit.as_deref() {
            None => DEFAULT_PAGE_SIZE,
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if (1..=MAX_PAGE_SIZE).contains(&n) => n,
                _ => {
                    details.push(FieldError::new(
                        "limit",
                        "Limit must be an integer between 1 and 100",
                    ));
                    DEFAULT_PAGE_SIZE
                }
            },
        };

        if !details.is_empty() {
            return Err(AppError::Validation(details));
        }

        // The cursor is never validated here; a malformed token is
        // treated as "no cursor" by the store
        Ok((
            IncidentFilter {
                status,
                severity,
                module,
            },
            limit,
            self.cursor,
        ))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListIncidentsResponse {
    pub items: Vec<Incident>,
    pub total: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

/// Get an incident by id
pub async fn get_incident(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Incident>> {
    let incident = state
        .store
        .get(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Incident", &id))?;

    Ok(Json(incident))
}

/// Update an incident; only `status` is editable
pub async fn update_incident(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateIncidentRequest>,
) -> Result<Json<Incident>> {
    let status = request.into_status()?;
    let incident = state.store.update_status(&id, status).await?;

    tracing::info!(incident_id = %incident.id, status = %incident.status, "Incident updated");

    Ok(Json(incident))
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateIncidentRequest {
    pub status: Option<String>,
}

impl UpdateIncidentRequest {
    pub fn into_status(self) -> Result<Option<Status>> {
        match self.status.as_deref() {
            None => Ok(None),
            Some(raw) => Status::from_str(raw).map(Some).map_err(|_| {
                AppError::Validation(vec![FieldError::new("status", "Invalid status")])
            }),
        }
    }
}

fn collect_field_errors(errors: &validator::ValidationErrors) -> Vec<FieldError> {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {field}"));
                FieldError::new(*field, message)
            })
        })
        .collect()
}

fn require(
    details: &mut Vec<FieldError>,
    field: &str,
    value: Option<String>,
    message: &str,
) -> Option<String> {
    if value.is_none() {
        details.push(FieldError::new(field, message));
    }
    value
}

fn parse_field<T: FromStr>(
    details: &mut Vec<FieldError>,
    field: &str,
    value: Option<&str>,
    message: &str,
) -> Option<T> {
    match value {
        Some(raw) => match T::from_str(raw) {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                details.push(FieldError::new(field, message));
                None
            }
        },
        None => {
            details.push(FieldError::new(field, message));
            None
        }
    }
}

fn parse_optional<T: FromStr>(
    details: &mut Vec<FieldError>,
    field: &str,
    value: Option<&str>,
    message: &str,
) -> Option<T> {
    match value {
        None => None,
        Some(raw) => match T::from_str(raw) {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                details.push(FieldError::new(field, message));
                None
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_create_request() -> CreateIncidentRequest {
        CreateIncidentRequest {
            title: Some("GL posting failure".to_string()),
            description: Some("Journal import keeps failing".to_string()),
            erp_module: Some("GL".to_string()),
            environment: Some("Prod".to_string()),
            business_unit: Some("Finance".to_string()),
        }
    }

    #[test]
    fn test_valid_create_request() {
        let input = valid_create_request().into_input().unwrap();
        assert_eq!(input.erp_module, ErpModule::GL);
        assert_eq!(input.environment, Environment::Prod);
        assert_eq!(input.business_unit, BusinessUnit::Finance);
    }

    #[test]
    fn test_invalid_module_reports_field() {
        let mut request = valid_create_request();
        request.erp_module = Some("Invalid".to_string());

        let err = request.into_input().unwrap_err();
        match err {
            AppError::Validation(details) => {
                assert_eq!(details.len(), 1);
                assert_eq!(details[0].field, "erpModule");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_all_violations_reported_together() {
        let request = CreateIncidentRequest {
            title: Some("".to_string()),
            description: None,
            erp_module: Some("Invalid".to_string()),
            environment: Some("Staging".to_string()),
            business_unit: None,
        };

        let err = request.into_input().unwrap_err();
        match err {
            AppError::Validation(details) => {
                let fields: Vec<&str> = details.iter().map(|d| d.field.as_str()).collect();
                assert!(fields.contains(&"title"));
                assert!(fields.contains(&"description"));
                assert!(fields.contains(&"erpModule"));
                assert!(fields.contains(&"environment"));
                assert!(fields.contains(&"businessUnit"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_title_too_long() {
        let mut request = valid_create_request();
        request.title = Some("x".repeat(201));

        let err = request.into_input().unwrap_err();
        match err {
            AppError::Validation(details) => {
                assert!(details.iter().any(|d| d.field == "title"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_list_params_defaults() {
        let (filter, limit, cursor) = ListIncidentsParams::default().into_query().unwrap();
        assert!(filter.status.is_none());
        assert!(filter.severity.is_none());
        assert!(filter.module.is_none());
        assert_eq!(limit, 10);
        assert!(cursor.is_none());
    }

    #[test]
    fn test_list_params_parse() {
        let params = ListIncidentsParams {
            status: Some("In Progress".to_string()),
            severity: Some("P1".to_string()),
            module: Some("AP".to_string()),
            limit: Some("25".to_string()),
            cursor: Some("opaque".to_string()),
        };

        let (filter, limit, cursor) = params.into_query().unwrap();
        assert_eq!(filter.status, Some(Status::InProgress));
        assert_eq!(filter.severity, Some(Severity::P1));
        assert_eq!(filter.module, Some(ErpModule::AP));
        assert_eq!(limit, 25);
        assert_eq!(cursor.as_deref(), Some("opaque"));
    }

    #[test]
    fn test_list_params_limit_bounds() {
        for bad in ["0", "101", "-3", "ten"] {
            let params = ListIncidentsParams {
                limit: Some(bad.to_string()),
                ..Default::default()
            };
            assert!(params.into_query().is_err(), "limit {bad} should fail");
        }
    }

    #[test]
    fn test_update_request_status() {
        let request = UpdateIncidentRequest {
            status: Some("Resolved".to_string()),
        };
        assert_eq!(request.into_status().unwrap(), Some(Status::Resolved));

        let request = UpdateIncidentRequest { status: None };
        assert_eq!(request.into_status().unwrap(), None);

        let request = UpdateIncidentRequest {
            status: Some("Reopened".to_string()),
        };
        assert!(request.into_status().is_err());
    }
}
