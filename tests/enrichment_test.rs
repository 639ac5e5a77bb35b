use erp_incident_triage::{
    enrichment::{fallback, EnrichmentService, OpenAiClient},
    models::{
        BusinessUnit, Category, CreateIncidentInput, EnrichmentSource, Environment, ErpModule,
        Severity,
    },
};
use serde_json::json;
use std::time::Duration;

fn incident_input(environment: Environment) -> CreateIncidentInput {
    CreateIncidentInput {
        title: "AP invoice sync failure".to_string(),
        description: "Supplier invoices are not syncing from the procurement feed".to_string(),
        erp_module: ErpModule::AP,
        environment,
        business_unit: BusinessUnit::Finance,
    }
}

fn test_client(server: &mockito::ServerGuard) -> OpenAiClient {
    OpenAiClient::new(
        server.url(),
        "test-key".to_string(),
        "gpt-4o-mini".to_string(),
        Duration::from_secs(5),
        500,
        0.3,
    )
    .unwrap()
}

fn completion_body(content: &str) -> String {
    json!({
        "choices": [{"message": {"content": content}}]
    })
    .to_string()
}

#[tokio::test]
async fn test_ai_path_with_valid_response() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body(
            &json!({
                "severity": "P2",
                "category": "Integration Failure",
                "summary": "Procurement invoice feed into AP has stopped.",
                "suggestedAction": "Check the integration job status and replay the feed."
            })
            .to_string(),
        ))
        .create_async()
        .await;

    let service = EnrichmentService::with_client(test_client(&server));
    let result = service.enrich(&incident_input(Environment::Prod)).await;

    mock.assert_async().await;
    assert_eq!(result.source, EnrichmentSource::Ai);
    assert_eq!(result.severity, Severity::P2);
    assert_eq!(result.category, Category::IntegrationFailure);
    assert_eq!(result.summary, "Procurement invoice feed into AP has stopped.");
}

#[tokio::test]
async fn test_unparsable_output_falls_back() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body("Sorry, I cannot help with that."))
        .create_async()
        .await;

    let service = EnrichmentService::with_client(test_client(&server));
    let result = service.enrich(&incident_input(Environment::Prod)).await;

    assert_eq!(result.source, EnrichmentSource::Fallback);
    // "sync", "feed" -> Integration Failure via keyword rules too
    assert_eq!(result.category, Category::IntegrationFailure);
}

#[tokio::test]
async fn test_open_set_severity_falls_back() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body(
            &json!({
                "severity": "P0",
                "category": "Unknown",
                "summary": "s",
                "suggestedAction": "a"
            })
            .to_string(),
        ))
        .create_async()
        .await;

    let service = EnrichmentService::with_client(test_client(&server));
    let result = service.enrich(&incident_input(Environment::Prod)).await;

    assert_eq!(result.source, EnrichmentSource::Fallback);
}

#[tokio::test]
async fn test_oversized_summary_falls_back() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body(
            &json!({
                "severity": "P2",
                "category": "Unknown",
                "summary": "x".repeat(501),
                "suggestedAction": "a"
            })
            .to_string(),
        ))
        .create_async()
        .await;

    let service = EnrichmentService::with_client(test_client(&server));
    let result = service.enrich(&incident_input(Environment::Prod)).await;

    assert_eq!(result.source, EnrichmentSource::Fallback);
}

#[tokio::test]
async fn test_server_error_falls_back() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(500)
        .with_body("upstream exploded")
        .create_async()
        .await;

    let service = EnrichmentService::with_client(test_client(&server));
    let result = service.enrich(&incident_input(Environment::Prod)).await;

    assert_eq!(result.source, EnrichmentSource::Fallback);
}

#[tokio::test]
async fn test_empty_choices_falls_back() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"choices": []}).to_string())
        .create_async()
        .await;

    let service = EnrichmentService::with_client(test_client(&server));
    let result = service.enrich(&incident_input(Environment::Prod)).await;

    assert_eq!(result.source, EnrichmentSource::Fallback);
}

// Fallback determinism, exercised through the public rule entry point

#[test]
fn test_fallback_test_environment_always_p3() {
    for description in [
        "urgent critical production down",
        "minor question",
        "plain text",
    ] {
        let mut input = incident_input(Environment::Test);
        input.description = description.to_string();
        let result = fallback::enrich(&input);
        assert_eq!(result.severity, Severity::P3, "description: {description}");
    }
}

#[test]
fn test_fallback_urgent_beats_error() {
    let mut input = incident_input(Environment::Prod);
    input.title = "critical error in GL posting".to_string();
    input.description = "posting aborted".to_string();

    let result = fallback::enrich(&input);
    assert_eq!(result.severity, Severity::P1);
}

#[test]
fn test_fallback_summary_truncation() {
    let mut input = incident_input(Environment::Prod);
    input.description = "d".repeat(250);

    let result = fallback::enrich(&input);
    assert_eq!(result.summary.chars().count(), 103);
    assert!(result.summary.ends_with("..."));

    input.description = "exactly one hundred or fewer".to_string();
    let result = fallback::enrich(&input);
    assert_eq!(result.summary, "exactly one hundred or fewer");
}
