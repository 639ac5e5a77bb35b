use crate::config::EnrichmentConfig;
use crate::models::{Category, CreateIncidentInput, EnrichmentSource, Severity};
use anyhow::{anyhow, bail, Context};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::EnrichmentResult;

/// Bound on AI-produced free-text fields
const MAX_TEXT_LEN: usize = 500;

const SYSTEM_PROMPT: &str = "\
You are an ERP incident triage assistant for Oracle ERP systems. Analyze the incident and provide triage information.

Severity Guidelines:
- P1: Production system down, critical business impact, requires immediate attention
- P2: Major functionality impaired, significant business impact, needs attention soon
- P3: Minor issue, limited impact, can be scheduled for resolution

Categories:
- Configuration Issue: Settings, parameters, or setup problems
- Data Issue: Incorrect, missing, or corrupted data
- Integration Failure: Problems with external system connections
- Security/Access: Permission, authentication, or authorization problems
- Unknown: Cannot be determined from the information provided

Respond with ONLY valid JSON in this exact format:
{
  \"severity\": \"P1\" | \"P2\" | \"P3\",
  \"category\": \"Configuration Issue\" | \"Data Issue\" | \"Integration Failure\" | \"Security/Access\" | \"Unknown\",
  \"summary\": \"1-2 sentence summary of the issue\",
  \"suggestedAction\": \"Recommended next step to resolve\"
}";

/// Chat-completion client for the AI enrichment path
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat<'a>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    format_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Enrichment payload as the model is instructed to emit it. Closed-set
/// membership is enforced by the enum types during deserialization.
#[derive(Debug, Deserialize)]
struct AiEnrichment {
    severity: Severity,
    category: Category,
    summary: String,
    #[serde(rename = "suggestedAction")]
    suggested_action: String,
}

impl OpenAiClient {
    /// Construct a client from configuration and a resolved API key
    pub fn from_config(config: &EnrichmentConfig, api_key: String) -> anyhow::Result<Self> {
        Self::new(
            config.base_url.clone(),
            api_key,
            config.model.clone(),
            Duration::from_secs(config.timeout_secs),
            config.max_tokens,
            config.temperature,
        )
    }

    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        timeout: Duration,
        max_tokens: u32,
        temperature: f32,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            max_tokens,
            temperature,
        })
    }

    /// Classify an incident via the chat-completion API. No retries; any
    /// failure surfaces to the caller, which degrades to the fallback.
    pub async fn classify(&self, input: &CreateIncidentInput) -> anyhow::Result<EnrichmentResult> {
        let user_message = build_user_message(input);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_message,
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_object",
            },
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Completion request failed")?
            .error_for_status()
            .context("Completion request returned an error status")?;

        let body: ChatResponse = response
            .json()
            .await
            .context("Failed to decode completion response")?;

        let content = body
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .ok_or_else(|| anyhow!("No content in completion response"))?;

        let enrichment: AiEnrichment =
            serde_json::from_str(content).context("Completion output is not valid enrichment JSON")?;

        if enrichment.summary.chars().count() > MAX_TEXT_LEN {
            bail!("Completion summary exceeds {MAX_TEXT_LEN} characters");
        }
        if enrichment.suggested_action.chars().count() > MAX_TEXT_LEN {
            bail!("Completion suggested action exceeds {MAX_TEXT_LEN} characters");
        }

        Ok(EnrichmentResult {
            severity: enrichment.severity,
            category: enrichment.category,
            summary: enrichment.summary,
            suggested_action: enrichment.suggested_action,
            source: EnrichmentSource::Ai,
        })
    }
}

fn build_user_message(input: &CreateIncidentInput) -> String {
    format!(
        "Analyze this ERP incident:\n\n\
         Title: {}\n\
         Description: {}\n\
         ERP Module: {}\n\
         Environment: {}\n\
         Business Unit: {}",
        input.title, input.description, input.erp_module, input.environment, input.business_unit
    )
}
