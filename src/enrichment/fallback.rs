use crate::enrichment::EnrichmentResult;
use crate::models::{Category, CreateIncidentInput, EnrichmentSource, Environment, Severity};
use once_cell::sync::Lazy;
use regex::Regex;

/// Keyword rules evaluated first-match-wins. Rule order is load-bearing:
/// the urgent class must be checked before the error class so that text
/// containing both yields P1.
static SEVERITY_RULES: Lazy<Vec<(Regex, Severity)>> = Lazy::new(|| {
    vec![
        (
            pattern("urgent|critical|down|blocked|emergency|outage|production.*down|system.*down"),
            Severity::P1,
        ),
        (pattern("error|failed|failing|issue|problem|broken"), Severity::P2),
        (pattern("minor|low|question|inquiry|enhancement"), Severity::P3),
    ]
});

static CATEGORY_RULES: Lazy<Vec<(Regex, Category)>> = Lazy::new(|| {
    vec![
        (
            pattern("config|setting|parameter|setup|enable|disable"),
            Category::ConfigurationIssue,
        ),
        (
            pattern("data|record|duplicate|missing|incorrect|invalid"),
            Category::DataIssue,
        ),
        (
            pattern("integrat|api|connect|sync|interface|feed"),
            Category::IntegrationFailure,
        ),
        (
            pattern("access|permission|login|auth|role|security|password"),
            Category::SecurityAccess,
        ),
    ]
});

fn pattern(p: &str) -> Regex {
    Regex::new(p).expect("keyword pattern is valid")
}

const GENERIC_ACTION: &str =
    "Review incident details and assign to appropriate team for investigation.";

/// Maximum summary length before truncation
const SUMMARY_MAX_CHARS: usize = 100;

/// Rule-based enrichment used when the completion API is unavailable
/// or returns an unusable response. Fully deterministic.
pub fn enrich(input: &CreateIncidentInput) -> EnrichmentResult {
    let text = format!("{} {}", input.title, input.description).to_lowercase();

    // Test-environment incidents are never production-blocking; this
    // overrides the keyword rules entirely.
    let severity = if input.environment == Environment::Test {
        Severity::P3
    } else {
        SEVERITY_RULES
            .iter()
            .find(|(re, _)| re.is_match(&text))
            .map(|(_, sev)| *sev)
            .unwrap_or(Severity::P2)
    };

    let category = CATEGORY_RULES
        .iter()
        .find(|(re, _)| re.is_match(&text))
        .map(|(_, cat)| *cat)
        .unwrap_or(Category::Unknown);

    EnrichmentResult {
        severity,
        category,
        summary: summarize(&input.description),
        suggested_action: GENERIC_ACTION.to_string(),
        source: EnrichmentSource::Fallback,
    }
}

/// Truncate the description to 100 characters, marking longer text with
/// an ellipsis. Truncation is on a char boundary.
fn summarize(description: &str) -> String {
    if description.chars().count() <= SUMMARY_MAX_CHARS {
        description.to_string()
    } else {
        let truncated: String = description.chars().take(SUMMARY_MAX_CHARS).collect();
        format!("{truncated}...")
    }
}
