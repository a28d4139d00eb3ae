//! Natural-language interpretation of a finished report.
//!
//! The summary is an optional extra: any failure is logged and replaced by a
//! placeholder, the report itself is always delivered.

use crate::error::SummaryError;
use crate::types::{AiSummary, AnalysisPayload};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, instrument, warn};
use ureq::Agent;

const MAX_ITEMS: usize = 5;
const UNAVAILABLE_HEADLINE: &str = "Automated interpretation unavailable";

pub trait SummaryGenerator {
    fn summarize(&self, report: &AnalysisPayload) -> Result<AiSummary, SummaryError>;
}

/// Attach a summary to the report, degrading to a placeholder on failure.
pub fn attach_summary(report: &mut AnalysisPayload, generator: &dyn SummaryGenerator) {
    let summary = match generator.summarize(report) {
        Ok(summary) => summary,
        Err(e) => {
            warn!(error = %e, "AI summary unavailable");
            AiSummary::unavailable(&e)
        }
    };
    report.ai_summary = Some(summary);
}

impl AiSummary {
    pub fn unavailable(error: &SummaryError) -> Self {
        Self {
            headline: UNAVAILABLE_HEADLINE.to_string(),
            bullets: vec!["The AI assistant could not process this report at the moment.".to_string()],
            cautions: vec![error.to_string()],
            raw: None,
        }
    }
}

/// The slice of the report sent to the model: headline figures, the
/// breakdowns, a handful of extremes and the most recent week of trend.
pub fn condense(report: &AnalysisPayload) -> Value {
    let savers = &report.economy_extremes.top_savers;
    let risks = &report.economy_extremes.top_risks;
    let trend = &report.daily_trend;
    let mut condensed = json!({
        "overview": {
            "energy_limit_kwh": report.energy_limit_kwh,
            "period_months": report.period_months,
            "total_vehicles": report.total_vehicles,
            "total_tours": report.total_tours,
            "total_mileage": report.total_mileage,
        },
        "feasibility_breakdown": report.feasibility_breakdown,
        "cost_efficiency_breakdown": report.cost_efficiency_breakdown,
        "both_yes_count": report.both_yes_count,
        "fuel_summary": report.fuel_summary,
        "top_savers": &savers[..savers.len().min(3)],
        "top_risks": &risks[..risks.len().min(3)],
        "daily_trend": &trend[trend.len().saturating_sub(7)..],
    });
    if !report.vehicles.is_empty() {
        condensed["sample"] = json!(&report.vehicles[..report.vehicles.len().min(5)]);
    }
    condensed
}

pub fn compose_prompt(data: &Value) -> String {
    format!(
        "You are a fleet electrification consultant. Analyse the provided KPI JSON and produce a \
         concise interpretation. Focus on BEV feasibility, cost efficiency, and operational risks. \
         Return valid JSON with the schema: {{\"headline\": string, \"bullets\": string[3], \
         \"cautions\": string[<=3]}}. Do not include markdown.\n\nDATA:\n{data}"
    )
}

/// Parse the model's text answer into a summary, keeping at most five
/// bullets and five cautions.
pub fn parse_summary(text: &str) -> Result<AiSummary, SummaryError> {
    let parsed: Value = serde_json::from_str(text).map_err(SummaryError::InvalidJson)?;
    let headline = parsed.get("headline").and_then(Value::as_str).ok_or(SummaryError::MissingKeys)?;
    let bullets = parsed.get("bullets").and_then(Value::as_array).ok_or(SummaryError::MissingKeys)?;
    let cautions = parsed
        .get("cautions")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    Ok(AiSummary {
        headline: headline.to_string(),
        bullets: bullets.iter().take(MAX_ITEMS).map(value_text).collect(),
        cautions: cautions.iter().take(MAX_ITEMS).map(value_text).collect(),
        raw: Some(text.to_string()),
    })
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Google Generative Language `generateContent` backend.
pub struct GeminiSummary {
    client: Agent,
    api_key: Option<String>,
    model: String,
}

impl GeminiSummary {
    pub fn new(api_key: Option<String>, model: String, timeout: Duration) -> Self {
        let client = Agent::config_builder().timeout_global(Some(timeout)).build().into();
        Self { client, api_key, model }
    }
}

impl SummaryGenerator for GeminiSummary {
    #[instrument(skip_all, fields(model = %self.model))]
    fn summarize(&self, report: &AnalysisPayload) -> Result<AiSummary, SummaryError> {
        let api_key = self.api_key.as_deref().ok_or(SummaryError::Disabled)?;
        let prompt = compose_prompt(&condense(report));
        info!("Requesting summary…");

        let response: GenerateResponse = self
            .client
            .post(format!(
                "https://generativelanguage.googleapis.com/v1beta/{}:generateContent",
                self.model
            ))
            .query("key", api_key)
            .send_json(GenerateRequest::new(prompt))?
            .body_mut()
            .read_json()?;

        if response.candidates.is_empty() {
            return Err(SummaryError::NoCandidates);
        }
        let text = response
            .candidates
            .iter()
            .flat_map(|c| c.content.parts.iter())
            .filter_map(|p| p.text.as_deref())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        let text = text.trim();
        if text.is_empty() {
            return Err(SummaryError::MissingText);
        }
        parse_summary(text)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

impl GenerateRequest {
    fn new(prompt: String) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part { text: Some(prompt) }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.2,
                top_p: 0.95,
                top_k: 40,
                max_output_tokens: 512,
            },
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    top_p: f64,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}
