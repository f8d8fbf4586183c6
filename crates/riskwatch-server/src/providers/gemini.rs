//! Risk analysis and advice via the Gemini `generateContent` REST API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use riskwatch_core::{EnvironmentData, RiskAssessment};

use crate::collaborators::{AdviceGenerator, CollaboratorError, RiskAnalyzer};
use crate::config::GeminiConfig;

/// Public Gemini API base URL.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Client for one Gemini model. Serves both model-backed steps.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl GeminiClient {
    /// Create a client from configuration.
    pub fn new(http: reqwest::Client, config: &GeminiConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }

    /// Send a single-turn prompt and return the reply text.
    async fn generate(&self, prompt: String) -> Result<String, CollaboratorError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        };

        debug!(model = %self.model, "Calling Gemini");
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CollaboratorError::Status {
                service: "Gemini",
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let reply: GenerateResponse = response.json().await?;
        reply.text().ok_or_else(|| {
            CollaboratorError::MalformedResponse("Gemini returned no candidates".to_string())
        })
    }
}

#[async_trait]
impl RiskAnalyzer for GeminiClient {
    async fn analyze(
        &self,
        location: &str,
        data: &EnvironmentData,
        allergies: &[String],
    ) -> Result<RiskAssessment, CollaboratorError> {
        let reply = self.generate(analysis_prompt(location, data, allergies)).await?;
        let assessment = parse_assessment(&reply)?;
        info!(
            risk_level = %assessment.risk_level,
            safe_duration = assessment.safe_duration,
            "Risk analysis complete"
        );
        Ok(assessment)
    }
}

#[async_trait]
impl AdviceGenerator for GeminiClient {
    async fn advise(
        &self,
        location: &str,
        risk: &RiskAssessment,
    ) -> Result<String, CollaboratorError> {
        let reply = self.generate(advice_prompt(location, risk)).await?;
        let advice = reply.trim();
        if advice.is_empty() {
            return Err(CollaboratorError::MalformedResponse(
                "Gemini returned empty advice".to_string(),
            ));
        }
        Ok(advice.to_string())
    }
}

fn analysis_prompt(location: &str, data: &EnvironmentData, allergies: &[String]) -> String {
    format!(
        r#"ACT AS AN EXPERT IMMUNOLOGIST.

[LIVE SENSOR DATA for {location}]
- US AQI: {aqi} (Threshold >100 is Unhealthy)
- PM2.5 Concentration: {pm2_5} µg/m³
- PM10 Concentration: {pm10} µg/m³
- Grass Pollen Level: {grass} grains/m³
- Tree Pollen Level: {tree} grains/m³
- Weed Pollen Level: {weed} grains/m³

[USER PATIENT PROFILE]
- Allergies: {allergies}

[TASK]
1. Determine the Risk Level (Low, Moderate, High, Severe).
2. Calculate a Max Safe Duration (in minutes) for outdoor exposure.
3. Explain the reasoning (e.g., "High PM2.5 aggravates Asthma").

Return ONLY valid JSON:
{{
    "risk_level": "low|moderate|high|severe",
    "safe_duration": <number>,
    "reasoning": "<short explanation>"
}}"#,
        aqi = data.aqi,
        pm2_5 = data.pm2_5,
        pm10 = data.pm10,
        grass = data.pollen_count.grass,
        tree = data.pollen_count.tree,
        weed = data.pollen_count.weed,
        allergies = allergies.join(", "),
    )
}

fn advice_prompt(location: &str, risk: &RiskAssessment) -> String {
    format!(
        "You are a friendly health assistant.\n\
         The user is in {location}.\n\
         Risk Level: {level}\n\
         Safe Stay: {minutes} mins.\n\
         Reason: {reason}\n\n\
         Write a short, helpful SMS-style alert (max 2 sentences) telling them if they \
         should go out and what protection to wear.",
        level = risk.risk_level,
        minutes = risk.safe_duration,
        reason = risk.reasoning,
    )
}

/// Strip a Markdown code fence from a model reply, if present.
fn extract_json_block(reply: &str) -> &str {
    let body = if let Some((_, rest)) = reply.split_once("```json") {
        rest
    } else if let Some((_, rest)) = reply.split_once("```") {
        rest
    } else {
        return reply.trim();
    };

    match body.split_once("```") {
        Some((inner, _)) => inner.trim(),
        None => body.trim(),
    }
}

fn parse_assessment(reply: &str) -> Result<RiskAssessment, CollaboratorError> {
    let json = extract_json_block(reply);
    serde_json::from_str(json).map_err(|e| {
        CollaboratorError::MalformedResponse(format!("risk assessment is not valid JSON: {}", e))
    })
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts.iter().map(|p| p.text.as_str()).collect();
        Some(text)
    }
}
