//! Vision-model bill extraction.
//!
//! Sends the bill image to an OpenAI-compatible chat-completions endpoint and
//! turns the model's JSON answer into an [`ExtractionResult`]. Transport,
//! status, and shape problems are returned as errors; the pipeline decides
//! what to do with them.

use std::path::Path;
use std::time::Duration;

use base64::Engine;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::http::{self, DEFAULT_TIMEOUT};
use super::models::ExtractionResult;
use super::period::fill_period;
use crate::error::{FlowError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_TOKENS: u32 = 300;
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Characters of a bad response kept for log context.
pub const RESPONSE_PREVIEW_CHARS: usize = 200;

const BOTH_DATES_WEIGHT: f64 = 0.3;
const USAGE_WEIGHT: f64 = 0.3;
const AMOUNT_WEIGHT: f64 = 0.4;

const EXTRACTION_PROMPT: &str = "Analyze this water bill image and extract the following information:

1. Billing period start date (format: YYYY-MM-DD)
2. Billing period end date (format: YYYY-MM-DD)
3. Water usage in gallons (numeric value only, no units)
4. Total amount due in dollars (numeric value only, no $ sign)

Return ONLY valid JSON with this exact structure (no markdown, no code blocks):
{
    \"period_start\": \"YYYY-MM-DD or null\",
    \"period_end\": \"YYYY-MM-DD or null\",
    \"usage\": 1234.56 or null,
    \"amount\": 45.50 or null
}

If you cannot find a value, use null. Be precise and extract actual numbers from the bill.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Vec<ChatContent>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ChatContent {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Credentialed client for the vision endpoint.
#[derive(Debug, Clone)]
pub struct VisionClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl VisionClient {
    /// Create a client against the default endpoint and model.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: http::build_client(DEFAULT_TIMEOUT)?,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Point at a different OpenAI-compatible endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub const fn with_sampling(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    /// Model name sent with each request.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Extract bill fields from an image.
    ///
    /// # Errors
    ///
    /// Returns error when the image is unreadable, the request fails, or the
    /// answer is not a JSON object.
    pub async fn extract(&self, image: &Path, today: NaiveDate) -> Result<ExtractionResult> {
        let content = self.complete(image).await?;
        parse_vision_payload(&content, today)
    }

    /// Send one chat completion and return the model's text.
    async fn complete(&self, image: &Path) -> Result<String> {
        let bytes = tokio::fs::read(image).await.map_err(|source| FlowError::ImageRead {
            path: image.display().to_string(),
            source,
        })?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ChatContent::Text {
                        text: EXTRACTION_PROMPT.to_string(),
                    },
                    ChatContent::ImageUrl {
                        image_url: ImageUrl {
                            url: format!("data:image/jpeg;base64,{encoded}"),
                        },
                    },
                ],
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(
            url = %url,
            model = %self.model,
            image_bytes = bytes.len(),
            "Sending vision request"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| http::map_send_error(&e, self.timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| http::map_send_error(&e, self.timeout))?;

        if !status.is_success() {
            return Err(FlowError::VisionApi {
                status_code: status.as_u16(),
                message: http::preview(&body, RESPONSE_PREVIEW_CHARS),
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            FlowError::ParseResponse(format!(
                "{e}; response was: {}",
                http::preview(&body, RESPONSE_PREVIEW_CHARS)
            ))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| FlowError::ParseResponse("response contained no choices".to_string()))
    }
}

/// Remove Markdown code fences around a JSON answer.
#[must_use]
pub fn strip_code_fences(content: &str) -> String {
    content
        .replace("```json\n", "")
        .replace("```json", "")
        .replace("```\n", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Parse a date in any of the formats the model tends to emit.
///
/// Tried in order: `YYYY-MM-DD`, `MM/DD/YYYY`, `DD/MM/YYYY`, `YYYY/MM/DD`.
#[must_use]
pub fn parse_flexible_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("null") {
        return None;
    }
    ["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

/// Turn the model's answer into an extraction result.
///
/// Each field falls back on its own: a missing or unreadable boundary is
/// filled from the default period, a missing number becomes `0.0`.
///
/// # Errors
///
/// Returns [`FlowError::ParseResponse`] when the answer is not a JSON object.
pub fn parse_vision_payload(content: &str, today: NaiveDate) -> Result<ExtractionResult> {
    let cleaned = strip_code_fences(content);
    let value: Value = serde_json::from_str(&cleaned).map_err(|e| {
        FlowError::ParseResponse(format!(
            "{e}; response was: {}",
            http::preview(&cleaned, RESPONSE_PREVIEW_CHARS)
        ))
    })?;
    let Value::Object(fields) = value else {
        return Err(FlowError::ParseResponse(format!(
            "expected a JSON object; response was: {}",
            http::preview(&cleaned, RESPONSE_PREVIEW_CHARS)
        )));
    };

    let start = fields.get("period_start").and_then(date_field);
    let end = fields.get("period_end").and_then(date_field);
    let usage = fields.get("usage").and_then(number_field);
    let amount = fields.get("amount").and_then(number_field);

    let mut confidence = 0.0;
    if start.is_some() && end.is_some() {
        confidence += BOTH_DATES_WEIGHT;
    }
    if usage.is_some_and(|u| u > 0.0) {
        confidence += USAGE_WEIGHT;
    }
    if amount.is_some_and(|a| a > 0.0) {
        confidence += AMOUNT_WEIGHT;
    }

    let (period_start, period_end) = fill_period(start, end, today);
    Ok(ExtractionResult {
        period_start,
        period_end,
        usage: usage.unwrap_or(0.0),
        amount: amount.unwrap_or(0.0),
        confidence,
    })
}

fn date_field(value: &Value) -> Option<NaiveDate> {
    value.as_str().and_then(parse_flexible_date)
}

fn number_field(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s
            .trim()
            .trim_start_matches('$')
            .replace(',', "")
            .parse::<f64>()
            .ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}
