//! Bill extraction pipeline.
//!
//! Picks one extraction strategy at construction time and runs it for each
//! image. Extraction never fails: any strategy error is logged and replaced by
//! the default result for that call.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tokio::time::{Duration, timeout};

use super::models::ExtractionResult;
use super::ocr::{self, OcrEngine, TesseractEngine};
use super::period::previous_month;
use super::vision::{self, VisionClient};
use crate::error::{FlowError, Result};

/// Resolved settings for building an [`ExtractionPipeline`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionConfig {
    pub vision_enabled: bool,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub ocr_enabled: bool,
    pub ocr_binary: String,
    pub ocr_language: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            vision_enabled: true,
            api_key: None,
            model: vision::DEFAULT_MODEL.to_string(),
            base_url: vision::DEFAULT_BASE_URL.to_string(),
            max_tokens: vision::DEFAULT_MAX_TOKENS,
            temperature: vision::DEFAULT_TEMPERATURE,
            ocr_enabled: true,
            ocr_binary: ocr::DEFAULT_BINARY.to_string(),
            ocr_language: ocr::DEFAULT_LANGUAGE.to_string(),
        }
    }
}

// =============================================================================
// Strategy
// =============================================================================

/// The one strategy a pipeline runs.
#[derive(Clone)]
pub enum ExtractionStrategy {
    Vision(VisionClient),
    Ocr(Arc<dyn OcrEngine>),
    None,
}

impl ExtractionStrategy {
    /// Label for output and logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Vision(_) => "vision",
            Self::Ocr(_) => "ocr",
            Self::None => "none",
        }
    }
}

impl fmt::Debug for ExtractionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vision(client) => f.debug_tuple("Vision").field(&client.model()).finish(),
            Self::Ocr(engine) => f.debug_tuple("Ocr").field(&engine.name()).finish(),
            Self::None => f.write_str("None"),
        }
    }
}

// =============================================================================
// Outcome
// =============================================================================

/// Result of one extraction plus how it was obtained.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionOutcome {
    pub result: ExtractionResult,
    pub strategy: &'static str,
    pub duration_ms: u64,
    /// Set when the strategy failed and `result` holds defaults.
    pub error: Option<String>,
}

impl ExtractionOutcome {
    #[must_use]
    pub fn used_defaults(&self) -> bool {
        self.error.is_some() || self.result.confidence <= 0.0
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Stateless bill extractor. Safe to share across tasks.
#[derive(Debug, Clone)]
pub struct ExtractionPipeline {
    strategy: ExtractionStrategy,
}

impl ExtractionPipeline {
    #[must_use]
    pub const fn new(strategy: ExtractionStrategy) -> Self {
        Self { strategy }
    }

    /// Choose a strategy: vision when a key is configured, else OCR when the
    /// engine is installed, else none.
    #[must_use]
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(select_strategy(config))
    }

    #[must_use]
    pub const fn strategy(&self) -> &ExtractionStrategy {
        &self.strategy
    }

    /// Default result for a call made on `today`.
    #[must_use]
    pub fn defaults(today: NaiveDate) -> ExtractionResult {
        let (period_start, period_end) = previous_month(today);
        ExtractionResult {
            period_start,
            period_end,
            usage: 0.0,
            amount: 0.0,
            confidence: 0.0,
        }
    }

    /// Extract bill fields, using the local date for period defaults.
    pub async fn extract(&self, image: &Path) -> ExtractionResult {
        self.extract_on(image, Local::now().date_naive()).await
    }

    /// Extract bill fields with an explicit current date.
    pub async fn extract_on(&self, image: &Path, today: NaiveDate) -> ExtractionResult {
        self.extract_with_report(image, today).await.result
    }

    /// Extract bill fields and report which strategy ran and how it went.
    pub async fn extract_with_report(&self, image: &Path, today: NaiveDate) -> ExtractionOutcome {
        let strategy = self.strategy.label();
        let start = Instant::now();

        tracing::info!(strategy, image = %image.display(), "Extracting bill");

        let attempt = match &self.strategy {
            ExtractionStrategy::Vision(client) => client.extract(image, today).await,
            ExtractionStrategy::Ocr(engine) => run_ocr(Arc::clone(engine), image, today).await,
            ExtractionStrategy::None => {
                tracing::warn!("No extraction strategy available, returning defaults");
                Ok(Self::defaults(today))
            }
        };

        let duration_ms = elapsed_ms(start);
        match attempt {
            Ok(result) => {
                tracing::info!(
                    strategy,
                    duration_ms,
                    confidence = result.confidence,
                    "Extraction finished"
                );
                ExtractionOutcome {
                    result,
                    strategy,
                    duration_ms,
                    error: None,
                }
            }
            Err(e) => {
                tracing::error!(
                    strategy,
                    duration_ms,
                    error = %e,
                    error_code = e.error_code(),
                    "Extraction failed, returning defaults"
                );
                ExtractionOutcome {
                    result: Self::defaults(today),
                    strategy,
                    duration_ms,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// [`Self::extract_with_report`] bounded by a caller-chosen timeout.
    ///
    /// An elapsed timeout is treated like any other strategy failure.
    pub async fn extract_with_timeout(
        &self,
        image: &Path,
        today: NaiveDate,
        timeout_duration: Duration,
    ) -> ExtractionOutcome {
        let start = Instant::now();
        match timeout(timeout_duration, self.extract_with_report(image, today)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                let err = FlowError::Timeout(timeout_duration.as_secs());
                tracing::error!(
                    strategy = self.strategy.label(),
                    timeout_secs = timeout_duration.as_secs(),
                    error = %err,
                    "Extraction timed out, returning defaults"
                );
                ExtractionOutcome {
                    result: Self::defaults(today),
                    strategy: self.strategy.label(),
                    duration_ms: elapsed_ms(start),
                    error: Some(err.to_string()),
                }
            }
        }
    }
}

fn select_strategy(config: &ExtractionConfig) -> ExtractionStrategy {
    let api_key = config
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty());

    if config.vision_enabled {
        match api_key {
            Some(key) => match VisionClient::new(key) {
                Ok(client) => {
                    let client = client
                        .with_base_url(&config.base_url)
                        .with_model(&config.model)
                        .with_sampling(config.max_tokens, config.temperature);
                    tracing::debug!(model = %config.model, "Vision extraction enabled");
                    return ExtractionStrategy::Vision(client);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to build vision client");
                }
            },
            None => {
                tracing::warn!("Vision API key not set, vision extraction disabled");
            }
        }
    }

    if config.ocr_enabled {
        let engine = TesseractEngine::new(&config.ocr_binary, &config.ocr_language);
        if engine.is_available() {
            tracing::debug!(binary = %config.ocr_binary, "OCR extraction enabled");
            return ExtractionStrategy::Ocr(Arc::new(engine));
        }
        tracing::warn!(
            binary = %config.ocr_binary,
            "OCR engine not found, OCR extraction disabled"
        );
    }

    tracing::warn!("No extraction strategy configured, bill scans will return defaults");
    ExtractionStrategy::None
}

async fn run_ocr(
    engine: Arc<dyn OcrEngine>,
    image: &Path,
    today: NaiveDate,
) -> Result<ExtractionResult> {
    let path: PathBuf = image.to_path_buf();
    let text = tokio::task::spawn_blocking(move || engine.extract_text(&path))
        .await
        .map_err(|e| FlowError::OcrFailed(format!("OCR task failed: {e}")))??;
    Ok(ocr::extract_from_text(&text, today))
}

#[allow(clippy::cast_possible_truncation)]
fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
