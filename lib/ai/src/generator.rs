//! Draft generation boundary.

use crate::draft::DraftWorkflow;
use crate::error::GenerationError;
use async_trait::async_trait;
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Produces a draft workflow from a natural-language prompt.
#[async_trait]
pub trait DraftGenerator: Send + Sync {
    /// Generates a draft. The result is untrusted until imported.
    async fn generate(&self, prompt: &str) -> Result<DraftWorkflow, Report<GenerationError>>;
}

/// Parses a raw generator response body.
///
/// # Errors
///
/// Returns `MalformedResponse` if the body is not a draft workflow.
pub fn parse_draft_response(body: &str) -> Result<DraftWorkflow, GenerationError> {
    serde_json::from_str(body).map_err(|e| GenerationError::MalformedResponse {
        reason: e.to_string(),
    })
}

/// Configuration for [`HttpDraftGenerator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpGeneratorConfig {
    /// URL the prompt is posted to.
    pub endpoint: String,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl HttpGeneratorConfig {
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(30),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
}

/// Posts prompts as JSON to an HTTP generation service.
#[derive(Debug, Clone)]
pub struct HttpDraftGenerator {
    config: HttpGeneratorConfig,
    client: reqwest::Client,
}

impl HttpDraftGenerator {
    /// Creates a generator.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the endpoint is empty or the HTTP client
    /// cannot be built.
    pub fn new(config: HttpGeneratorConfig) -> Result<Self, GenerationError> {
        if config.endpoint.trim().is_empty() {
            return Err(GenerationError::InvalidConfig {
                reason: "endpoint is empty".to_string(),
            });
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GenerationError::InvalidConfig {
                reason: e.to_string(),
            })?;
        Ok(Self { config, client })
    }

    #[must_use]
    pub fn config(&self) -> &HttpGeneratorConfig {
        &self.config
    }

    /// Sends one generation request.
    ///
    /// # Errors
    ///
    /// Returns `EmptyPrompt` before any request is sent for a blank prompt,
    /// otherwise the transport, status or parse failure.
    #[instrument(skip(self, prompt), fields(endpoint = %self.config.endpoint))]
    pub async fn request(&self, prompt: &str) -> Result<DraftWorkflow, GenerationError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(GenerationError::EmptyPrompt);
        }

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&GenerateRequest { prompt })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout
                } else {
                    GenerationError::ServiceUnavailable {
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                GenerationError::Timeout
            } else {
                GenerationError::ServiceUnavailable {
                    reason: e.to_string(),
                }
            }
        })?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Generation request failed");
            return Err(GenerationError::RequestFailed {
                status: status.as_u16(),
                reason: body,
            });
        }

        let draft = parse_draft_response(&body)?;
        debug!(
            nodes = draft.workflow.nodes.len(),
            confidence = draft.confidence,
            "Received draft"
        );
        Ok(draft)
    }
}

#[async_trait]
impl DraftGenerator for HttpDraftGenerator {
    async fn generate(&self, prompt: &str) -> Result<DraftWorkflow, Report<GenerationError>> {
        Ok(self.request(prompt).await?)
    }
}
