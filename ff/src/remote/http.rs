//! HTTP implementation of the generation client
//!
//! Talks to the FloorForge service:
//!
//! - `POST /api/generate-floor-plan` - generate one plan
//! - `GET /api/floor-plans` - list generated plans
//! - `GET /api/model-info` - model status
//! - `GET /health` - liveness

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use super::error::is_retryable_status;
use super::{
    ClientError, GenerationClient, GenerationRequest, GenerationResponse, HealthStatus, ModelInfo, PlanList,
    ServiceErrorBody,
};
use crate::config::ServiceConfig;

/// Longest wait between two retries
pub const MAX_RETRY_BACKOFF: Duration = Duration::from_secs(60);

/// reqwest-backed client for the generation service
pub struct HttpGenerationClient {
    base_url: String,
    http: Client,
    timeout: Duration,
    max_retries: u32,
    retry_backoff: Duration,
}

impl HttpGenerationClient {
    /// Create a new client from configuration
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ClientError> {
        debug!(?config, "from_config: called");
        Url::parse(&config.base_url)
            .map_err(|e| ClientError::InvalidRequest(format!("invalid base URL '{}': {}", config.base_url, e)))?;

        let timeout = Duration::from_millis(config.timeout_ms);
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            timeout,
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    /// Client for `base_url` with otherwise default settings
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::from_config(&ServiceConfig {
            base_url: base_url.into(),
            ..ServiceConfig::default()
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Liveness check against `/health`
    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        debug!("health: called");
        self.get_with_retry("/health").await
    }

    /// Model status from `/api/model-info`
    pub async fn model_info(&self) -> Result<ModelInfo, ClientError> {
        debug!("model_info: called");
        self.get_with_retry("/api/model-info").await
    }

    fn send_error(&self, e: reqwest::Error) -> ClientError {
        if e.is_timeout() {
            ClientError::Timeout(self.timeout)
        } else {
            ClientError::Transport(e)
        }
    }

    /// Decode a response body, mapping non-2xx statuses to `ClientError::Remote`
    async fn decode<T: DeserializeOwned>(&self, response: Response) -> Result<T, ClientError> {
        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.send_error(e))?;

        if !status.is_success() {
            debug!(status = status.as_u16(), "decode: service error");
            return Err(remote_error(status.as_u16(), &body));
        }

        Ok(serde_json::from_slice(&body)?)
    }

    /// Delay before retry `attempt` (1-based), doubling up to `MAX_RETRY_BACKOFF`
    fn backoff_for(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt.saturating_sub(1))
            .and_then(|factor| self.retry_backoff.checked_mul(factor))
            .map_or(MAX_RETRY_BACKOFF, |backoff| backoff.min(MAX_RETRY_BACKOFF))
    }

    /// GET with exponential backoff on transient failures
    ///
    /// Only used for idempotent requests.
    async fn get_with_retry<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.endpoint(path);
        debug!(%url, "get_with_retry: called");

        let mut attempt = 0;
        loop {
            if attempt > 0 {
                let backoff = self.backoff_for(attempt);
                warn!(attempt, backoff_ms = backoff.as_millis() as u64, %url, "retrying after transient error");
                tokio::time::sleep(backoff).await;
            }

            let result = match self.http.get(&url).send().await {
                Ok(response) => self.decode(response).await,
                Err(e) => Err(self.send_error(e)),
            };

            match result {
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    debug!(attempt, error = %e, "get_with_retry: transient error");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

/// Build a remote error, preferring the service's own message
fn remote_error(status: u16, body: &[u8]) -> ClientError {
    let message = serde_json::from_slice::<ServiceErrorBody>(body)
        .ok()
        .and_then(ServiceErrorBody::into_message);
    ClientError::Remote { status, message }
}

#[async_trait]
impl GenerationClient for HttpGenerationClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, ClientError> {
        debug!(
            steps = request.num_inference_steps,
            guidance = request.guidance_scale,
            seed = request.seed,
            "generate: called"
        );
        if request.prompt.trim().is_empty() {
            return Err(ClientError::InvalidRequest("prompt must not be empty".to_string()));
        }

        // Not retried: every accepted request renders a new image
        let response = self
            .http
            .post(self.endpoint("/api/generate-floor-plan"))
            .json(request)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        self.decode(response).await
    }

    async fn list_plans(&self) -> Result<PlanList, ClientError> {
        debug!("list_plans: called");
        let list: PlanList = self.get_with_retry("/api/floor-plans").await?;
        debug!(count = list.floor_plans.len(), "list_plans: received");
        Ok(list)
    }
}

impl std::fmt::Debug for HttpGenerationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGenerationClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}
