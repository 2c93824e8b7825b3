//! Wire types for the generation service
//!
//! Responses are decoded leniently: the service omits fields depending on
//! how a plan was produced, so almost everything is optional here and the
//! coordinator fills the gaps.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/generate-floor-plan`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub num_inference_steps: u32,
    pub guidance_scale: f64,
    pub seed: u64,
}

/// Generation parameters as echoed back by the service
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteParameters {
    #[serde(default, alias = "num_inference_steps")]
    pub num_inference_steps: Option<u32>,

    #[serde(default, alias = "guidance_scale")]
    pub guidance_scale: Option<f64>,

    #[serde(default)]
    pub seed: Option<u64>,
}

/// Successful generation response
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub prompt: Option<String>,

    pub image_url: String,

    /// Kept as text; the service has used more than one timestamp format
    #[serde(default)]
    pub created_at: Option<String>,

    #[serde(default)]
    pub parameters: Option<RemoteParameters>,

    #[serde(default)]
    pub generation_time: Option<f64>,
}

/// One entry of the plan listing
///
/// Entries backed by a metadata file carry the generator's snake_case keys
/// and no id; entries without metadata carry only an id, image and time.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePlan {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub prompt: Option<String>,

    #[serde(default, alias = "image_url")]
    pub image_url: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default, alias = "timestamp")]
    pub created_at: Option<String>,

    #[serde(default)]
    pub parameters: Option<RemoteParameters>,

    #[serde(default, alias = "num_inference_steps")]
    pub num_inference_steps: Option<u32>,

    #[serde(default, alias = "guidance_scale")]
    pub guidance_scale: Option<f64>,

    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default, alias = "generation_time")]
    pub generation_time: Option<f64>,
}

impl RemotePlan {
    /// Nested parameters, falling back to the flat metadata keys
    pub fn resolved_parameters(&self) -> RemoteParameters {
        let nested = self.parameters.clone().unwrap_or_default();
        RemoteParameters {
            num_inference_steps: nested.num_inference_steps.or(self.num_inference_steps),
            guidance_scale: nested.guidance_scale.or(self.guidance_scale),
            seed: nested.seed.or(self.seed),
        }
    }
}

/// Body of `GET /api/floor-plans`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanList {
    pub floor_plans: Vec<RemotePlan>,
}

/// Error body the service returns alongside non-2xx statuses
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceErrorBody {
    #[serde(default)]
    pub error: Option<String>,

    #[serde(default)]
    pub message: Option<String>,
}

impl ServiceErrorBody {
    /// Most specific text available
    pub fn into_message(self) -> Option<String> {
        self.message.or(self.error).filter(|m| !m.trim().is_empty())
    }
}

/// Body of `GET /health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,

    #[serde(default)]
    pub service: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

/// GPU memory figures reported by the model endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryInfo {
    pub allocated_gb: f64,
    pub reserved_gb: f64,
    pub max_gb: f64,
}

/// Body of `GET /api/model-info`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// "loaded", "not_loaded" or "error"
    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryInfo>,
}

impl ModelInfo {
    pub fn is_loaded(&self) -> bool {
        self.status == "loaded"
    }
}
