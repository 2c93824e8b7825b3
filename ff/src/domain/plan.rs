//! FloorPlan domain type
//!
//! A generated floor plan and the generation parameters that produced it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Label shown for plans the user has not named
pub const UNTITLED_PLAN_NAME: &str = "Untitled Floor Plan";

/// Default number of diffusion steps
pub const DEFAULT_INFERENCE_STEPS: u32 = 50;

/// Default classifier-free guidance scale
pub const DEFAULT_GUIDANCE_SCALE: f64 = 7.5;

/// Generation configuration snapshot stored with every plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParameters {
    /// Number of diffusion steps
    pub num_inference_steps: u32,

    /// Guidance scale
    pub guidance_scale: f64,

    /// Seed used for the generation (persisted for reproducibility)
    pub seed: u64,
}

impl GenerationParameters {
    /// Parameters with default steps and guidance for the given seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            num_inference_steps: DEFAULT_INFERENCE_STEPS,
            guidance_scale: DEFAULT_GUIDANCE_SCALE,
            seed,
        }
    }
}

/// Optional overrides supplied by the caller for a single generation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationOptions {
    pub num_inference_steps: Option<u32>,
    pub guidance_scale: Option<f64>,
    pub seed: Option<u64>,
}

impl GenerationOptions {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_steps(mut self, steps: u32) -> Self {
        self.num_inference_steps = Some(steps);
        self
    }

    pub fn with_guidance(mut self, guidance_scale: f64) -> Self {
        self.guidance_scale = Some(guidance_scale);
        self
    }
}

/// A generated floor plan
///
/// `id`, `created_at` and `parameters` are fixed when the plan is created.
/// Only `name` changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorPlan {
    /// Unique identifier (server-assigned, or a client-side UUIDv7)
    pub id: String,

    /// Text description the plan was generated from
    pub prompt: String,

    /// Locator of the generated image (URL or data URI)
    pub image_url: String,

    /// User-assigned label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Creation time (RFC 3339, UTC)
    pub created_at: DateTime<Utc>,

    /// Generation configuration snapshot
    pub parameters: GenerationParameters,

    /// Seconds the service reported for the generation
    #[serde(default)]
    pub generation_time: f64,

    /// Total rooms mentioned in the prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_count: Option<u32>,
}

impl FloorPlan {
    /// Create a plan with a fresh time-ordered id and the current timestamp
    pub fn new(prompt: impl Into<String>, image_url: impl Into<String>, parameters: GenerationParameters) -> Self {
        let prompt = prompt.into();
        debug!(prompt_len = prompt.len(), "FloorPlan::new: called");
        Self {
            id: generate_plan_id(),
            prompt,
            image_url: image_url.into(),
            name: None,
            created_at: Utc::now(),
            parameters,
            generation_time: 0.0,
            room_count: None,
        }
    }

    /// Name to show for this plan, falling back to the untitled placeholder
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => UNTITLED_PLAN_NAME,
        }
    }

    /// Copy of this plan carrying a new name; every other field is kept
    pub fn renamed(&self, name: Option<String>) -> Self {
        debug!(id = %self.id, ?name, "FloorPlan::renamed: called");
        Self {
            name,
            ..self.clone()
        }
    }
}

/// Client-side identifier for plans the service did not name
pub fn generate_plan_id() -> String {
    Uuid::now_v7().to_string()
}
