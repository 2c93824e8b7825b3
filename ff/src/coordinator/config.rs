//! Coordinator configuration

use serde::{Deserialize, Serialize};

use crate::domain::{DEFAULT_GUIDANCE_SCALE, DEFAULT_INFERENCE_STEPS};
use crate::store::DEFAULT_PLANS_KEY;

/// Default prompt length bound, in characters
pub const DEFAULT_MAX_PROMPT_CHARS: usize = 500;

/// Image shown for plans synthesized while the service is unreachable
pub const DEFAULT_PLACEHOLDER_IMAGE_URL: &str = "https://placehold.co/512x512/png?text=Floor+Plan";

/// Nominal generation time recorded on placeholder plans, in seconds
pub const PLACEHOLDER_GENERATION_TIME: f64 = 2.5;

/// What `generate` does when the service fails
///
/// `Placeholder` is for offline development only and must stay `Disabled`
/// in production deployments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DevelopmentFallbackPolicy {
    /// Report the failure and return nothing
    #[default]
    Disabled,
    /// Report the failure and return a placeholder plan
    Placeholder,
}

impl std::fmt::Display for DevelopmentFallbackPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => write!(f, "disabled"),
            Self::Placeholder => write!(f, "placeholder"),
        }
    }
}

/// Coordinator configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorConfig {
    /// Durable store key for the plan collection
    pub store_key: String,

    /// Steps used when the caller does not supply any
    pub default_inference_steps: u32,

    /// Guidance scale used when the caller does not supply one
    pub default_guidance_scale: f64,

    /// Longest accepted prompt, in characters
    pub max_prompt_chars: usize,

    /// Behavior when generation fails
    pub development_fallback: DevelopmentFallbackPolicy,

    /// Image locator for placeholder plans
    pub placeholder_image_url: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            store_key: DEFAULT_PLANS_KEY.to_string(),
            default_inference_steps: DEFAULT_INFERENCE_STEPS,
            default_guidance_scale: DEFAULT_GUIDANCE_SCALE,
            max_prompt_chars: DEFAULT_MAX_PROMPT_CHARS,
            development_fallback: DevelopmentFallbackPolicy::Disabled,
            placeholder_image_url: DEFAULT_PLACEHOLDER_IMAGE_URL.to_string(),
        }
    }
}

impl CoordinatorConfig {
    pub fn with_fallback(mut self, policy: DevelopmentFallbackPolicy) -> Self {
        self.development_fallback = policy;
        self
    }
}
