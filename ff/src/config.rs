//! FloorForge configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::coordinator::{
    CoordinatorConfig, DEFAULT_MAX_PROMPT_CHARS, DEFAULT_PLACEHOLDER_IMAGE_URL, DevelopmentFallbackPolicy,
};
use crate::domain::{DEFAULT_GUIDANCE_SCALE, DEFAULT_INFERENCE_STEPS};
use crate::store::DEFAULT_PLANS_KEY;

/// Upper bound for `service.max-retries`
pub const MAX_RETRIES: u32 = 10;

/// Main FloorForge configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Generation service connection
    pub service: ServiceConfig,

    /// Generation defaults and limits
    pub generation: GenerationConfig,

    /// Local storage
    pub storage: StorageConfig,

    /// Default log level (overridden by --log-level)
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Config {
    /// Validate configuration before use
    pub fn validate(&self) -> Result<()> {
        reqwest::Url::parse(&self.service.base_url)
            .with_context(|| format!("Invalid service base-url '{}'", self.service.base_url))?;

        if self.service.timeout_ms == 0 {
            return Err(eyre::eyre!("service.timeout-ms must be positive"));
        }
        if self.service.max_retries > MAX_RETRIES {
            return Err(eyre::eyre!(
                "service.max-retries must be at most {}, got {}",
                MAX_RETRIES,
                self.service.max_retries
            ));
        }
        if self.generation.default_inference_steps == 0 {
            return Err(eyre::eyre!("generation.default-inference-steps must be positive"));
        }
        let guidance = self.generation.default_guidance_scale;
        if !guidance.is_finite() || guidance <= 0.0 {
            return Err(eyre::eyre!(
                "generation.default-guidance-scale must be a positive number, got {}",
                guidance
            ));
        }
        if self.generation.max_prompt_chars == 0 {
            return Err(eyre::eyre!("generation.max-prompt-chars must be positive"));
        }
        if self.storage.key.trim().is_empty() {
            return Err(eyre::eyre!("storage.key must not be empty"));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::search_paths() {
            if !candidate.exists() {
                continue;
            }
            match Self::load_from_file(&candidate) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are ignored here; the full load reports them.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => Self::search_paths(),
        };

        candidates
            .iter()
            .find(|p| p.exists())
            .and_then(|p| fs::read_to_string(p).ok())
            .and_then(|content| serde_yaml::from_str::<Self>(&content).ok())
            .and_then(|config| config.log_level)
    }

    /// `./.floorforge.yml`, then `~/.config/floorforge/floorforge.yml`
    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".floorforge.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("floorforge").join("floorforge.yml"));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Settings for the coordinator
    pub fn coordinator(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            store_key: self.storage.key.clone(),
            default_inference_steps: self.generation.default_inference_steps,
            default_guidance_scale: self.generation.default_guidance_scale,
            max_prompt_chars: self.generation.max_prompt_chars,
            development_fallback: self.generation.development_fallback,
            placeholder_image_url: self.generation.placeholder_image_url.clone(),
        }
    }
}

/// Generation service connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Service base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Request timeout in milliseconds; generation can take minutes
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Retries for idempotent requests
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled on each attempt
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_ms: 300_000,
            max_retries: 3,
            retry_backoff_ms: 1000,
        }
    }
}

/// Generation defaults and limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    #[serde(rename = "default-inference-steps")]
    pub default_inference_steps: u32,

    #[serde(rename = "default-guidance-scale")]
    pub default_guidance_scale: f64,

    #[serde(rename = "max-prompt-chars")]
    pub max_prompt_chars: usize,

    /// Placeholder plans on failure; development only
    #[serde(rename = "development-fallback")]
    pub development_fallback: DevelopmentFallbackPolicy,

    #[serde(rename = "placeholder-image-url")]
    pub placeholder_image_url: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            default_inference_steps: DEFAULT_INFERENCE_STEPS,
            default_guidance_scale: DEFAULT_GUIDANCE_SCALE,
            max_prompt_chars: DEFAULT_MAX_PROMPT_CHARS,
            development_fallback: DevelopmentFallbackPolicy::Disabled,
            placeholder_image_url: DEFAULT_PLACEHOLDER_IMAGE_URL.to_string(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the plan collection
    pub dir: PathBuf,

    /// Key the collection is stored under
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        // ~/.local/share/floorforge on Linux
        let dir = dirs::data_dir()
            .map(|d| d.join("floorforge"))
            .unwrap_or_else(|| PathBuf::from(".floorforge"));

        Self {
            dir,
            key: DEFAULT_PLANS_KEY.to_string(),
        }
    }
}
