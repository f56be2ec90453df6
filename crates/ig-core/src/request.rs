use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_PROVIDER: &str = "replicate";

/// A single image generation request, as posted to `/generate`.
///
/// Numeric fields are carried as plain integers and are never range-checked
/// on either side of the wire; the provider decides what it accepts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(default = "default_size")]
    pub width: i64,
    #[serde(default = "default_size")]
    pub height: i64,
    #[serde(default = "default_steps")]
    pub steps: i64,
    #[serde(default = "default_batch")]
    pub batch: i64,
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Base URL the backend uses when building result image URLs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    /// Provider-specific inputs (guidance scale, negative prompt, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Map<String, Value>>,
}

fn default_size() -> i64 {
    512
}

fn default_steps() -> i64 {
    20
}

fn default_batch() -> i64 {
    1
}

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

impl GenerationRequest {
    /// Request with the generator's default parameters
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            width: default_size(),
            height: default_size(),
            steps: default_steps(),
            batch: default_batch(),
            provider: default_provider(),
            base_url: None,
            seed: None,
            extra: None,
        }
    }

    pub fn with_size(mut self, width: i64, height: i64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_steps(mut self, steps: i64) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_batch(mut self, batch: i64) -> Self {
        self.batch = batch;
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }
}
