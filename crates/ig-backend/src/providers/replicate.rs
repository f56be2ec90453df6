use std::time::Duration;
use anyhow::Context;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ig_core::GenerationRequest;
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use crate::config::ReplicateConfig;
use crate::providers::{Artifact, ImageProvider};

const PREDICTIONS_URL: &str = "https://api.replicate.com/v1/predictions";

/// Replicate predictions API, used synchronously via `Prefer: wait`.
pub struct ReplicateProvider {
    client: reqwest::Client,
    api_token: String,
    model_version: String,
}

impl ReplicateProvider {
    pub fn new(conf: &ReplicateConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_token: conf.api_token.clone(),
            model_version: conf.model_version.clone(),
        }
    }

    async fn download(&self, url: &str, prediction_id: &Value) -> anyhow::Result<Artifact> {
        let response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(60))
            .send()
            .await?
            .error_for_status()?;

        let mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/png")
            .to_string();

        Ok(Artifact {
            bytes: response.bytes().await?.to_vec(),
            mime,
            meta: json!({ "provider_job": prediction_id }),
        })
    }
}

/// Provider input built from a request. `extra` keys never override the
/// built-in fields.
fn build_input(request: &GenerationRequest) -> Map<String, Value> {
    let mut input = Map::new();
    input.insert("prompt".into(), json!(request.prompt));
    input.insert("width".into(), json!(request.width));
    input.insert("height".into(), json!(request.height));
    input.insert("num_inference_steps".into(), json!(request.steps));

    if let Some(extra) = &request.extra {
        for (k, v) in extra {
            input.entry(k.clone()).or_insert_with(|| v.clone());
        }
    }

    if let Some(seed) = request.seed {
        input.insert("seed".into(), json!(seed));
    }

    input
}

/// Outputs that are not URLs are expected to be base64; anything else is
/// kept as text so it is not silently lost.
fn decode_inline(item: &Value, prediction_id: &Value) -> Artifact {
    let meta = json!({ "provider_job": prediction_id });

    match item.as_str().map(|s| STANDARD.decode(s)) {
        Some(Ok(bytes)) => Artifact { bytes, mime: "image/png".into(), meta },
        Some(Err(_)) => Artifact {
            bytes: item.as_str().unwrap_or_default().as_bytes().to_vec(),
            mime: "text/plain".into(),
            meta,
        },
        None => Artifact {
            bytes: item.to_string().into_bytes(),
            mime: "text/plain".into(),
            meta,
        },
    }
}

fn is_remote(item: &Value) -> Option<&str> {
    item.as_str().filter(|s| s.starts_with("http"))
}

#[async_trait]
impl ImageProvider for ReplicateProvider {
    fn name(&self) -> &str {
        "replicate"
    }

    async fn generate(&self, request: &GenerationRequest) -> anyhow::Result<Vec<Artifact>> {
        let payload = json!({
            "version": self.model_version,
            "input": build_input(request),
        });

        info!(version = %self.model_version, "Creating Replicate prediction");

        let prediction: Value = self
            .client
            .post(PREDICTIONS_URL)
            .header(reqwest::header::AUTHORIZATION, format!("Token {}", self.api_token))
            .header("Prefer", "wait=60")
            .json(&payload)
            .timeout(Duration::from_secs(120))
            .send()
            .await
            .context("Failed to reach Replicate")?
            .error_for_status()?
            .json()
            .await?;

        let prediction_id = prediction.get("id").cloned().unwrap_or(Value::Null);
        let outputs = match prediction.get("output") {
            Some(Value::Array(items)) => items.clone(),
            Some(Value::Null) | None => Vec::new(),
            Some(single) => vec![single.clone()],
        };
        debug!(id = %prediction_id, count = outputs.len(), "Prediction returned");

        let mut artifacts = Vec::with_capacity(outputs.len());
        for item in &outputs {
            let artifact = match is_remote(item) {
                Some(url) => self.download(url, &prediction_id).await?,
                None => decode_inline(item, &prediction_id),
            };
            artifacts.push(artifact);
        }

        Ok(artifacts)
    }

    async fn abort(&self, _provider_job_id: &str) -> bool {
        // Replicate offers no reliable cancel for synchronous predictions.
        false
    }
}
