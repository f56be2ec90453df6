use std::env;
use std::path::PathBuf;
use anyhow::Context;

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub port: u16,
    /// Public base URL used when building result image URLs.
    pub base_url: String,
    pub generated_dir: PathBuf,
    pub queue_capacity: usize,
    pub replicate: Option<ReplicateConfig>,
}

#[derive(Debug, Clone)]
pub struct ReplicateConfig {
    pub api_token: String,
    pub model_version: String,
}

impl BackendConfig {
    /// Load from the environment, reading `.env` first if present.
    ///
    /// | Env Var                   | Default                 |
    /// |---------------------------|-------------------------|
    /// | `PORT`                    | `8000`                  |
    /// | `BASE_URL`                | `http://127.0.0.1:8000` |
    /// | `GENERATED_DIR`           | `generated`             |
    /// | `QUEUE_CAPACITY`          | `64`                    |
    /// | `REPLICATE_API_TOKEN`     | unset                   |
    /// | `REPLICATE_MODEL_VERSION` | unset                   |
    ///
    /// The Replicate provider is only enabled when both Replicate variables
    /// are set.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let port: u16 = env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .context("PORT must be a number")?;

        let base_url = env::var("BASE_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "http://127.0.0.1:8000".to_string());

        let generated_dir = env::var("GENERATED_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("generated"));

        let queue_capacity: usize = env::var("QUEUE_CAPACITY")
            .unwrap_or_else(|_| "64".to_string())
            .parse()
            .context("QUEUE_CAPACITY must be a number")?;

        let replicate = match (env::var("REPLICATE_API_TOKEN"), env::var("REPLICATE_MODEL_VERSION")) {
            (Ok(api_token), Ok(model_version)) => Some(ReplicateConfig { api_token, model_version }),
            _ => None,
        };

        Ok(Self {
            port,
            base_url: base_url.trim_end_matches('/').to_string(),
            generated_dir,
            queue_capacity,
            replicate,
        })
    }

    pub fn thumbs_dir(&self) -> PathBuf {
        self.generated_dir.join("thumbs")
    }
}
