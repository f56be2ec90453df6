use std::env;
use std::time::Duration;
use anyhow::{Context, bail};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// How the client talks to the generation backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub poll: PollConfig,
}

/// Poll loop tuning.
///
/// `retries` is the number of consecutive failed status checks tolerated
/// before the job is given up on. The default of zero ends the run on the
/// first failure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollConfig {
    pub interval: Duration,
    pub retries: u32,
}

impl PollConfig {
    /// The tick period actually used; a zero interval is raised to
    /// `MIN_POLL_INTERVAL`.
    pub fn period(&self) -> Duration {
        self.interval.max(MIN_POLL_INTERVAL)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            retries: 0,
        }
    }
}

impl ClientConfig {
    /// Load from the environment, reading `.env` first if present.
    ///
    /// | Env Var               | Default                  |
    /// |-----------------------|--------------------------|
    /// | `IG_API_BASE_URL`     | `http://127.0.0.1:8000`  |
    /// | `IG_POLL_INTERVAL_MS` | `2000`                   |
    /// | `IG_POLL_RETRIES`     | `0`                      |
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_vars(
            env::var("IG_API_BASE_URL").ok(),
            env::var("IG_POLL_INTERVAL_MS").ok(),
            env::var("IG_POLL_RETRIES").ok(),
        )
    }

    fn from_vars(
        base_url: Option<String>,
        interval_ms: Option<String>,
        retries: Option<String>,
    ) -> anyhow::Result<Self> {
        let base_url = resolve_base_url(base_url);

        let interval = match interval_ms {
            Some(ms) => {
                let ms: u64 = ms
                    .parse()
                    .with_context(|| format!("IG_POLL_INTERVAL_MS must be a number, got {ms:?}"))?;
                if ms == 0 {
                    bail!("IG_POLL_INTERVAL_MS must be greater than zero");
                }
                Duration::from_millis(ms)
            }
            None => DEFAULT_POLL_INTERVAL,
        };

        let retries = match retries {
            Some(n) => n
                .parse()
                .with_context(|| format!("IG_POLL_RETRIES must be a number, got {n:?}"))?,
            None => 0,
        };

        Ok(Self {
            base_url,
            poll: PollConfig { interval, retries },
        })
    }
}

/// An empty override counts as unset.
pub fn resolve_base_url(over: Option<String>) -> String {
    over.map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}
