mod replicate;

use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use ig_core::GenerationRequest;
use serde_json::Value;

pub use replicate::ReplicateProvider;

/// One generated file as returned by a provider.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    /// Anything outside `image/*` fails the job.
    pub mime: String,
    pub meta: Value,
}

#[async_trait]
pub trait ImageProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, request: &GenerationRequest) -> anyhow::Result<Vec<Artifact>>;

    /// Best-effort abort of a running provider job.
    ///
    /// Reserved: the worker has no cancel path yet, so jobs always run to
    /// completion once started.
    async fn abort(&self, provider_job_id: &str) -> bool;
}

/// Providers the worker can dispatch to, keyed by lowercase name.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn ImageProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: Arc<dyn ImageProvider>) {
        self.providers.insert(provider.name().to_lowercase(), provider);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ImageProvider>> {
        self.providers.get(&name.to_lowercase()).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
