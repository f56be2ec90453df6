use std::path::PathBuf;
use anyhow::{anyhow, bail};
use ig_core::{GenerationRequest, JobStatus, ResultImage};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;
use crate::providers::ProviderRegistry;
use crate::storage::{self, SafetyVerdict};
use crate::store::JobStore;

/// A job waiting for the worker.
#[derive(Debug, Clone)]
pub struct QueuedJob {
    pub job_id: String,
    pub request: GenerationRequest,
}

/// Runs queued jobs one at a time against the registered providers and
/// stores the resulting images under the generated directory.
pub struct JobWorker {
    store: JobStore,
    providers: ProviderRegistry,
    generated_dir: PathBuf,
    thumbs_dir: PathBuf,
    base_url: String,
}

impl JobWorker {
    pub fn new(
        store: JobStore,
        providers: ProviderRegistry,
        generated_dir: PathBuf,
        base_url: String,
    ) -> Self {
        Self {
            store,
            providers,
            thumbs_dir: generated_dir.join("thumbs"),
            generated_dir,
            base_url,
        }
    }

    /// Drain the queue until every sender is gone.
    pub async fn run(self, mut queue: mpsc::Receiver<QueuedJob>) {
        info!("Generation worker started");

        while let Some(job) = queue.recv().await {
            self.process(job).await;
        }

        info!("Generation queue closed, worker exiting");
    }

    pub async fn process(&self, job: QueuedJob) {
        let job_id = job.job_id.clone();
        info!(%job_id, provider = %job.request.provider, "Processing job");

        self.store.update_status(&job_id, JobStatus::Running, None).await;

        match self.generate(&job).await {
            Ok(count) => {
                self.store.update_status(&job_id, JobStatus::Success, None).await;
                info!(%job_id, count, "Job succeeded");
            }
            Err(e) => {
                error!(%job_id, "Job failed: {:#}", e);
                self.store
                    .update_status(&job_id, JobStatus::Failed, Some(format!("{e:#}")))
                    .await;
            }
        }
    }

    async fn generate(&self, job: &QueuedJob) -> anyhow::Result<usize> {
        let provider = self.providers.get(&job.request.provider).ok_or_else(|| {
            anyhow!(
                "Unsupported provider '{}'. This worker only supports: {}",
                job.request.provider,
                self.providers.names().join(", ")
            )
        })?;

        let artifacts = provider.generate(&job.request).await?;
        let base_url = job.request.base_url.as_deref().unwrap_or(&self.base_url);

        let count = artifacts.len();
        for (i, artifact) in artifacts.into_iter().enumerate() {
            if !artifact.mime.starts_with("image/") {
                bail!("Provider returned non-image output ({}) for item {}", artifact.mime, i);
            }

            let file_name = format!("{}_{}.png", job.job_id, i);
            let thumb_name = format!("{}_{}_thumb.jpg", job.job_id, i);

            let verdict = self.persist(file_name.clone(), thumb_name.clone(), artifact.bytes).await?;
            if verdict.nsfw {
                warn!(job_id = %job.job_id, index = i, score = verdict.score, "Image flagged by safety check");
            }

            let image = ResultImage {
                image_id: Some(Uuid::new_v4().to_string()),
                url: format!("{base_url}/generated/{file_name}"),
                thumbnail: Some(format!("{base_url}/generated/thumbs/{thumb_name}")),
                meta: Some(artifact.meta),
                nsfw: Some(verdict.nsfw),
            };
            self.store.append_image(&job.job_id, image).await;
        }

        Ok(count)
    }

    /// File writes and JPEG encoding happen off the async threads.
    async fn persist(
        &self,
        file_name: String,
        thumb_name: String,
        bytes: Vec<u8>,
    ) -> anyhow::Result<SafetyVerdict> {
        let generated_dir = self.generated_dir.clone();
        let thumbs_dir = self.thumbs_dir.clone();

        tokio::task::spawn_blocking(move || -> anyhow::Result<SafetyVerdict> {
            storage::save_image_bytes(&generated_dir, &file_name, &bytes)?;
            storage::make_thumbnail(&thumbs_dir, &thumb_name, &bytes)?;
            Ok(storage::safety_check(&bytes))
        })
        .await?
    }
}
