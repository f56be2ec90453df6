use std::collections::HashMap;
use std::sync::Arc;
use chrono::{DateTime, Utc};
use ig_core::{GenerationRequest, JobStatus, ResultImage};
use ig_core::schemas::JobStatusResponse;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct JobRecord {
    pub id: String,
    pub request: GenerationRequest,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub images: Vec<ResultImage>,
}

impl JobRecord {
    pub fn to_response(&self) -> JobStatusResponse {
        JobStatusResponse {
            id: Some(self.id.clone()),
            status: Some(self.status.as_str().to_string()),
            images: (!self.images.is_empty()).then(|| self.images.clone()),
            error: self.error.clone(),
        }
    }
}

/// In-memory job table shared by the routes and the worker.
#[derive(Debug, Clone, Default)]
pub struct JobStore {
    jobs: Arc<RwLock<HashMap<String, JobRecord>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, id: String, request: GenerationRequest) -> JobRecord {
        let record = JobRecord {
            id: id.clone(),
            request,
            status: JobStatus::Queued,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            error: None,
            images: Vec::new(),
        };
        self.jobs.write().await.insert(id, record.clone());
        record
    }

    pub async fn get(&self, id: &str) -> Option<JobRecord> {
        self.jobs.read().await.get(id).cloned()
    }

    /// Returns `None` if the job does not exist.
    pub async fn update_status(
        &self,
        id: &str,
        status: JobStatus,
        error: Option<String>,
    ) -> Option<JobRecord> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(id)?;

        job.status = status;
        if status == JobStatus::Running {
            job.started_at = Some(Utc::now());
        }
        if status.is_terminal() {
            job.finished_at = Some(Utc::now());
        }
        if error.is_some() {
            job.error = error;
        }

        Some(job.clone())
    }

    pub async fn append_image(&self, id: &str, image: ResultImage) -> Option<JobRecord> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(id)?;
        job.images.push(image);
        Some(job.clone())
    }
}
