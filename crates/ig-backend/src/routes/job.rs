use axum::Json;
use axum::extract::{Path, State};
use ig_core::{GenerationRequest, JobStatus};
use ig_core::schemas::{JobCreateResponse, JobStatusResponse};
use tracing::info;
use uuid::Uuid;
use crate::error::{ApiError, ApiResult};
use crate::state::BackendState;
use crate::worker::QueuedJob;

/// Store a new job as `queued` and hand it to the worker.
pub async fn create_generation(
    State(state): State<BackendState>,
    Json(mut request): Json<GenerationRequest>,
) -> ApiResult<Json<JobCreateResponse>> {
    let job_id = Uuid::new_v4().to_string();

    if request.base_url.as_deref().is_none_or(str::is_empty) {
        request.base_url = Some(state.config.base_url.clone());
    }

    state.store.create(job_id.clone(), request.clone()).await;

    let queued = QueuedJob { job_id: job_id.clone(), request };
    if let Err(e) = state.queue.try_send(queued) {
        let message = format!("enqueue error: {e}");
        state
            .store
            .update_status(&job_id, JobStatus::Failed, Some(message.clone()))
            .await;
        return Err(ApiError::Internal(format!("Failed to enqueue job: {message}")));
    }

    info!(%job_id, "Generation job queued");

    Ok(Json(JobCreateResponse {
        job_id: Some(job_id),
        queued: Some(true),
    }))
}

pub async fn get_generation_status(
    State(state): State<BackendState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobStatusResponse>> {
    let job = state.store.get(&job_id).await.ok_or(ApiError::NotFound)?;
    Ok(Json(job.to_response()))
}
