use axum::Router;
use axum::routing::{get, post};
use crate::routes::job::{create_generation, get_generation_status};
use crate::state::BackendState;

mod job;

pub fn api_routes() -> Router<BackendState> {
    Router::new()
        .route("/generate", post(create_generation))
        .route("/generate/{job_id}", get(get_generation_status))
}
