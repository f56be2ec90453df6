pub mod config;
pub mod error;
pub mod providers;
pub mod routes;
pub mod state;
pub mod storage;
pub mod store;
pub mod worker;

use std::sync::Arc;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use crate::config::BackendConfig;
use crate::providers::{ProviderRegistry, ReplicateProvider};
use crate::routes::api_routes;
use crate::state::BackendState;

/// Full HTTP surface: generation routes plus the generated image files.
pub fn app(state: BackendState) -> Router {
    let generated = ServeDir::new(&state.config.generated_dir);

    Router::new()
        .merge(api_routes())
        .nest_service("/generated", generated)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Providers enabled by the configuration.
pub fn providers_from_config(conf: &BackendConfig) -> ProviderRegistry {
    let mut providers = ProviderRegistry::new();

    match &conf.replicate {
        Some(replicate) => providers.register(Arc::new(ReplicateProvider::new(replicate))),
        None => tracing::warn!(
            "REPLICATE_API_TOKEN or REPLICATE_MODEL_VERSION not set; jobs will fail until a provider is configured"
        ),
    }

    providers
}
