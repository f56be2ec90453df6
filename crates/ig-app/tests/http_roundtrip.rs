//! The generator talking HTTP to a live backend on a loopback port.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use ig_app::{ClientState, GenError, Generator, HttpGenerationApi, PollConfig};
use ig_backend::config::BackendConfig;
use ig_backend::providers::{Artifact, ImageProvider, ProviderRegistry};
use ig_backend::state::BackendState;
use ig_backend::store::JobStore;
use ig_backend::worker::JobWorker;
use ig_core::GenerationRequest;
use image::{ImageFormat, RgbImage};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

const FAST_POLL: PollConfig = PollConfig {
    interval: Duration::from_millis(50),
    retries: 0,
};

/// Stands in for Replicate: returns `batch` flat-colour PNGs.
struct FlatProvider;

#[async_trait]
impl ImageProvider for FlatProvider {
    fn name(&self) -> &str {
        "replicate"
    }

    async fn generate(&self, request: &GenerationRequest) -> anyhow::Result<Vec<Artifact>> {
        let img = RgbImage::from_pixel(request.width as u32, request.height as u32, image::Rgb([0, 128, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png)?;
        let bytes = out.into_inner();

        Ok((0..request.batch)
            .map(|_| Artifact { bytes: bytes.clone(), mime: "image/png".into(), meta: json!({}) })
            .collect())
    }

    async fn abort(&self, _provider_job_id: &str) -> bool {
        false
    }
}

async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Real routes, store and worker with the flat provider plugged in.
async fn spawn_backend(dir: &tempfile::TempDir) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let generated_dir = dir.path().to_path_buf();
    std::fs::create_dir_all(generated_dir.join("thumbs")).unwrap();

    let conf = BackendConfig {
        port: 0,
        base_url: base_url.clone(),
        generated_dir: generated_dir.clone(),
        queue_capacity: 4,
        replicate: None,
    };

    let mut providers = ProviderRegistry::new();
    providers.register(Arc::new(FlatProvider));

    let store = JobStore::new();
    let (tx, rx) = mpsc::channel(conf.queue_capacity);
    let worker = JobWorker::new(store.clone(), providers, generated_dir, base_url.clone());
    tokio::spawn(worker.run(rx));

    let app = ig_backend::app(BackendState::new(store, tx, conf));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    base_url
}

async fn run_to_end(generator: &mut Generator<HttpGenerationApi>, request: GenerationRequest) -> ClientState {
    let mut handle = generator.submit(request).await.unwrap();
    tokio::time::timeout(Duration::from_secs(10), handle.wait())
        .await
        .expect("job did not finish")
        .expect("job was superseded")
}

#[tokio::test]
async fn job_completes_against_backend() {
    let dir = tempfile::tempdir().unwrap();
    let base_url = spawn_backend(&dir).await;
    let mut generator = Generator::new(HttpGenerationApi::new(base_url.clone()), FAST_POLL)
        .with_default_base_url(base_url.clone());

    let request = GenerationRequest::new("a blue square").with_size(32, 32).with_batch(2);
    let state = run_to_end(&mut generator, request).await;

    let images = match state {
        ClientState::Done { images, .. } => images,
        other => panic!("expected done, got {other:?}"),
    };
    assert_eq!(images.len(), 2);
    assert!(images[0].url.starts_with(&format!("{base_url}/generated/")));
    assert!(images[0].image_id.is_some());

    let thumb = reqwest::get(images[1].thumbnail.clone().unwrap()).await.unwrap();
    assert!(thumb.status().is_success());
    assert!(!generator.is_polling());
}

#[tokio::test]
async fn unsupported_provider_ends_in_error() {
    let dir = tempfile::tempdir().unwrap();
    let base_url = spawn_backend(&dir).await;
    let mut generator = Generator::new(HttpGenerationApi::new(base_url), FAST_POLL);

    let state = run_to_end(&mut generator, GenerationRequest::new("p").with_provider("dalle")).await;
    assert_eq!(
        state.error_message(),
        Some("Unsupported provider 'dalle'. This worker only supports: replicate")
    );
}

#[tokio::test]
async fn create_error_body_is_surfaced() {
    let router = Router::new().route(
        "/generate",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "db down") }),
    );
    let base_url = serve(router).await;
    let mut generator = Generator::new(HttpGenerationApi::new(base_url), FAST_POLL);

    let err = generator.submit(GenerationRequest::new("p")).await.unwrap_err();
    assert_eq!(err, GenError::Submission { status: 500, body: "db down".into() });
    assert!(!generator.is_polling());
}

#[tokio::test]
async fn create_without_job_id_is_rejected() {
    let router = Router::new().route(
        "/generate",
        post(|| async { axum::Json(json!({ "queued": true })) }),
    );
    let base_url = serve(router).await;
    let mut generator = Generator::new(HttpGenerationApi::new(base_url), FAST_POLL);

    let err = generator.submit(GenerationRequest::new("p")).await.unwrap_err();
    assert_eq!(err, GenError::missing_job_id());
}

#[tokio::test]
async fn poll_error_body_is_surfaced() {
    let router = Router::new()
        .route("/generate", post(|| async { axum::Json(json!({ "job_id": "ghost" })) }))
        .route(
            "/generate/{job_id}",
            get(|| async { (StatusCode::NOT_FOUND, r#"{"detail":"Job not found"}"#) }),
        );
    let base_url = serve(router).await;
    let mut generator = Generator::new(HttpGenerationApi::new(base_url), FAST_POLL);

    let state = run_to_end(&mut generator, GenerationRequest::new("p")).await;
    assert_eq!(
        state.error_message(),
        Some(r#"status fetch failed: 404 {"detail":"Job not found"}"#)
    );
}

#[tokio::test]
async fn unreachable_backend_is_transport_error() {
    // Bind then drop to get a port nobody listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut generator = Generator::new(HttpGenerationApi::new(format!("http://{addr}")), FAST_POLL);
    let err = generator.submit(GenerationRequest::new("p")).await.unwrap_err();
    assert!(matches!(err, GenError::Transport(_)));
    assert_eq!(generator.state().status_text(), "error");
}
