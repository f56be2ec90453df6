use anyhow::Context;
use ig_backend::config::BackendConfig;
use ig_backend::state::BackendState;
use ig_backend::store::JobStore;
use ig_backend::worker::JobWorker;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let conf = BackendConfig::load()?;

    std::fs::create_dir_all(conf.thumbs_dir())
        .with_context(|| format!("Failed to create {}", conf.thumbs_dir().display()))?;

    let store = JobStore::new();
    let (queue_tx, queue_rx) = mpsc::channel(conf.queue_capacity);

    let worker = JobWorker::new(
        store.clone(),
        ig_backend::providers_from_config(&conf),
        conf.generated_dir.clone(),
        conf.base_url.clone(),
    );
    let worker_task = tokio::spawn(worker.run(queue_rx));

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], conf.port));
    let app = ig_backend::app(BackendState::new(store, queue_tx, conf));

    info!("Starting generation backend on {}", addr);
    let listener = TcpListener::bind(addr).await.context("Failed to bind")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed")?;

    // The router (and its queue sender) is gone; let the worker finish the backlog.
    info!("Waiting for the worker to drain the queue...");
    worker_task.await?;
    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install CTRL+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received CTRL+C, shutting down");
}
