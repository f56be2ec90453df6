use anyhow::bail;
use clap::Parser;
use ig_app::config::resolve_base_url;
use ig_app::{ClientConfig, ClientState, Generator};
use ig_core::{GenerationRequest, DEFAULT_PROVIDER};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Submit an image generation job and wait for the results.
#[derive(Parser, Debug)]
#[command(name = "ig-app", version)]
struct Args {
    prompt: String,

    #[arg(long, default_value_t = 512, allow_negative_numbers = true)]
    width: i64,

    #[arg(long, default_value_t = 512, allow_negative_numbers = true)]
    height: i64,

    #[arg(long, default_value_t = 20, allow_negative_numbers = true)]
    steps: i64,

    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    batch: i64,

    #[arg(long, default_value = DEFAULT_PROVIDER)]
    provider: String,

    #[arg(long)]
    seed: Option<i64>,

    /// Overrides IG_API_BASE_URL
    #[arg(long)]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let mut conf = ClientConfig::load()?;
    if args.base_url.is_some() {
        conf.base_url = resolve_base_url(args.base_url);
    }
    info!("Using generation backend at {}", conf.base_url);

    let mut request = GenerationRequest::new(args.prompt)
        .with_size(args.width, args.height)
        .with_steps(args.steps)
        .with_batch(args.batch)
        .with_provider(args.provider);
    if let Some(seed) = args.seed {
        request = request.with_seed(seed);
    }

    let mut generator = Generator::from_config(&conf);
    let logger = tokio::spawn(log_status(generator.subscribe()));

    let mut handle = generator.submit(request).await?;
    let job_id = handle.job_id().to_string();

    let outcome = tokio::select! {
        state = handle.wait() => state,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, cancelling job {}", job_id);
            generator.cancel();
            None
        }
    };
    logger.abort();

    match outcome {
        Some(ClientState::Done { images, .. }) => {
            if images.is_empty() {
                info!("Job {} finished without images", job_id);
            }
            for image in &images {
                println!("{}", image.url);
            }
            Ok(())
        }
        Some(ClientState::Error { message, .. }) => bail!("job {job_id} failed: {message}"),
        _ => bail!("job {job_id} cancelled"),
    }
}

async fn log_status(mut states: watch::Receiver<ClientState>) {
    while states.changed().await.is_ok() {
        let state = states.borrow_and_update().clone();
        info!("Status: {}", state.status_text());
    }
}
