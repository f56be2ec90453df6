use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use ig_core::{GenerationRequest, JobStatus};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use crate::config::{ClientConfig, PollConfig};
use crate::error::GenError;
use crate::generator::backend::{GenerationApi, HttpGenerationApi};
use crate::state::{ClientState, JobHandle};

pub mod backend;

/// Submits generation jobs and polls them to completion.
///
/// Owns at most one poll task. Every new submission stops the previous
/// task before anything else happens, and dropping the generator stops it
/// too.
pub struct Generator<A: GenerationApi> {
    api: Arc<A>,
    poll: PollConfig,
    // Filled into requests that carry no `base_url` of their own.
    default_base_url: Option<String>,
    state_tx: Arc<watch::Sender<ClientState>>,
    // Bumped on every cancellation; a poll task only writes state while
    // this still equals the run it was started for.
    run: Arc<AtomicU64>,
    poll_task: Option<JoinHandle<()>>,
}

impl Generator<HttpGenerationApi> {
    pub fn from_config(conf: &ClientConfig) -> Self {
        Self::new(HttpGenerationApi::new(conf.base_url.clone()), conf.poll)
            .with_default_base_url(conf.base_url.clone())
    }
}

impl<A: GenerationApi> Generator<A> {
    pub fn new(api: A, poll: PollConfig) -> Self {
        let (state_tx, _) = watch::channel(ClientState::Idle);

        Self {
            api: Arc::new(api),
            poll,
            default_base_url: None,
            state_tx: Arc::new(state_tx),
            run: Arc::new(AtomicU64::new(0)),
            poll_task: None,
        }
    }

    /// Base URL sent with requests that leave `base_url` unset, so the
    /// backend builds image links against it.
    pub fn with_default_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.default_base_url = Some(base_url.into());
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn state(&self) -> ClientState {
        self.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ClientState> {
        self.state_tx.subscribe()
    }

    pub fn is_polling(&self) -> bool {
        self.poll_task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Submit a job and start polling it.
    ///
    /// Any poll loop from an earlier submission is torn down first. On
    /// failure the state moves to `Error` and no poll task is started.
    pub async fn submit(&mut self, mut request: GenerationRequest) -> Result<JobHandle, GenError> {
        self.stop_polling();
        if request.base_url.is_none() {
            request.base_url = self.default_base_url.clone();
        }
        let guard = self.guard();

        guard.publish(ClientState::Submitting);
        info!(prompt = %request.prompt, provider = %request.provider, "Submitting generation job");

        let job_id = match self.create(&request).await {
            Ok(id) => id,
            Err(e) => {
                error!("Job submission failed: {}", e);
                guard.publish(ClientState::Error {
                    job_id: None,
                    status: "error".into(),
                    message: e.to_string(),
                });
                return Err(e);
            }
        };

        info!(%job_id, "Job queued");
        guard.publish(ClientState::queued(&job_id));

        let poll_loop = PollLoop {
            api: self.api.clone(),
            poll: self.poll,
            job_id: job_id.clone(),
            guard,
        };
        self.poll_task = Some(tokio::spawn(poll_loop.run()));

        Ok(JobHandle::new(job_id, self.state_tx.subscribe()))
    }

    /// Stop polling the current job, if any.
    ///
    /// A job that was still in flight leaves the generator `Idle`; finished
    /// states are kept so their results stay readable.
    pub fn cancel(&mut self) {
        self.stop_polling();
        self.state_tx.send_if_modified(|state| {
            if state.is_busy() {
                *state = ClientState::Idle;
                true
            } else {
                false
            }
        });
    }

    async fn create(&self, request: &GenerationRequest) -> Result<String, GenError> {
        let created = self.api.create_job(request).await?;

        created
            .job_id
            .filter(|id| !id.is_empty())
            .ok_or_else(GenError::missing_job_id)
    }

    fn stop_polling(&mut self) {
        self.run.fetch_add(1, Ordering::SeqCst);

        if let Some(task) = self.poll_task.take() {
            if !task.is_finished() {
                debug!("Stopping active poll loop");
            }
            task.abort();
        }
    }

    fn guard(&self) -> RunGuard {
        RunGuard {
            run: self.run.load(Ordering::SeqCst),
            current: self.run.clone(),
            state_tx: self.state_tx.clone(),
        }
    }
}

impl<A: GenerationApi> Drop for Generator<A> {
    fn drop(&mut self) {
        self.stop_polling();
    }
}

/// State writer tied to one run of the generator.
struct RunGuard {
    run: u64,
    current: Arc<AtomicU64>,
    state_tx: Arc<watch::Sender<ClientState>>,
}

impl RunGuard {
    /// Returns false when the write was dropped because the run is stale or
    /// the state did not change.
    fn publish(&self, next: ClientState) -> bool {
        self.state_tx.send_if_modified(|state| {
            if self.current.load(Ordering::SeqCst) != self.run || *state == next {
                return false;
            }
            *state = next;
            true
        })
    }
}

struct PollLoop<A> {
    api: Arc<A>,
    poll: PollConfig,
    job_id: String,
    guard: RunGuard,
}

impl<A: GenerationApi> PollLoop<A> {
    async fn run(self) {
        let period = self.poll.period();
        let mut ticker = time::interval_at(Instant::now() + period, period);
        // A slow status call pushes the next tick back instead of bunching ticks up.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut failures = 0u32;

        loop {
            ticker.tick().await;

            let resp = match self.api.job_status(&self.job_id).await {
                Ok(resp) => {
                    failures = 0;
                    resp
                }
                Err(e) => {
                    failures += 1;
                    if failures <= self.poll.retries {
                        warn!(job_id = %self.job_id, attempt = failures, "Status check failed, retrying: {}", e);
                        continue;
                    }
                    error!(job_id = %self.job_id, "Status check failed: {}", e);
                    self.finish(ClientState::Error {
                        job_id: Some(self.job_id.clone()),
                        status: "poll error".into(),
                        message: e.to_string(),
                    });
                    return;
                }
            };

            let Some(status) = resp.status else {
                debug!(job_id = %self.job_id, "Status response without status field");
                continue;
            };

            match JobStatus::parse(&status) {
                Some(JobStatus::Success) => {
                    let images = resp.images.unwrap_or_default();
                    info!(job_id = %self.job_id, count = images.len(), "Job complete");
                    self.finish(ClientState::Done { job_id: self.job_id.clone(), images });
                    return;
                }
                Some(JobStatus::Failed | JobStatus::Aborted) => {
                    let failure = GenError::JobFailure(resp.error.unwrap_or_else(|| "Job failed".into()));
                    warn!(job_id = %self.job_id, %status, "Job ended without results: {}", failure);
                    self.finish(ClientState::Error {
                        job_id: Some(self.job_id.clone()),
                        status,
                        message: failure.to_string(),
                    });
                    return;
                }
                Some(known) if known.is_active() => {
                    debug!(job_id = %self.job_id, %status, "Job still in progress");
                    self.guard.publish(ClientState::Queued { job_id: self.job_id.clone(), status });
                }
                _ => {
                    debug!(job_id = %self.job_id, %status, "Unrecognised job status, still polling");
                    self.guard.publish(ClientState::Queued { job_id: self.job_id.clone(), status });
                }
            }
        }
    }

    fn finish(&self, state: ClientState) {
        if !self.guard.publish(state) {
            debug!(job_id = %self.job_id, "Dropped terminal state from a superseded run");
        }
    }
}
