use ig_core::ResultImage;
use tokio::sync::watch;

/// What the generator currently shows to its consumer.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ClientState {
    #[default]
    Idle,
    Submitting,
    /// Job accepted; `status` is the last status text, verbatim from the
    /// backend once the first poll has answered.
    Queued { job_id: String, status: String },
    Done { job_id: String, images: Vec<ResultImage> },
    /// `status` is what to display: the backend's own terminal status when
    /// the job failed there, `poll error` when a status check failed, and
    /// `error` when the submission itself failed.
    Error { job_id: Option<String>, status: String, message: String },
}

impl ClientState {
    pub fn queued(job_id: impl Into<String>) -> Self {
        let job_id = job_id.into();
        Self::Queued {
            status: format!("queued: {job_id}"),
            job_id,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }

    /// Whether a job is in flight (the "Generating..." state of the UI).
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Submitting | Self::Queued { .. })
    }

    pub fn job_id(&self) -> Option<&str> {
        match self {
            Self::Queued { job_id, .. } | Self::Done { job_id, .. } => Some(job_id),
            Self::Error { job_id, .. } => job_id.as_deref(),
            Self::Idle | Self::Submitting => None,
        }
    }

    /// One-line status for display
    pub fn status_text(&self) -> &str {
        match self {
            Self::Idle => "idle",
            Self::Submitting => "sending...",
            Self::Queued { status, .. } | Self::Error { status, .. } => status,
            Self::Done { .. } => "success",
        }
    }

    pub fn images(&self) -> &[ResultImage] {
        match self {
            Self::Done { images, .. } => images,
            _ => &[],
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// Returned by a successful submission.
#[derive(Debug, Clone)]
pub struct JobHandle {
    job_id: String,
    state_rx: watch::Receiver<ClientState>,
}

impl JobHandle {
    pub(crate) fn new(job_id: String, state_rx: watch::Receiver<ClientState>) -> Self {
        Self { job_id, state_rx }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn state(&self) -> ClientState {
        self.state_rx.borrow().clone()
    }

    /// Wait until this job reaches `Done` or `Error`.
    ///
    /// Returns `None` if the run was superseded by a newer submission or the
    /// generator was dropped before the job finished.
    pub async fn wait(&mut self) -> Option<ClientState> {
        loop {
            {
                let state = self.state_rx.borrow_and_update();
                match state.job_id() {
                    Some(id) if id == self.job_id => {
                        if state.is_terminal() {
                            return Some(state.clone());
                        }
                    }
                    _ => return None,
                }
            }

            if self.state_rx.changed().await.is_err() {
                return None;
            }
        }
    }
}
