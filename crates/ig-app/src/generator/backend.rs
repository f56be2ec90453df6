use async_trait::async_trait;
use ig_core::GenerationRequest;
use ig_core::schemas::{JobCreateResponse, JobStatusResponse};
use tracing::debug;
use crate::error::GenError;

/// The two calls the generator makes against the generation backend.
#[async_trait]
pub trait GenerationApi: Send + Sync + 'static {
    async fn create_job(&self, request: &GenerationRequest) -> Result<JobCreateResponse, GenError>;

    async fn job_status(&self, job_id: &str) -> Result<JobStatusResponse, GenError>;
}

/// `GenerationApi` over HTTP.
///
/// No request timeout is set; the poll interval bounds how stale the
/// client's view can get.
pub struct HttpGenerationApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGenerationApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn generate_url(&self) -> String {
        format!("{}/generate", self.base_url)
    }
}

#[async_trait]
impl GenerationApi for HttpGenerationApi {
    async fn create_job(&self, request: &GenerationRequest) -> Result<JobCreateResponse, GenError> {
        let url = self.generate_url();
        debug!(%url, "Submitting generation job");

        let response = self.client.post(url).json(request).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GenError::Submission { status, body });
        }

        Ok(response.json().await?)
    }

    async fn job_status(&self, job_id: &str) -> Result<JobStatusResponse, GenError> {
        let url = format!("{}/{}", self.generate_url(), job_id);

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GenError::Poll { status, body });
        }

        Ok(response.json().await?)
    }
}
