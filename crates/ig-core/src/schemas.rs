use serde::{Deserialize, Serialize};
use crate::ResultImage;

/// Body returned by `POST /generate`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct JobCreateResponse {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub queued: Option<bool>,
}

/// Body returned by `GET /generate/{job_id}`.
///
/// Every field is optional so that a reply missing `status` can still be
/// decoded and handled as "no news yet".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct JobStatusResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<ResultImage>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl JobStatusResponse {
    pub fn with_status(status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
            ..Default::default()
        }
    }
}
