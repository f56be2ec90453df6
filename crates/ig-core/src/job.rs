use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status vocabulary used by the generation backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Success,
    Failed,
    Aborted,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Aborted => "aborted",
        }
    }

    /// Unknown strings are not an error; callers keep polling on them.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(Self::Queued),
            "running" => Some(Self::Running),
            "success" => Some(Self::Success),
            "failed" => Some(Self::Failed),
            "aborted" => Some(Self::Aborted),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Queued | Self::Running)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Aborted)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One generated asset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ResultImage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nsfw: Option<bool>,
}

impl ResultImage {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// URL to show in a listing, preferring the thumbnail
    pub fn display_url(&self) -> &str {
        self.thumbnail.as_deref().unwrap_or(&self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(JobStatus::Success.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Aborted.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Queued.is_active());
    }

    #[test]
    fn parse_accepts_wire_names_only() {
        assert_eq!(JobStatus::parse("aborted"), Some(JobStatus::Aborted));
        assert_eq!(JobStatus::parse("SUCCESS"), None);
        assert_eq!(JobStatus::parse("processing"), None);
    }

    #[test]
    fn image_with_only_url_deserializes() {
        let img: ResultImage = serde_json::from_str(r#"{"url":"u1"}"#).unwrap();
        assert_eq!(img, ResultImage::from_url("u1"));
        assert_eq!(img.display_url(), "u1");
    }
}
