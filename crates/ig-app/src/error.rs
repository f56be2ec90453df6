use thiserror::Error;

/// Everything that can end a generation run on the client side.
///
/// All variants are terminal for the current job; the user recovers by
/// submitting again.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenError {
    #[error("Create job failed: {status} {body}")]
    Submission { status: u16, body: String },

    #[error("malformed response: {0}")]
    Protocol(String),

    #[error("status fetch failed: {status} {body}")]
    Poll { status: u16, body: String },

    #[error("{0}")]
    JobFailure(String),

    #[error("Error from backend: {0}")]
    Transport(String),

    #[error("Failed to parse response: {0}")]
    Decode(String),
}

impl GenError {
    pub fn missing_job_id() -> Self {
        Self::Protocol("missing job identifier".into())
    }
}

impl From<reqwest::Error> for GenError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_status_and_body() {
        let e = GenError::Submission { status: 500, body: "db down".into() };
        assert_eq!(e.to_string(), "Create job failed: 500 db down");

        let e = GenError::missing_job_id();
        assert_eq!(e.to_string(), "malformed response: missing job identifier");
    }
}
