use std::time::Duration;
use thiserror::Error;

fn human(d: &Duration) -> humantime::FormattedDuration {
    humantime::format_duration(*d)
}

#[derive(Error, Debug)]
pub enum AiError {
    #[error("AI API key is missing; set CAMPUSAI_API_KEY or ai.api_key in the config file")]
    MissingApiKey,

    #[error("AI request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AI service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("AI service returned no text")]
    EmptyResponse,

    #[error("malformed AI response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("AI request timed out after {}", human(.0))]
    TimedOut(Duration),

    #[error("AI request was cancelled")]
    Cancelled,

    #[error("AI response discarded: a newer request superseded it")]
    Stale,
}

impl AiError {
    /// Worth another attempt: transport failures, rate limiting and server errors.
    pub fn is_transient(&self) -> bool {
        match self {
            AiError::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            AiError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_statuses() {
        let status = |status| AiError::Status {
            status,
            body: String::new(),
        };
        assert!(status(429).is_transient());
        assert!(status(503).is_transient());
        assert!(!status(400).is_transient());
        assert!(!status(403).is_transient());
        assert!(!AiError::MissingApiKey.is_transient());
        assert!(!AiError::Stale.is_transient());
    }

    #[test]
    fn test_timeout_message_is_human() {
        let msg = AiError::TimedOut(Duration::from_secs(30)).to_string();
        assert_eq!(msg, "AI request timed out after 30s");
    }
}
