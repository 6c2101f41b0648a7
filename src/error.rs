use std::time::Duration;
use thiserror::Error;

/// Errors produced by the pipeline and its components.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Neither a CSV upload nor pasted text was supplied.
    ///
    /// Raised before any backend is constructed or called.
    #[error("No requirements supplied: upload a CSV file or paste text")]
    MissingInput,

    /// The supplied input could not be normalized (unreadable or ragged CSV,
    /// invalid UTF-8, size limit).
    #[error("Invalid requirements input: {0}")]
    InvalidInput(String),

    /// The requested backend identifier is not one the dispatcher knows.
    #[error("Unsupported backend '{0}'")]
    UnsupportedBackend(String),

    /// A known backend was requested but its credential is not configured.
    #[error("Backend '{backend}' is not configured: set the {env_var} environment variable")]
    MissingCredential {
        /// Provider display name.
        backend: &'static str,
        /// Environment variable the credential is read from.
        env_var: String,
    },

    /// A stage's completion call failed and the run was aborted.
    ///
    /// Stages after `stage` were never issued.
    #[error("Stage {stage} ({stage_name}) failed on {backend}: {source}")]
    StageFailed {
        /// 1-based stage number.
        stage: usize,
        /// Short stage name (e.g. `"diagram"`).
        stage_name: &'static str,
        /// Provider display name of the backend in use.
        backend: &'static str,
        /// The underlying provider-call failure.
        #[source]
        source: Box<PipelineError>,
    },

    /// HTTP error with status code, response body, and optional Retry-After hint.
    ///
    /// The `retry_after` field is populated from the `Retry-After` response
    /// header when present, so a caller can decide whether to resubmit.
    #[error("HTTP {status}: {body}")]
    HttpError {
        /// HTTP status code (e.g. 401, 429, 500).
        status: u16,
        /// Response body text.
        body: String,
        /// Parsed `Retry-After` header value, if present.
        retry_after: Option<Duration>,
    },

    /// Low-level HTTP transport failure (connection refused, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON parsing failed at the serde level.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// The provider answered, but not in a shape the adapter can read.
    #[error("Malformed response from {backend}: {message}")]
    MalformedResponse {
        backend: &'static str,
        message: String,
    },

    /// Invalid configuration detected while loading or building.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(String),
}

impl PipelineError {
    /// Whether this error was raised before any provider call was made.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            PipelineError::MissingInput
                | PipelineError::InvalidInput(_)
                | PipelineError::UnsupportedBackend(_)
        )
    }

    /// The 1-based stage number of a [`PipelineError::StageFailed`] error.
    pub fn failed_stage(&self) -> Option<usize> {
        match self {
            PipelineError::StageFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_failed_message_names_stage_and_backend() {
        let err = PipelineError::StageFailed {
            stage: 3,
            stage_name: "diagram",
            backend: "Gemini",
            source: Box::new(PipelineError::HttpError {
                status: 503,
                body: "overloaded".into(),
                retry_after: None,
            }),
        };
        let msg = err.to_string();
        assert_eq!(msg, "Stage 3 (diagram) failed on Gemini: HTTP 503: overloaded");
        assert_eq!(err.failed_stage(), Some(3));
        assert!(!err.is_input_error());
    }

    #[test]
    fn test_stage_failed_exposes_source() {
        use std::error::Error as _;

        let err = PipelineError::StageFailed {
            stage: 1,
            stage_name: "rewrite",
            backend: "ChatGPT",
            source: Box::new(PipelineError::Other("boom".into())),
        };
        let source = err.source().expect("source");
        assert_eq!(source.to_string(), "boom");
    }

    #[test]
    fn test_input_errors_are_cheap() {
        assert!(PipelineError::MissingInput.is_input_error());
        assert!(PipelineError::UnsupportedBackend("Claude".into()).is_input_error());
        assert!(PipelineError::InvalidInput("x".into()).is_input_error());
        assert_eq!(PipelineError::MissingInput.failed_stage(), None);
    }

    #[test]
    fn test_missing_credential_message() {
        let err = PipelineError::MissingCredential {
            backend: "DeepSeek",
            env_var: "DEEPSEEK_API_KEY".into(),
        };
        assert!(err.to_string().contains("DEEPSEEK_API_KEY"));
    }
}
