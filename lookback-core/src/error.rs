//! Error types shared by the request pipeline and the search flow.

use reqwest::StatusCode;
use thiserror::Error;

/// Why a single request attempt failed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// No response reached the client (connection refused, DNS, timeout, ...).
    #[error("{0}")]
    Transport(String),

    /// The request could not be built (bad URL, bad parameters).
    #[error("{0}")]
    InvalidRequest(String),

    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// A response arrived but its body could not be decoded.
    #[error("invalid response body: {source}")]
    Decode {
        status: StatusCode,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            FetchError::Transport(_) | FetchError::InvalidRequest(_) => None,
            FetchError::Status { status, .. } | FetchError::Decode { status, .. } => Some(*status),
        }
    }
}

/// How the retry policy treats a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Network loss or server fault; worth retrying unchanged.
    Transient,
    /// Client fault or malformed response; retrying will not help.
    ClientError,
}

/// Final failure of a pipeline call, after retries.
///
/// `message` is the text already shown to the user.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct PipelineError {
    pub message: String,
    pub class: ErrorClass,
    pub attempts: u32,
    #[source]
    pub source: FetchError,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Address not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Request(#[from] PipelineError),
}
