use thiserror::Error;

use crate::path::PathKind;

pub type Result<T> = std::result::Result<T, DashError>;

#[derive(Debug, Error)]
pub enum DashError {
    #[error("invalid path type: {0}")]
    UnrecognizedPathKind(String),

    #[error("{kind} path is missing {component} at position {position}")]
    MissingPathComponent {
        kind: PathKind,
        position: usize,
        component: &'static str,
    },

    #[error("{kind} path has unexpected component {value:?} at position {position}")]
    UnexpectedPathComponent {
        kind: PathKind,
        position: usize,
        value: String,
    },

    #[error("{component} is not an epoch millisecond value: {value:?}")]
    InvalidMillis {
        component: &'static str,
        value: String,
    },

    #[error("malformed function token {token:?}: {reason}")]
    MalformedFunctionToken { token: String, reason: String },

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("cannot build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("cannot resolve {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("fetch of {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("fetch of {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("fetch of {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("fetch of {url} was cancelled")]
    Cancelled { url: String },
}

impl DashError {
    /// Whether a failed fetch is worth repeating.
    pub fn is_retryable(&self) -> bool {
        match self {
            DashError::Timeout { .. } => true,
            DashError::Status { status, .. } => is_retryable_http_status(*status),
            DashError::Fetch { source, .. } => {
                source.is_timeout() || source.is_connect() || source.is_request()
            }
            _ => false,
        }
    }
}

pub fn is_retryable_http_status(status: u16) -> bool {
    matches!(status,
        408 |   // Request Timeout
        429 |   // Too Many Requests
        500 |   // Internal Server Error
        502 |   // Bad Gateway
        503 |   // Service Unavailable
        504     // Gateway Timeout
    )
}
