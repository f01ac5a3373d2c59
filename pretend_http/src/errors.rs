use pretend_ratelimit::RateLimitError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PretendError {
    #[error("Missing required argument: {0}")]
    MissingArgument(&'static str),

    #[error("Invalid argument `{name}`: expected {expected}")]
    InvalidArgument { name: &'static str, expected: &'static str },

    #[error("Unexpected response: {status} - {body}")]
    UnexpectedResponse { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Invalid rate limit: {0}")]
    InvalidConfig(#[from] RateLimitError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Base URL cannot carry path segments: {0}")]
    InvalidBaseUrl(String),

    #[error("API key is not a valid header value")]
    InvalidApiKey,
}

impl PretendError {
    /// Whether the failure happened in the transport or while decoding the body
    ///
    /// These are the failures raised after the gate admitted the request.
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, PretendError::RequestFailed(_) | PretendError::JsonError(_) | PretendError::Transport(_))
    }

    /// HTTP status carried by an unexpected response
    pub fn status(&self) -> Option<u16> {
        match self {
            PretendError::UnexpectedResponse { status, .. } => Some(*status),
            PretendError::RequestFailed(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PretendError>;
