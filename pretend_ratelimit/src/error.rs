use thiserror::Error;

/// Result type for gate operations
pub type Result<T> = std::result::Result<T, RateLimitError>;

/// Errors that can occur while configuring a gate
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitError {
    /// Invalid configuration
    #[error("Invalid rate limiter configuration: {0}")]
    InvalidConfig(&'static str),
}
