use thiserror::Error;

/// Errors reported by the callback API.
///
/// A rejected token is never retryable: the waiting caller has either
/// already received a report or stopped waiting.
#[derive(Debug, Error)]
pub enum CallbackError {
    #[error("callback token rejected: {message}")]
    TokenRejected { message: String },

    #[error("callback API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}
