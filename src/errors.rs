/*!
 * Error types for the srtlingo library.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when calling a completion provider
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The call did not finish within the per-call timeout
    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    /// The provider answered with nothing usable
    #[error("Provider returned an empty response")]
    EmptyResponse,
}

impl ProviderError {
    /// Whether another attempt may succeed.
    ///
    /// Authentication failures and client errors other than 408/429 will fail
    /// the same way on every attempt, so they end the chunk immediately.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RequestFailed(_)
            | Self::ParseError(_)
            | Self::ConnectionError(_)
            | Self::RateLimitExceeded(_)
            | Self::Timeout(_)
            | Self::EmptyResponse => true,
            Self::ApiError { status_code, .. } => {
                *status_code >= 500 || *status_code == 408 || *status_code == 429
            }
            Self::AuthenticationError(_) => false,
        }
    }
}

/// Errors that can occur during subtitle processing
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// A record that does not follow the `index / timestamps / text` layout
    #[error("Malformed cue near line {line}: {reason}")]
    MalformedCue {
        /// 1-based line number of the first line of the record
        line: usize,
        /// What was wrong with the record
        reason: String,
    },

    /// A timestamp that is not `HH:MM:SS,mmm`
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error with subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// A chunk ran out of attempts; carries the last provider error
    #[error("Chunk {chunk_index} failed after {attempts} attempt(s): {last_error}")]
    Exhausted {
        /// 0-based chunk number
        chunk_index: usize,
        /// Number of completion calls performed
        attempts: u32,
        /// The error returned by the last call
        last_error: ProviderError,
    },

    /// The caller cancelled the run
    #[error("Translation cancelled")]
    Cancelled,

    /// The requested prompt style is not registered
    #[error("No such prompt template: {0}")]
    UnknownTemplate(String),

    /// A configuration value is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
