//! Error types for the D-Wave adapter.

use anneal_hal::HalError;
use anneal_qmi::CompileError;
use thiserror::Error;

/// Result type for D-Wave operations.
pub type DwaveResult<T> = Result<T, DwaveError>;

/// Errors that can occur when interacting with the D-Wave SAPI service.
#[derive(Debug, Error)]
pub enum DwaveError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// QMI source could not be compiled.
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    /// Missing API token.
    #[error("Missing D-Wave API token (set DWAVE_API_KEY)")]
    MissingToken,

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// Problem not found.
    #[error("Problem not found: {0}")]
    JobNotFound(String),

    /// API error response.
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    /// A response body that does not have the expected shape.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Configuration file or value rejected.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<DwaveError> for HalError {
    fn from(e: DwaveError) -> Self {
        match e {
            DwaveError::MissingToken | DwaveError::Config(_) => {
                HalError::Configuration(e.to_string())
            }
            DwaveError::Compile(ref _err) => HalError::Compile(e.to_string()),
            DwaveError::JobNotFound(id) => HalError::JobNotFound(id),
            DwaveError::Json(err) => HalError::Serialization(err),
            DwaveError::Http(_)
            | DwaveError::AuthFailed(_)
            | DwaveError::ApiError { .. }
            | DwaveError::UnexpectedResponse(_) => {
                HalError::Transport(e.to_string())
            }
        }
    }
}
