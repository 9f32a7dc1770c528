use crate::shared::error::AppError;
use thiserror::Error;

/// Classified failure of a single outbound request.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Request failed: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Credential refused ({status})")]
    Unauthenticated { status: u16 },

    #[error("Server rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for DispatchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DispatchError::Timeout(err.to_string())
        } else {
            DispatchError::Network(err.to_string())
        }
    }
}

impl From<DispatchError> for AppError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Network(msg) => AppError::Network(msg),
            DispatchError::Timeout(msg) => AppError::Timeout(msg),
            DispatchError::Unauthenticated { status } => {
                AppError::Unauthenticated(format!("server returned {status}"))
            }
            DispatchError::Rejected { status, body } => AppError::ServerRejected {
                status,
                message: body,
            },
            DispatchError::InvalidEndpoint(msg) => AppError::ConfigurationError(msg),
            // A success status with an unreadable body still counts as a failed delivery.
            DispatchError::MalformedResponse(msg) => AppError::Network(msg),
        }
    }
}
