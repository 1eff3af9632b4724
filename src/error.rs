use thiserror::Error;

/// Top-level error type for the payments service
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Ledger store error: {0}")]
    Store(#[from] redis::RedisError),

    #[error("RPC error calling {method}: {message}")]
    Rpc { method: String, message: String },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response from {method}: {message}")]
    InvalidResponse { method: String, message: String },

    /// The wallet accepted the transfer call but its reply is unusable, so
    /// value may have left the wallet
    #[error("Unconfirmed submission via {method}: {message}")]
    AmbiguousSubmission { method: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn rpc(method: &str, message: impl Into<String>) -> Self {
        AppError::Rpc {
            method: method.to_string(),
            message: message.into(),
        }
    }

    pub fn invalid_response(method: &str, message: impl Into<String>) -> Self {
        AppError::InvalidResponse {
            method: method.to_string(),
            message: message.into(),
        }
    }

    pub fn ambiguous_submission(method: &str, message: impl Into<String>) -> Self {
        AppError::AmbiguousSubmission {
            method: method.to_string(),
            message: message.into(),
        }
    }

    /// Value may have been sent even though the call failed
    pub fn is_ambiguous_submission(&self) -> bool {
        matches!(self, AppError::AmbiguousSubmission { .. })
    }
}

impl From<config::ConfigError> for AppError {
    fn from(error: config::ConfigError) -> Self {
        AppError::Config(error.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(error: validator::ValidationErrors) -> Self {
        AppError::Config(format!("Invalid configuration: {}", error))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal(format!("Error converting: {:?}", error))
    }
}

/// Result type alias for the application
pub type AppResult<T> = Result<T, AppError>;
