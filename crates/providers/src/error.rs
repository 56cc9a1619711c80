use thiserror::Error;

/// Failure of a generative service call
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("malformed response: {0}")]
    Schema(String),

    #[error("empty result: {0}")]
    EmptyResult(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("operation timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("configuration error: {0}")]
    Config(String),
}

impl ServiceError {
    pub fn schema(message: impl Into<String>) -> Self {
        ServiceError::Schema(message.into())
    }

    pub fn empty(message: impl Into<String>) -> Self {
        ServiceError::EmptyResult(message.into())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        ServiceError::Schema(e.to_string())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
