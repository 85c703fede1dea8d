use thiserror::Error;

/// Failures talking to the REST backend.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("not authenticated")]
    Unauthenticated,

    #[error("request failed: {0}")]
    Request(#[from] reqwest_middleware::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

impl ClientError {
    /// Whether the backend rejected the call for lack of credentials.
    pub fn is_auth(&self) -> bool {
        match self {
            ClientError::Unauthenticated => true,
            ClientError::Status { status, .. } => {
                *status == reqwest::StatusCode::UNAUTHORIZED
                    || *status == reqwest::StatusCode::FORBIDDEN
            }
            _ => false,
        }
    }
}

/// Failures reading or writing the seen-registry backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("corrupt registry contents: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("unsupported store url: {0}")]
    Unsupported(String),
}
