use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    /// Token refresh or re-authentication rejected by the token endpoint,
    /// or a second 401 after the single retried call.
    #[error("authentication failed: {status} {body}")]
    Auth { status: u16, body: String },

    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// Non-2xx, non-401 status from the relay endpoint.
    #[error("remote error: {status} {body}")]
    Remote { status: u16, body: String },

    /// Response body could not be decoded into a payload.
    #[error("protocol decode error: {0}")]
    Decode(String),

    /// Inbound line was not a valid envelope.
    #[error("malformed request: {0}")]
    Malformed(String),

    #[error("credential error: {0}")]
    Credential(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// Implement alias for Result to simplify usage
pub type RelayResult<T> = Result<T, RelayError>;
