//! Platform error types.

use serde_json::Value;
use thiserror::Error;

pub type PlatformResult<T> = Result<T, PlatformError>;

/// Sentinel `id` the platform uses for a missing account, app or build.
pub const NOT_FOUND_ID: &str = "not_found";

/// Sentinel `id` the platform uses for a rejected payload.
pub const INVALID_PARAMS_ID: &str = "invalid_params";

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("platform error {id}: {message}")]
    Api { id: String, message: String },

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("decode error: {0}")]
    Decode(String),
}

impl PlatformError {
    /// Interpret a sentinel error object embedded in a response body.
    pub fn from_sentinel(body: &Value) -> Option<Self> {
        let id = body.get("id")?.as_str()?;
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or(id)
            .to_string();
        match id {
            NOT_FOUND_ID => Some(Self::NotFound(message)),
            INVALID_PARAMS_ID => Some(Self::InvalidParams(message)),
            _ => None,
        }
    }

    /// Build the error for a non-2xx response that carried no sentinel.
    pub fn from_status(status: u16, body: &Value) -> Self {
        match (body.get("id").and_then(Value::as_str), body.get("message").and_then(Value::as_str)) {
            (Some(id), Some(message)) => Self::Api {
                id: id.to_string(),
                message: message.to_string(),
            },
            _ => Self::Status {
                status,
                body: body.to_string(),
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
