use shared::error::{ApiError, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("service unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("unexpected response: {0}")]
    Unexpected(String),
}

impl ClientError {
    /// Classifies an error body returned by the server together with its status.
    pub fn from_response(status: reqwest::StatusCode, body: Option<ApiError>) -> Self {
        let message = body
            .as_ref()
            .map(|e| e.message.clone())
            .unwrap_or_else(|| status.to_string());
        match body.map(|e| e.code) {
            Some(ErrorCode::NotFound) => return ClientError::NotFound(message),
            Some(ErrorCode::Validation) => return ClientError::Validation(message),
            Some(ErrorCode::UpstreamUnavailable) => {
                return ClientError::UpstreamUnavailable(message)
            }
            Some(ErrorCode::Internal) | None => {}
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            ClientError::NotFound(message)
        } else if status.is_server_error() {
            ClientError::UpstreamUnavailable(message)
        } else if status.is_client_error() {
            ClientError::Validation(message)
        } else {
            ClientError::Unexpected(message)
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Unexpected(err.to_string())
        } else {
            ClientError::UpstreamUnavailable(err.to_string())
        }
    }
}
