//! Mapping of HTTP failures onto domain errors

use emomap_core::DomainError;
use serde::Deserialize;

/// Error body: `{"error": "..."}` or `{"message": "..."}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Turn a non-2xx status and its body into a domain error
pub fn status_error(status: u16, body: &str) -> DomainError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error.or(b.message))
        .unwrap_or_default();

    match status {
        401 => DomainError::Unauthorized(message),
        403 => DomainError::Forbidden(message),
        404 => DomainError::NotFound(message),
        _ => DomainError::Backend { status, message },
    }
}

/// Turn a transport failure into a domain error
pub fn transport_error(err: reqwest::Error) -> DomainError {
    if err.is_decode() {
        DomainError::Decode(err.to_string())
    } else if err.is_timeout() {
        DomainError::Network("request timed out".to_string())
    } else if err.is_builder() {
        DomainError::InternalError(err.to_string())
    } else {
        DomainError::Network(err.to_string())
    }
}
