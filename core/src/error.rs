//! Error types for the Places client.
//!
//! # Design
//! `InvalidArgument` is raised before any request is built, so a failed
//! validation never reaches the network. `RemoteRejected` keeps the remote
//! `status` token verbatim because callers branch on it (`ZERO_RESULTS` is
//! routine, `OVER_QUERY_LIMIT` is not). Transport and decoding failures are
//! passed through with their original message.

use thiserror::Error;

use crate::http::TransportError;

/// Errors returned by `PlacesClient` and `GooglePlaces`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A caller-supplied parameter failed local validation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The service answered, but its `status` field was not `OK`.
    #[error("request rejected by the Places service: {status}")]
    RemoteRejected { status: String },

    /// The server returned a non-2xx HTTP status.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be decoded into the expected shape.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The transport could not complete the exchange.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ApiError {
    /// The remote status token, for `RemoteRejected` errors.
    pub fn status(&self) -> Option<RemoteStatus> {
        match self {
            ApiError::RemoteRejected { status } => Some(RemoteStatus::from_token(status)),
            _ => None,
        }
    }
}

/// Classification of the `status` tokens documented by the Places API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    Ok,
    ZeroResults,
    OverQueryLimit,
    RequestDenied,
    InvalidRequest,
    UnknownError,
    NotFound,
    Other(String),
}

impl RemoteStatus {
    pub fn from_token(token: &str) -> Self {
        match token {
            "OK" => RemoteStatus::Ok,
            "ZERO_RESULTS" => RemoteStatus::ZeroResults,
            "OVER_QUERY_LIMIT" => RemoteStatus::OverQueryLimit,
            "REQUEST_DENIED" => RemoteStatus::RequestDenied,
            "INVALID_REQUEST" => RemoteStatus::InvalidRequest,
            "UNKNOWN_ERROR" => RemoteStatus::UnknownError,
            "NOT_FOUND" => RemoteStatus::NotFound,
            other => RemoteStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RemoteStatus::Ok => "OK",
            RemoteStatus::ZeroResults => "ZERO_RESULTS",
            RemoteStatus::OverQueryLimit => "OVER_QUERY_LIMIT",
            RemoteStatus::RequestDenied => "REQUEST_DENIED",
            RemoteStatus::InvalidRequest => "INVALID_REQUEST",
            RemoteStatus::UnknownError => "UNKNOWN_ERROR",
            RemoteStatus::NotFound => "NOT_FOUND",
            RemoteStatus::Other(token) => token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_rejected_exposes_status() {
        let err = ApiError::RemoteRejected {
            status: "OVER_QUERY_LIMIT".to_string(),
        };
        assert_eq!(err.status(), Some(RemoteStatus::OverQueryLimit));
        assert_eq!(
            err.to_string(),
            "request rejected by the Places service: OVER_QUERY_LIMIT"
        );
    }

    #[test]
    fn unknown_tokens_are_kept_verbatim() {
        let status = RemoteStatus::from_token("SOMETHING_NEW");
        assert_eq!(status, RemoteStatus::Other("SOMETHING_NEW".to_string()));
        assert_eq!(status.as_str(), "SOMETHING_NEW");
    }

    #[test]
    fn other_errors_have_no_status() {
        let err = ApiError::InvalidArgument("radius must be greater than zero".to_string());
        assert!(err.status().is_none());
    }
}
