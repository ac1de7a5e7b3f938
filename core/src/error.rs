//! Error types for the Fleet API client.
//!
//! # Design
//! Every operation returns [`ApiError`]. Its variants follow the pipeline
//! stage that failed, so callers can tell a request that was never sent
//! (`MissingParameter`, `InvalidRequest`, `Serialization`, `InvalidUrl`,
//! `RequestOption`) from one that reached the server and failed there
//! (`Status`). Non-success responses carry the whole failure envelope in
//! [`ErrorResponse`] for programmatic inspection.

use std::io;

use crate::response::ErrorResponse;
use crate::transport::TransportError;

/// Error returned by option callbacks and boxed foreign errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by `FleetClient::execute`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A required path parameter or body field was missing or empty.
    #[error("{operation}: missing required parameter `{parameter}`")]
    MissingParameter {
        operation: &'static str,
        parameter: &'static str,
    },

    /// The request was rejected before dispatch for another reason.
    #[error("{operation}: invalid request: {reason}")]
    InvalidRequest {
        operation: &'static str,
        reason: String,
    },

    /// The request payload could not be serialized to JSON.
    #[error("failed to serialize request body: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Base URL and resolved path did not form a valid URL.
    #[error("invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A request option returned an error; nothing was dispatched.
    #[error("{operation}: request option failed: {source}")]
    RequestOption {
        operation: &'static str,
        #[source]
        source: BoxError,
    },

    /// The transport could not complete the round trip.
    #[error("{operation}: transport error: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: TransportError,
    },

    /// The response body could not be read.
    #[error("{operation}: failed to read response body: {source}")]
    Body {
        operation: &'static str,
        #[source]
        source: io::Error,
    },

    /// The server reported success but the body did not match the expected
    /// type.
    #[error("{operation}: failed to decode {status} response: {source}")]
    Decode {
        operation: &'static str,
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    /// The server answered with a non-success status.
    #[error(transparent)]
    Status(Box<ErrorResponse>),
}

impl ApiError {
    /// True for errors raised before anything was sent.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ApiError::MissingParameter { .. }
                | ApiError::InvalidRequest { .. }
                | ApiError::Serialization(_)
                | ApiError::InvalidUrl(_)
                | ApiError::RequestOption { .. }
        )
    }

    /// HTTP status of the response, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Decode { status, .. } => Some(*status),
            ApiError::Status(response) => Some(response.status),
            _ => None,
        }
    }

    /// The failure envelope for non-success responses.
    pub fn response(&self) -> Option<&ErrorResponse> {
        match self {
            ApiError::Status(response) => Some(response),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Errors raised while building a [`ClientConfig`](crate::config::ClientConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid base URL `{url}`: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("base URL `{0}` must use http or https")]
    UnsupportedScheme(String),

    #[error("invalid value for header `{name}`")]
    InvalidHeader { name: String },

    #[error("environment variable `{name}` is set but {reason}")]
    InvalidEnv { name: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::ErrorPayload;
    use bytes::Bytes;

    fn status_error(status: u16, payload: ErrorPayload) -> ApiError {
        ApiError::Status(Box::new(ErrorResponse {
            operation: "fleet.agents.get",
            status,
            headers: Vec::new(),
            error: payload,
            raw_body: Bytes::new(),
        }))
    }

    #[test]
    fn missing_parameter_is_validation() {
        let err = ApiError::MissingParameter {
            operation: "fleet.agents.get",
            parameter: "agentId",
        };
        assert!(err.is_validation());
        assert_eq!(err.status(), None);
        assert_eq!(
            err.to_string(),
            "fleet.agents.get: missing required parameter `agentId`"
        );
    }

    #[test]
    fn option_failure_is_validation() {
        let err = ApiError::RequestOption {
            operation: "fleet.agents.get",
            source: "bad header".into(),
        };
        assert!(err.is_validation());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn status_error_exposes_envelope() {
        let err = status_error(404, ErrorPayload::Raw("gone".to_string()));
        assert!(!err.is_validation());
        assert!(err.is_not_found());
        assert_eq!(err.response().map(|r| r.status), Some(404));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn transport_error_has_no_status() {
        let err = ApiError::Transport {
            operation: "fleet.agents.get",
            source: TransportError::Connection("refused".to_string()),
        };
        assert_eq!(err.status(), None);
        assert!(err.response().is_none());
        assert!(err.to_string().contains("refused"));
    }
}
