//! Response envelopes returned by every operation.
//!
//! # Design
//! A call ends in exactly one of two envelopes. Success yields
//! [`ApiResponse<T>`] holding the typed body; a non-success status yields
//! [`ErrorResponse`] holding the error payload, wrapped in
//! `ApiError::Status`. Both keep the status code, response headers and the
//! raw body bytes, so the decoded value and the original payload can be
//! compared when debugging.
//!
//! Error payloads are not schema-bound: Fleet answers with
//! `{"statusCode":..,"error":..,"message":..}` most of the time, but proxies
//! in front of Kibana return HTML or plain text. Whatever parses as JSON is
//! kept as a `serde_json::Value`; anything else is kept as text.

use std::fmt;

use bytes::Bytes;
use serde_json::Value;

/// Successful result of an operation.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: T,
    /// The bytes `body` was decoded from.
    pub raw_body: Bytes,
}

impl<T> ApiResponse<T> {
    pub fn into_body(self) -> T {
        self.body
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            status: self.status,
            headers: self.headers,
            body: f(self.body),
            raw_body: self.raw_body,
        }
    }
}

/// Error body of a non-success response.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorPayload {
    /// The body parsed as JSON.
    Json(Value),
    /// The body was not JSON; kept as (lossily decoded) text.
    Raw(String),
}

impl ErrorPayload {
    /// Classify a drained error body.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => ErrorPayload::Json(value),
            Err(_) => ErrorPayload::Raw(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ErrorPayload::Json(value) => Some(value),
            ErrorPayload::Raw(_) => None,
        }
    }

    /// The `message` field Kibana puts in its error bodies, if present.
    pub fn message(&self) -> Option<&str> {
        self.as_json()?.get("message")?.as_str()
    }
}

impl fmt::Display for ErrorPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorPayload::Json(value) => write!(f, "{value}"),
            ErrorPayload::Raw(text) => f.write_str(text),
        }
    }
}

/// Failure envelope for a non-success status.
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    /// Identifier of the operation that failed, e.g. `fleet.agents.get`.
    pub operation: &'static str,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub error: ErrorPayload,
    pub raw_body: Bytes,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: unexpected status {}: {}",
            self.operation, self.status, self.error
        )
    }
}

impl std::error::Error for ErrorResponse {}
