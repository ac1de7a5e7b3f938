//! The per-operation contract consumed by the executor.
//!
//! # Design
//! Every Fleet endpoint is a request type implementing [`Operation`]. The
//! implementation is pure data: a static [`Endpoint`] (identifier, method,
//! path template, success predicate), the path parameters, the optional query
//! pairs and an optional encoded body. `FleetClient::execute` is the only
//! place that turns this into I/O, so adding an endpoint never adds control
//! flow.

use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::query::Query;

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const ZIP_CONTENT_TYPE: &str = "application/zip";

// RFC 3986 path segment: everything outside pchar is escaped, including `/`.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Which status codes an operation treats as success.
///
/// Fleet endpoints disagree: most only accept `200`, a few accept anything
/// below `299`. The predicate is part of each endpoint's definition and is
/// never normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessStatus {
    /// Exactly `200`.
    Ok,
    /// Any status below `299`.
    Below299,
}

impl SuccessStatus {
    pub fn matches(self, status: u16) -> bool {
        match self {
            SuccessStatus::Ok => status == 200,
            SuccessStatus::Below299 => status < 299,
        }
    }
}

/// Static description of one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    /// Stable identifier used for spans and errors, e.g.
    /// `fleet.agent_policies.get`.
    pub id: &'static str,
    pub method: HttpMethod,
    /// Path relative to the base URL with `{name}` placeholders.
    pub path: &'static str,
    pub success: SuccessStatus,
}

impl Endpoint {
    /// Fail with `MissingParameter` when a required field is blank.
    pub fn require(&self, parameter: &'static str, value: &str) -> Result<(), ApiError> {
        if value.trim().is_empty() {
            return Err(ApiError::MissingParameter {
                operation: self.id,
                parameter,
            });
        }
        Ok(())
    }

    /// Substitute `params` into the path template.
    ///
    /// Every placeholder must have a non-blank value other than `.` or `..`;
    /// values are percent-encoded as single path segments.
    pub fn resolve_path(&self, params: &[(&'static str, &str)]) -> Result<String, ApiError> {
        let mut resolved = String::with_capacity(self.path.len());
        let mut rest: &'static str = self.path;

        while let Some(open) = rest.find('{') {
            let Some(close) = rest[open..].find('}').map(|offset| open + offset) else {
                return Err(self.malformed_template());
            };
            resolved.push_str(&rest[..open]);

            let name = &rest[open + 1..close];
            let value = params
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| *value)
                .unwrap_or_default();
            if value.trim().is_empty() {
                return Err(ApiError::MissingParameter {
                    operation: self.id,
                    parameter: name,
                });
            }
            // URL parsing collapses dot segments, even percent-encoded ones.
            if value == "." || value == ".." {
                return Err(ApiError::InvalidRequest {
                    operation: self.id,
                    reason: format!("path parameter `{name}` must not be `{value}`"),
                });
            }
            resolved.extend(utf8_percent_encode(value, PATH_SEGMENT));
            rest = &rest[close + 1..];
        }

        if rest.contains('}') {
            return Err(self.malformed_template());
        }
        resolved.push_str(rest);
        Ok(resolved)
    }

    fn malformed_template(&self) -> ApiError {
        ApiError::InvalidRequest {
            operation: self.id,
            reason: format!("malformed path template `{}`", self.path),
        }
    }
}

/// An encoded request body together with its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBody {
    pub content_type: &'static str,
    pub bytes: Bytes,
}

impl RequestBody {
    /// Serialize `value` as JSON.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, ApiError> {
        let bytes = serde_json::to_vec(value).map_err(ApiError::Serialization)?;
        Ok(Self {
            content_type: JSON_CONTENT_TYPE,
            bytes: Bytes::from(bytes),
        })
    }

    /// Pass `bytes` through unmodified.
    pub fn binary(content_type: &'static str, bytes: impl Into<Bytes>) -> Self {
        Self {
            content_type,
            bytes: bytes.into(),
        }
    }
}

/// A typed request for one endpoint.
///
/// Implementations describe the request; they never perform I/O.
pub trait Operation {
    /// Type decoded from a success response body.
    type Response: DeserializeOwned;

    const ENDPOINT: Endpoint;

    /// Values for the placeholders in `ENDPOINT.path`.
    fn path_params(&self) -> Vec<(&'static str, &str)> {
        Vec::new()
    }

    /// Optional query parameters. Absent values must not be pushed.
    fn query(&self, _query: &mut Query) {}

    fn body(&self) -> Result<Option<RequestBody>, ApiError> {
        Ok(None)
    }

    /// Check required fields that are not path parameters.
    fn validate(&self) -> Result<(), ApiError> {
        Ok(())
    }
}
