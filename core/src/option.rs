//! Per-call request options.
//!
//! A [`RequestOption`] is a fallible callback that edits the outgoing
//! [`HttpRequest`]. The executor applies options in the order given, after
//! the instrumentation pre-request hook and right before dispatch. The first
//! option that fails aborts the call; nothing is sent.

use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http::{HeaderName, HeaderValue};

use crate::error::BoxError;
use crate::http::HttpRequest;

type ApplyFn = dyn Fn(&mut HttpRequest) -> Result<(), BoxError> + Send + Sync;

/// A request-editing hook applied just before dispatch.
#[derive(Clone)]
pub struct RequestOption {
    name: &'static str,
    apply: Arc<ApplyFn>,
}

impl RequestOption {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut HttpRequest) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self::named("custom", f)
    }

    fn named<F>(name: &'static str, f: F) -> Self
    where
        F: Fn(&mut HttpRequest) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self {
            name,
            apply: Arc::new(f),
        }
    }

    pub fn apply(&self, request: &mut HttpRequest) -> Result<(), BoxError> {
        (self.apply)(request)
    }

    /// Append a header. Existing values with the same name are kept.
    pub fn header(name: impl Into<String>, value: impl Into<String>) -> Self {
        let (name, value) = (name.into(), value.into());
        Self::named("header", move |request| {
            validate_header(&name, &value)?;
            request.append_header(name.clone(), value.clone());
            Ok(())
        })
    }

    /// Replace every value of a header.
    pub fn set_header(name: impl Into<String>, value: impl Into<String>) -> Self {
        let (name, value) = (name.into(), value.into());
        Self::named("set_header", move |request| {
            validate_header(&name, &value)?;
            request.set_header(name.clone(), value.clone());
            Ok(())
        })
    }

    /// `Authorization: ApiKey <key>`, the scheme Kibana uses for Elasticsearch
    /// API keys.
    pub fn api_key(key: impl Into<String>) -> Self {
        let value = format!("ApiKey {}", key.into());
        Self::set_header("authorization", value)
    }

    pub fn bearer_auth(token: impl Into<String>) -> Self {
        let value = format!("Bearer {}", token.into());
        Self::set_header("authorization", value)
    }

    pub fn basic_auth(username: &str, password: &str) -> Self {
        let value = format!("Basic {}", STANDARD.encode(format!("{username}:{password}")));
        Self::set_header("authorization", value)
    }

    /// Append a query pair, even if the operation already sets `key`.
    pub fn query(key: impl Into<String>, value: impl Into<String>) -> Self {
        let (key, value) = (key.into(), value.into());
        Self::named("query", move |request| {
            request.url.query_pairs_mut().append_pair(&key, &value);
            Ok(())
        })
    }

    /// Route the call to a Kibana space by inserting `/s/<space_id>` in front
    /// of `/api/`.
    pub fn space(space_id: impl Into<String>) -> Self {
        let space_id = space_id.into();
        Self::named("space", move |request| {
            if space_id.is_empty() || space_id.contains('/') {
                return Err(format!("invalid space id `{space_id}`").into());
            }
            let path = request.url.path();
            let Some(index) = path.find("/api/") else {
                return Err(format!("path `{path}` has no /api/ segment").into());
            };
            let spaced = format!("{}/s/{}{}", &path[..index], space_id, &path[index..]);
            request.url.set_path(&spaced);
            Ok(())
        })
    }
}

impl fmt::Debug for RequestOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RequestOption").field(&self.name).finish()
    }
}

fn validate_header(name: &str, value: &str) -> Result<(), BoxError> {
    HeaderName::from_bytes(name.as_bytes())?;
    HeaderValue::from_str(value)?;
    Ok(())
}
