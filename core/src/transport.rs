//! The caller-supplied I/O seam.
//!
//! # Design
//! The core never opens a socket. A [`Transport`] receives a fully prepared
//! [`HttpRequest`] and returns an [`HttpResponse`] for *any* status code;
//! only failures to complete the round trip (refused connection, cancelled
//! context, broken stream) are errors. Status interpretation stays in the
//! executor.
//!
//! Instrumentation is an optional capability of the transport, reached
//! through [`Transport::instrumentation`]. The default returns `None`, which
//! the executor treats as "instrumentation disabled". [`Instrumented`]
//! attaches an [`Instrumentation`] to a transport that has none.

use std::io;
use std::sync::Arc;

use crate::context::{Context, ContextError};
use crate::error::BoxError;
use crate::http::{HttpRequest, HttpResponse};
use crate::instrumentation::Instrumentation;

/// Failure to complete an HTTP round trip.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request cancelled")]
    Cancelled,

    #[error("request deadline exceeded")]
    DeadlineExceeded,

    #[error("connection failed: {0}")]
    Connection(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Other(BoxError),
}

impl TransportError {
    pub fn other(err: impl Into<BoxError>) -> Self {
        TransportError::Other(err.into())
    }
}

impl From<ContextError> for TransportError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::Cancelled => TransportError::Cancelled,
            ContextError::DeadlineExceeded => TransportError::DeadlineExceeded,
        }
    }
}

/// Performs HTTP requests on behalf of the client.
///
/// Implementations must be safe to share between threads; the client calls
/// `perform` concurrently when the caller does. Honoring `ctx` (cancellation
/// and deadline) is the transport's job.
pub trait Transport: Send + Sync {
    fn perform(&self, ctx: &Context, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Instrumentation hooks for calls made through this transport.
    fn instrumentation(&self) -> Option<&dyn Instrumentation> {
        None
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn perform(&self, ctx: &Context, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).perform(ctx, request)
    }

    fn instrumentation(&self) -> Option<&dyn Instrumentation> {
        (**self).instrumentation()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn perform(&self, ctx: &Context, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).perform(ctx, request)
    }

    fn instrumentation(&self) -> Option<&dyn Instrumentation> {
        (**self).instrumentation()
    }
}

/// A transport backed by a closure. Handy for stubs.
pub struct FnTransport<F> {
    f: F,
}

pub fn from_fn<F>(f: F) -> FnTransport<F>
where
    F: Fn(&Context, HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync,
{
    FnTransport { f }
}

impl<F> Transport for FnTransport<F>
where
    F: Fn(&Context, HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync,
{
    fn perform(&self, ctx: &Context, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (self.f)(ctx, request)
    }
}

/// A transport that exposes `instrumentation` for every call it performs.
#[derive(Debug, Clone)]
pub struct Instrumented<T, I> {
    transport: T,
    instrumentation: I,
}

impl<T, I> Instrumented<T, I> {
    pub fn new(transport: T, instrumentation: I) -> Self {
        Self {
            transport,
            instrumentation,
        }
    }

    pub fn into_inner(self) -> (T, I) {
        (self.transport, self.instrumentation)
    }
}

impl<T: Transport, I: Instrumentation> Transport for Instrumented<T, I> {
    fn perform(&self, ctx: &Context, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.transport.perform(ctx, request)
    }

    fn instrumentation(&self) -> Option<&dyn Instrumentation> {
        Some(&self.instrumentation)
    }
}
