//! Observability hooks around a single call.
//!
//! # Design
//! [`Instrumentation`] is a narrow, best-effort seam. The executor drives it
//! in a fixed order for every instrumented call:
//!
//! ```text
//! start -> before_request -> record_request_body? -> (options, dispatch)
//!       -> after_request -> record_error? -> close
//! ```
//!
//! `close` runs on every exit path once `start` has run. Hooks must tolerate
//! a context without an active span and must never panic; they are not part
//! of the correctness path.
//!
//! [`TracingInstrumentation`] maps the hooks onto a `tracing` span with
//! OpenTelemetry-style field names.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::field::Empty;
use tracing::Span;

use crate::context::Context;
use crate::http::{Body, HttpRequest};

/// Observability hooks invoked by the executor.
pub trait Instrumentation: Send + Sync {
    /// Open a span for `operation` and return the context carrying it.
    fn start(&self, ctx: &Context, operation: &'static str) -> Context;

    /// Called with the effective request right before options and dispatch.
    fn before_request(&self, ctx: &Context, request: &HttpRequest, operation: &str);

    /// Inspect the outgoing body. The returned body is what gets sent, so an
    /// implementation that reads a stream must hand back an equivalent one.
    fn record_request_body(&self, _ctx: &Context, _operation: &str, body: Body) -> Body {
        body
    }

    /// Called after the transport returns; `status` is `None` when the
    /// transport failed.
    fn after_request(&self, ctx: &Context, operation: &str, status: Option<u16>);

    fn record_error(&self, ctx: &Context, error: &(dyn std::error::Error + 'static));

    fn close(&self, ctx: &Context);
}

const DEFAULT_MAX_CAPTURED_BYTES: usize = 4096;

/// [`Instrumentation`] backed by `tracing` spans.
#[derive(Debug, Clone)]
pub struct TracingInstrumentation {
    capture_request_body: bool,
    max_captured_bytes: usize,
}

impl Default for TracingInstrumentation {
    fn default() -> Self {
        Self::new()
    }
}

impl TracingInstrumentation {
    pub fn new() -> Self {
        Self {
            capture_request_body: false,
            max_captured_bytes: DEFAULT_MAX_CAPTURED_BYTES,
        }
    }

    /// Record buffered request bodies on the span, truncated to
    /// `max_bytes`.
    pub fn capture_request_body(mut self, max_bytes: usize) -> Self {
        self.capture_request_body = true;
        self.max_captured_bytes = max_bytes;
        self
    }
}

#[derive(Clone)]
struct CallSpan {
    span: Span,
    operation: &'static str,
    started: Instant,
    failed: Arc<AtomicBool>,
}

impl Instrumentation for TracingInstrumentation {
    fn start(&self, ctx: &Context, operation: &'static str) -> Context {
        let span = tracing::info_span!(
            "fleet.request",
            otel.name = operation,
            otel.kind = "client",
            otel.status_code = Empty,
            http.request.method = Empty,
            http.request.body = Empty,
            http.response.status_code = Empty,
            url.full = Empty,
            error.message = Empty,
        );
        ctx.with_value(CallSpan {
            span,
            operation,
            started: Instant::now(),
            failed: Arc::new(AtomicBool::new(false)),
        })
    }

    fn before_request(&self, ctx: &Context, request: &HttpRequest, operation: &str) {
        let Some(call) = ctx.value::<CallSpan>() else {
            return;
        };
        call.span.record("http.request.method", request.method.as_str());
        call.span.record("url.full", request.url.as_str());
        call.span.in_scope(|| {
            tracing::debug!(operation, method = %request.method, url = %request.url, "sending request");
        });
    }

    fn record_request_body(&self, ctx: &Context, _operation: &str, body: Body) -> Body {
        if !self.capture_request_body {
            return body;
        }
        let Some(call) = ctx.value::<CallSpan>() else {
            return body;
        };
        // Streams are left alone: reading them here could fail halfway and
        // lose the payload.
        if let Some(bytes) = body.as_bytes() {
            let captured = &bytes[..bytes.len().min(self.max_captured_bytes)];
            call.span
                .record("http.request.body", String::from_utf8_lossy(captured).as_ref());
        }
        body
    }

    fn after_request(&self, ctx: &Context, _operation: &str, status: Option<u16>) {
        let Some(call) = ctx.value::<CallSpan>() else {
            return;
        };
        if let Some(status) = status {
            call.span.record("http.response.status_code", status);
        }
    }

    fn record_error(&self, ctx: &Context, error: &(dyn std::error::Error + 'static)) {
        let Some(call) = ctx.value::<CallSpan>() else {
            return;
        };
        call.failed.store(true, Ordering::Relaxed);
        call.span.record("otel.status_code", "ERROR");
        call.span.record("error.message", tracing::field::display(error));
        call.span.in_scope(|| {
            tracing::warn!(operation = call.operation, error = %error, "request failed");
        });
    }

    fn close(&self, ctx: &Context) {
        let Some(call) = ctx.value::<CallSpan>() else {
            return;
        };
        if !call.failed.load(Ordering::Relaxed) {
            call.span.record("otel.status_code", "OK");
        }
        let elapsed_ms = call.started.elapsed().as_millis() as u64;
        call.span.in_scope(|| {
            tracing::debug!(operation = call.operation, elapsed_ms, "request finished");
        });
    }
}
