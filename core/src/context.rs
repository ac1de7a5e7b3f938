//! Per-call context: cancellation, deadline and typed values.
//!
//! # Design
//! A `Context` is cheap to clone and is passed by reference through the
//! executor to the transport. The executor never inspects the cancellation
//! flag or the deadline itself; it only forwards the context, so cancellation
//! surfaces as whatever [`TransportError`] the transport maps it to.
//! Instrumentation derives a new context in `start` and stashes its span
//! state in the extensions.
//!
//! [`TransportError`]: crate::transport::TransportError

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use http::Extensions;

/// Why a context is no longer usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("context cancelled")]
    Cancelled,
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

#[derive(Debug, Clone, Default)]
pub struct Context {
    // One flag per `with_cancel` ancestor; any set flag cancels the context.
    cancel_flags: Vec<Arc<AtomicBool>>,
    deadline: Option<Instant>,
    extensions: Extensions,
}

/// Cancels the context it was created with and everything derived from it.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a context that can be cancelled through the returned handle.
    ///
    /// Cancelling the parent still cancels the child.
    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        let flag = Arc::new(AtomicBool::new(false));
        let mut ctx = self.clone();
        ctx.cancel_flags.push(flag.clone());
        (ctx, CancelHandle { flag })
    }

    /// Derive a context that expires at `deadline`, or earlier if the parent
    /// already has a sooner one.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        };
        Self {
            deadline: Some(deadline),
            ..self.clone()
        }
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a context carrying `value`, replacing any previous value of the
    /// same type.
    pub fn with_value<T: Clone + Send + Sync + 'static>(&self, value: T) -> Self {
        let mut ctx = self.clone();
        ctx.extensions.insert(value);
        ctx
    }

    pub fn value<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; `None` when there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_flags
            .iter()
            .any(|flag| flag.load(Ordering::SeqCst))
    }

    /// `Ok` while the context is live; transports call this before and
    /// during I/O.
    pub fn check(&self) -> Result<(), ContextError> {
        if self.is_cancelled() {
            return Err(ContextError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(ContextError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}
