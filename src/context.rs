//! Per-request context threaded through every store operation.
//!
//! Carries the correlation id used in log lines and an optional deadline.
//! Both are explicit parameters; nothing is looked up from ambient state.

use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Request-scoped settings for a store operation.
///
/// # Example
///
/// ```
/// use user_store::RequestContext;
/// use std::time::Duration;
///
/// let ctx = RequestContext::new()
///     .with_trace_id("7f9c0c4e")
///     .with_timeout(Duration::from_secs(2));
/// assert_eq!(ctx.trace_id(), "7f9c0c4e");
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    trace_id: Option<String>,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// Context without trace id or deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Context with a freshly generated (UUIDv7) trace id.
    pub fn traced() -> Self {
        Self::new().with_trace_id(uuid::Uuid::now_v7().to_string())
    }

    /// Set the correlation id logged with every operation.
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    /// Abort repository and cache calls still running at `deadline`.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Abort repository and cache calls still running after `timeout`.
    ///
    /// A timeout too large to represent as an instant leaves the context
    /// without a deadline.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Trace id, or `"-"` when none was set.
    pub fn trace_id(&self) -> &str {
        self.trace_id.as_deref().unwrap_or("-")
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Run one I/O call under this context's deadline.
    ///
    /// # Errors
    /// Returns `Error::Timeout` naming `what` if the deadline elapses first,
    /// otherwise whatever `fut` returns.
    pub async fn run<T, F>(&self, what: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, fut)
                .await
                .map_err(|_| Error::Timeout(format!("{} exceeded request deadline", what)))?,
            None => fut.await,
        }
    }
}
