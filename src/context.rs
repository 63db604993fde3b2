//! # Cancellation carrier with a deadline and a cause.
//!
//! [`Context`] is what a workload receives. It wraps a [`CancellationToken`] and adds:
//! - an optional deadline (tokio [`Instant`], so paused test clocks work);
//! - a cause recorded exactly once when the context becomes done.
//!
//! ## Derivation
//! ```text
//! background / from_token(token)
//!      └─► with_timeout_cause(dur, cause)      child token + deadline
//!             └─► with_timeout_cause(...)      deadline = min(parent, own)
//! ```
//!
//! ## Rules
//! - Parent cancellation propagates to children, never the reverse.
//! - Deadline expiry is observed lazily by [`Context::is_done`] and [`Context::done`];
//!   no timer task is spawned.
//! - Once observed done, [`Context::cause`] never changes.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Cancellation/deadline carrier passed to workloads and cleanup callbacks.
///
/// Cheap to clone; clones observe the same state.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use taskguard::{Context, TaskError};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let root = Context::background();
/// let ctx = root.with_timeout_cause(Duration::from_millis(10), TaskError::fail("too slow"));
///
/// ctx.done().await;
/// assert!(ctx.is_done());
/// assert!(!root.is_done());
/// assert_eq!(ctx.cause().unwrap().to_string(), "execution failed: too slow");
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct Context {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    token: CancellationToken,
    deadline: Option<Instant>,
    /// Cause recorded when `deadline` elapses.
    expiry: Option<TaskError>,
    cause: OnceLock<TaskError>,
    parent: Option<Context>,
}

impl Context {
    /// Root context: no deadline, never done on its own.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// Root context driven by an external token.
    ///
    /// Cancelling `token` makes the context done with cause [`TaskError::Canceled`].
    #[must_use]
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            inner: Arc::new(Inner {
                token,
                ..Inner::default()
            }),
        }
    }

    /// Derives a child that inherits the parent's deadline and cancellation.
    #[must_use]
    pub fn child(&self) -> Self {
        self.derive(self.inner.deadline, self.inner.expiry.clone())
    }

    /// Derives a child that becomes done at `deadline` with `cause`.
    ///
    /// If the parent's deadline is earlier, the child keeps the parent's deadline and cause.
    #[must_use]
    pub fn with_deadline_cause(&self, deadline: Instant, cause: TaskError) -> Self {
        match self.inner.deadline {
            Some(parent) if parent <= deadline => self.child(),
            _ => self.derive(Some(deadline), Some(cause)),
        }
    }

    /// Derives a child that becomes done after `timeout` with `cause`.
    ///
    /// A timeout too large to represent as an instant behaves as no deadline.
    #[must_use]
    pub fn with_timeout_cause(&self, timeout: Duration, cause: TaskError) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline_cause(deadline, cause),
            None => self.child(),
        }
    }

    fn derive(&self, deadline: Option<Instant>, expiry: Option<TaskError>) -> Self {
        Self {
            inner: Arc::new(Inner {
                token: self.inner.token.child_token(),
                deadline,
                expiry,
                cause: OnceLock::new(),
                parent: Some(self.clone()),
            }),
        }
    }

    /// Non-blocking check: cancelled, or the deadline has passed.
    pub fn is_done(&self) -> bool {
        if self.inner.token.is_cancelled() {
            return true;
        }
        match self.inner.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.expire();
                true
            }
            _ => false,
        }
    }

    /// Waits until the context is cancelled or its deadline elapses.
    pub async fn done(&self) {
        let Some(deadline) = self.inner.deadline else {
            return self.inner.token.cancelled().await;
        };
        tokio::select! {
            biased;
            _ = self.inner.token.cancelled() => {}
            _ = time::sleep_until(deadline) => self.expire(),
        }
    }

    /// Why the context is done; `None` while it is still live.
    ///
    /// Resolution order: the cause recorded at expiry, then the parent's cause,
    /// then [`TaskError::Canceled`]. The first resolved value sticks.
    pub fn cause(&self) -> Option<TaskError> {
        if !self.is_done() {
            return None;
        }
        let cause = self.inner.cause.get_or_init(|| {
            self.inner
                .parent
                .as_ref()
                .and_then(Context::cause)
                .unwrap_or(TaskError::Canceled)
        });
        Some(cause.clone())
    }

    /// The effective deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Time left before the deadline; `None` without a deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.inner
            .deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// A token cancelled once this context is observed done.
    ///
    /// Cancelling the returned token does not affect the context.
    pub fn token(&self) -> CancellationToken {
        self.inner.token.child_token()
    }

    fn expire(&self) {
        let cause = self.inner.expiry.clone().unwrap_or(TaskError::Canceled);
        // The cause is recorded before the token fires so waiters always see it.
        let _ = self.inner.cause.set(cause);
        self.inner.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeout(ms: u64) -> TaskError {
        TaskError::Timeout {
            timeout: Duration::from_millis(ms),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn background_is_never_done() {
        let ctx = Context::background();
        assert!(!ctx.is_done());
        assert!(ctx.cause().is_none());
        assert!(ctx.deadline().is_none());
        assert!(ctx.remaining().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_records_cause() {
        let ctx = Context::background().with_timeout_cause(Duration::from_millis(100), timeout(100));
        assert!(!ctx.is_done());
        assert_eq!(ctx.remaining(), Some(Duration::from_millis(100)));

        ctx.done().await;
        assert!(ctx.is_done());
        assert!(ctx.cause().unwrap().is_timeout());
        assert!(ctx.token().is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn is_done_observes_deadline_without_waiting() {
        let ctx = Context::background().with_timeout_cause(Duration::from_millis(50), timeout(50));
        time::advance(Duration::from_millis(60)).await;
        assert!(ctx.is_done());
        assert!(ctx.cause().unwrap().is_timeout());
    }

    #[tokio::test(start_paused = true)]
    async fn child_keeps_earlier_parent_deadline() {
        let parent =
            Context::background().with_timeout_cause(Duration::from_millis(50), timeout(50));
        let child = parent.with_timeout_cause(Duration::from_secs(10), TaskError::fail("child"));
        assert_eq!(child.deadline(), parent.deadline());

        child.done().await;
        assert!(matches!(
            child.cause(),
            Some(TaskError::Timeout { timeout }) if timeout == Duration::from_millis(50)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn external_token_cancels_with_canceled_cause() {
        let token = CancellationToken::new();
        let root = Context::from_token(token.clone());
        let child = root.with_timeout_cause(Duration::from_secs(5), timeout(5000));

        token.cancel();
        child.done().await;
        assert!(matches!(child.cause(), Some(TaskError::Canceled)));
    }

    #[tokio::test(start_paused = true)]
    async fn child_expiry_does_not_touch_parent() {
        let parent = Context::background();
        let child = parent.with_timeout_cause(Duration::from_millis(10), timeout(10));
        child.done().await;
        assert!(child.is_done());
        assert!(!parent.is_done());
    }

    #[tokio::test(start_paused = true)]
    async fn cause_is_fixed_once_resolved() {
        let token = CancellationToken::new();
        let root = Context::from_token(token.clone());
        let child = root.with_timeout_cause(Duration::from_millis(10), timeout(10));

        token.cancel();
        assert!(matches!(child.cause(), Some(TaskError::Canceled)));

        time::advance(Duration::from_millis(20)).await;
        child.done().await;
        assert!(matches!(child.cause(), Some(TaskError::Canceled)));
    }

    #[tokio::test(start_paused = true)]
    async fn token_copy_cannot_cancel_context() {
        let ctx = Context::background();
        ctx.token().cancel();
        assert!(!ctx.is_done());
    }

    #[tokio::test(start_paused = true)]
    async fn huge_timeout_means_no_deadline() {
        let ctx = Context::background().with_timeout_cause(Duration::MAX, timeout(0));
        assert!(ctx.deadline().is_none());
        assert!(!ctx.is_done());
    }
}
