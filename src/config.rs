//! # Per-invocation task configuration.
//!
//! [`TaskConfig`] is built once per [`run`](crate::run) call from
//! [`TaskConfig::default`] overlaid with caller options (see [`crate::options`]),
//! and is read-only afterwards.
//!
//! ## Sentinel values
//! - `timeout = 0s` → unset; with a cleanup callback it becomes [`DEFAULT_TASK_TIMEOUT`]
//! - `cancel_timeout = 0s` → cleanup runs unbounded

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;

use crate::{context::Context, error::TaskError, events::Bus};

/// Timeout applied when a cleanup callback is configured without an explicit timeout.
pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bound on the cleanup callback's execution.
pub const DEFAULT_CANCEL_TIMEOUT: Duration = Duration::from_secs(30);

/// Future returned by a cleanup callback.
pub type CancelFuture = BoxFuture<'static, Result<(), TaskError>>;

/// Cleanup callback invoked with the (already done) derived context when the deadline elapses.
pub type CancelFn = Arc<dyn Fn(Context) -> CancelFuture + Send + Sync>;

/// Configuration for one supervised execution.
///
/// ## Field semantics
/// - `timeout`: deadline for the workload (`0s` = unset)
/// - `cancel`: cleanup callback run only when the deadline elapses
/// - `cancel_timeout`: bound on the cleanup callback (`0s` = unbounded)
/// - `name`: task name attached to published events
/// - `bus`: where lifecycle events go (`None` = not published)
/// - `catch_panics`: convert workload/cleanup panics into [`TaskError::Panicked`]
#[derive(Clone)]
pub struct TaskConfig {
    /// Maximum duration for the workload before cancellation.
    pub timeout: Duration,
    /// Function to call when the workload is cancelled by its deadline.
    pub cancel: Option<CancelFn>,
    /// Maximum duration for the cleanup callback to run.
    pub cancel_timeout: Duration,
    /// Task name used in events.
    pub name: Cow<'static, str>,
    /// Event sink.
    pub bus: Option<Bus>,
    /// Whether panics are reported as errors instead of being resumed on the caller.
    pub catch_panics: bool,
}

impl TaskConfig {
    /// Returns the workload timeout as an `Option`.
    #[inline]
    pub fn timeout_opt(&self) -> Option<Duration> {
        if self.timeout == Duration::ZERO {
            None
        } else {
            Some(self.timeout)
        }
    }

    /// Returns the cleanup bound as an `Option`.
    #[inline]
    pub fn cancel_timeout_opt(&self) -> Option<Duration> {
        if self.cancel_timeout == Duration::ZERO {
            None
        } else {
            Some(self.cancel_timeout)
        }
    }

    /// True when the workload has to run under a Worker/Watcher pair.
    ///
    /// Without a timeout and without cleanup there is nothing to watch.
    #[inline]
    pub fn needs_supervision(&self) -> bool {
        self.timeout_opt().is_some() || self.cancel.is_some()
    }

    /// The timeout actually applied on the supervised path.
    #[inline]
    pub fn effective_timeout(&self) -> Duration {
        self.timeout_opt().unwrap_or(DEFAULT_TASK_TIMEOUT)
    }
}

impl Default for TaskConfig {
    /// Default configuration:
    ///
    /// - `timeout = 0s` (unset)
    /// - `cancel = None`
    /// - `cancel_timeout = 30s`
    /// - `name = "task"`
    /// - `bus = None`
    /// - `catch_panics = false`
    fn default() -> Self {
        Self {
            timeout: Duration::ZERO,
            cancel: None,
            cancel_timeout: DEFAULT_CANCEL_TIMEOUT,
            name: Cow::Borrowed("task"),
            bus: None,
            catch_panics: false,
        }
    }
}

impl fmt::Debug for TaskConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskConfig")
            .field("timeout", &self.timeout)
            .field("cancel", &self.cancel.as_ref().map(|_| "<fn>"))
            .field("cancel_timeout", &self.cancel_timeout)
            .field("name", &self.name)
            .field("bus", &self.bus.is_some())
            .field("catch_panics", &self.catch_panics)
            .finish()
    }
}
