//! Error types used by supervised task execution.
//!
//! [`TaskError`] is the single error type flowing through the crate: workloads and
//! cleanup callbacks return it, option application fails with it, and
//! [`run`](crate::run) reports every collected failure through it.
//!
//! A result that carries several failures is a [`TaskError::Group`]; use
//! [`TaskError::contains`], [`TaskError::is_timeout`] or [`TaskError::find`] to
//! test for a particular failure without unpacking the group by hand.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::group::Errors;

/// Boxed error type accepted by [`TaskError::other`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// # Errors produced by supervised task execution.
///
/// Variants fall into four groups:
/// - configuration: [`TaskError::InvalidOption`];
/// - workload/cleanup failures: [`TaskError::Fail`], [`TaskError::Other`], [`TaskError::Panicked`];
/// - cancellation causes: [`TaskError::Timeout`], [`TaskError::Canceled`], [`TaskError::CancelTimeout`];
/// - aggregation: [`TaskError::Group`].
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum TaskError {
    /// Task reached its deadline and was cancelled.
    ///
    /// This is the cause recorded on the derived [`Context`](crate::Context) when the
    /// deadline elapses before the workload completes.
    #[error("task reached its timeout and was cancelled")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Task execution failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The carrier was cancelled by its owner rather than by a deadline.
    #[error("context cancelled")]
    Canceled,

    /// An option could not be applied to the task configuration.
    #[error("invalid task option: {error}")]
    InvalidOption {
        /// Why the option was rejected.
        error: String,
    },

    /// The cleanup callback did not finish within its own bound.
    #[error("cancel callback exceeded its timeout of {timeout:?}")]
    CancelTimeout {
        /// The configured cleanup bound.
        timeout: Duration,
    },

    /// The workload or cleanup callback panicked (only with panic catching enabled).
    #[error("panicked: {message}")]
    Panicked {
        /// Panic payload rendered as text.
        message: String,
    },

    /// Arbitrary caller error, kept intact for downcasting via [`TaskError::find`].
    #[error("{0}")]
    Other(Arc<dyn std::error::Error + Send + Sync + 'static>),

    /// Several failures collected by an [`ErrorGroup`](crate::ErrorGroup).
    #[error("{0}")]
    Group(Errors),
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }

    /// Wraps an arbitrary error, preserving it for [`TaskError::find`].
    pub fn other(error: impl Into<BoxError>) -> Self {
        TaskError::Other(Arc::from(error.into()))
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskguard::TaskError;
    /// use std::time::Duration;
    ///
    /// let err = TaskError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "task_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Timeout { .. } => "task_timeout",
            TaskError::Fail { .. } => "task_failed",
            TaskError::Canceled => "task_canceled",
            TaskError::InvalidOption { .. } => "task_invalid_option",
            TaskError::CancelTimeout { .. } => "task_cancel_timeout",
            TaskError::Panicked { .. } => "task_panicked",
            TaskError::Other(_) => "task_other",
            TaskError::Group(_) => "task_group",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Canceled => "context cancelled".to_string(),
            TaskError::InvalidOption { error } => format!("invalid option: {error}"),
            TaskError::CancelTimeout { timeout } => format!("cancel timeout: {timeout:?}"),
            TaskError::Panicked { message } => format!("panic: {message}"),
            TaskError::Other(e) => format!("error: {e}"),
            TaskError::Group(errs) => format!("{} errors: {errs}", errs.len()),
        }
    }

    /// The failures this error stands for: the members of a group, otherwise itself.
    pub fn members(&self) -> &[TaskError] {
        match self {
            TaskError::Group(errs) => errs.as_slice(),
            other => std::slice::from_ref(other),
        }
    }

    /// Reports whether this error, or any member of a group, satisfies `pred`.
    ///
    /// # Example
    /// ```
    /// use taskguard::{ErrorGroup, TaskError};
    /// use std::time::Duration;
    ///
    /// let group = ErrorGroup::new();
    /// group.append(TaskError::Timeout { timeout: Duration::from_millis(100) });
    /// group.append(TaskError::fail("cancel failed"));
    ///
    /// let err = group.error_or_nil().unwrap_err();
    /// assert!(err.is_timeout());
    /// assert!(err.contains(|e| matches!(e, TaskError::Fail { error } if error == "cancel failed")));
    /// ```
    pub fn contains<P>(&self, pred: P) -> bool
    where
        P: Fn(&TaskError) -> bool,
    {
        self.members().iter().any(pred)
    }

    /// Reports whether the task-timeout cause is present.
    pub fn is_timeout(&self) -> bool {
        self.contains(|e| matches!(e, TaskError::Timeout { .. }))
    }

    /// Reports whether any member carries the given [label](TaskError::as_label).
    pub fn has_label(&self, label: &str) -> bool {
        self.contains(|e| e.as_label() == label)
    }

    /// Finds the first wrapped caller error of type `E`.
    pub fn find<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        self.members().iter().find_map(|e| match e {
            TaskError::Other(inner) => inner.downcast_ref::<E>(),
            _ => None,
        })
    }
}

/// Renders a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
