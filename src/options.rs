//! # Functional options for [`TaskConfig`].
//!
//! An option is a boxed closure that mutates the configuration and may reject it.
//! [`apply_options`] applies options in call order and stops at the first error;
//! [`run`](crate::run) returns that error before the workload is invoked.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskguard::{TaskConfig, apply_options, with_name, with_timeout};
//!
//! let cfg = apply_options(
//!     TaskConfig::default(),
//!     [with_timeout(Duration::from_secs(1)), with_name("import")],
//! )
//! .unwrap();
//! assert_eq!(cfg.timeout, Duration::from_secs(1));
//! assert_eq!(cfg.name, "import");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::{CancelFuture, TaskConfig},
    context::Context,
    error::TaskError,
    events::Bus,
};

/// A single configuration step.
pub type TaskOption = Box<dyn FnOnce(&mut TaskConfig) -> Result<(), TaskError> + Send>;

/// Applies `options` to `cfg` in order, failing fast on the first rejected option.
pub fn apply_options<I>(mut cfg: TaskConfig, options: I) -> Result<TaskConfig, TaskError>
where
    I: IntoIterator<Item = TaskOption>,
{
    for option in options {
        option(&mut cfg)?;
    }
    Ok(cfg)
}

/// Sets the workload timeout (`Duration::ZERO` leaves it unset).
pub fn with_timeout(timeout: Duration) -> TaskOption {
    Box::new(move |cfg: &mut TaskConfig| {
        cfg.timeout = timeout;
        Ok(())
    })
}

/// Sets the cleanup callback run when the deadline elapses.
///
/// The callback receives the derived context, which is already done.
pub fn with_cancel<F, Fut>(f: F) -> TaskOption
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    Box::new(move |cfg: &mut TaskConfig| {
        cfg.cancel = Some(Arc::new(move |ctx| Box::pin(f(ctx)) as CancelFuture));
        Ok(())
    })
}

/// Bounds the cleanup callback (`Duration::ZERO` = unbounded).
pub fn with_cancel_timeout(timeout: Duration) -> TaskOption {
    Box::new(move |cfg: &mut TaskConfig| {
        cfg.cancel_timeout = timeout;
        Ok(())
    })
}

/// Names the task in published events. Empty names are rejected.
pub fn with_name(name: impl Into<Cow<'static, str>>) -> TaskOption {
    let name = name.into();
    Box::new(move |cfg: &mut TaskConfig| {
        if name.trim().is_empty() {
            return Err(TaskError::InvalidOption {
                error: "task name must not be empty".into(),
            });
        }
        cfg.name = name;
        Ok(())
    })
}

/// Publishes lifecycle events to `bus`.
pub fn with_bus(bus: Bus) -> TaskOption {
    Box::new(move |cfg: &mut TaskConfig| {
        cfg.bus = Some(bus);
        Ok(())
    })
}

/// Converts panics in the workload or cleanup callback into [`TaskError::Panicked`].
pub fn with_catch_panics(enabled: bool) -> TaskOption {
    Box::new(move |cfg: &mut TaskConfig| {
        cfg.catch_panics = enabled;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    #[test]
    fn options_apply_in_order() {
        let cfg = apply_options(
            TaskConfig::default(),
            [
                with_timeout(Duration::from_secs(1)),
                with_timeout(Duration::from_secs(2)),
                with_cancel_timeout(Duration::ZERO),
                with_catch_panics(true),
            ],
        )
        .unwrap();
        assert_eq!(cfg.timeout, Duration::from_secs(2));
        assert!(cfg.cancel_timeout_opt().is_none());
        assert!(cfg.catch_panics);
    }

    #[test]
    fn first_error_stops_application() {
        let reached = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&reached);
        let tail: TaskOption = Box::new(move |_cfg: &mut TaskConfig| {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        });

        let err = apply_options(TaskConfig::default(), [with_name(""), tail]).unwrap_err();
        assert_eq!(err.as_label(), "task_invalid_option");
        assert!(!reached.load(Ordering::SeqCst));
    }

    #[test]
    fn with_cancel_installs_callback() {
        let cfg = apply_options(
            TaskConfig::default(),
            [with_cancel(|_ctx: Context| async { Ok::<(), TaskError>(()) })],
        )
        .unwrap();
        assert!(cfg.cancel.is_some());
        assert!(cfg.needs_supervision());
    }
}
