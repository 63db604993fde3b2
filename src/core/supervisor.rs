//! # Supervisor: run one workload under a deadline.
//!
//! [`run`] is the crate's entry point. It builds a [`TaskConfig`] from the given
//! options and picks one of two paths.
//!
//! ## Paths
//! ```text
//! run(ctx, workload, options)
//!   ├─► apply_options(TaskConfig::default(), options)   ── Err ──► return (workload never runs)
//!   │
//!   ├─► fast path (timeout = 0s, no cleanup)
//!   │     └─► workload(ctx).await inline, result returned unchanged
//!   │
//!   └─► supervised path
//!         ├─► timeout = cfg.timeout or DEFAULT_TASK_TIMEOUT (cleanup without timeout)
//!         ├─► derived = ctx.with_timeout_cause(timeout, TaskError::Timeout)
//!         ├─► JoinSet:
//!         │     ├─ Worker:  workload(derived) → settle.claim → ErrorGroup.append → done.send
//!         │     └─ Watcher: select!(done, derived.done() → settle.claim) → cause + cleanup if Expired
//!         ├─► join both units
//!         └─► ErrorGroup.error_or_nil()
//! ```
//!
//! ## Rules
//! - The timeout cause is recorded **iff** the deadline elapsed before the Worker
//!   claimed completion; both units act on that one claim.
//! - The cleanup callback runs **at most once**, only after a deadline.
//! - Panics: resumed on the caller after both units are joined, unless
//!   [`with_catch_panics`](crate::with_catch_panics) turns them into [`TaskError::Panicked`].
//! - Dropping the returned future aborts both units.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskguard::{Context, TaskError, run, with_cancel, with_timeout};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let res = run(
//!     &Context::background(),
//!     |ctx: Context| async move {
//!         ctx.done().await; // never finishes on its own
//!         Ok(())
//!     },
//!     [
//!         with_timeout(Duration::from_millis(20)),
//!         with_cancel(|_ctx: Context| async { Err(TaskError::fail("cancel failed")) }),
//!     ],
//! )
//! .await;
//!
//! let err = res.unwrap_err();
//! assert!(err.is_timeout());
//! assert!(err.has_label("task_failed"));
//! # }
//! ```

use std::future::Future;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinSet;

use crate::{
    config::TaskConfig,
    context::Context,
    core::{
        runner::{publish_starting, run_workload, worker},
        settle::Settle,
        watcher::watch,
    },
    error::TaskError,
    group::ErrorGroup,
    options::{TaskOption, apply_options},
};

/// Executes `workload` with `ctx` under the given options and returns every failure.
///
/// Returns:
/// - `Ok(())` when the workload succeeded and no deadline elapsed;
/// - the option error, if an option was rejected (the workload is not run);
/// - the workload's own error when it is the only failure;
/// - a [`TaskError::Group`] when several failures were collected
///   (e.g. timeout cause plus cleanup error).
pub async fn run<F, Fut, I>(ctx: &Context, workload: F, options: I) -> Result<(), TaskError>
where
    F: FnOnce(Context) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    I: IntoIterator<Item = TaskOption>,
{
    let cfg = apply_options(TaskConfig::default(), options)?;

    if !cfg.needs_supervision() {
        publish_starting(&cfg, None);
        return run_workload(workload, ctx.clone(), &cfg).await;
    }

    let timeout = cfg.effective_timeout();
    let derived = ctx.with_timeout_cause(timeout, TaskError::Timeout { timeout });
    publish_starting(&cfg, Some(timeout));

    let cfg = Arc::new(cfg);
    let errs = Arc::new(ErrorGroup::new());
    let settle = Arc::new(Settle::new());
    let (done_tx, done_rx) = oneshot::channel();

    let mut set = JoinSet::new();
    set.spawn(worker(
        workload,
        derived.clone(),
        Arc::clone(&cfg),
        Arc::clone(&errs),
        Arc::clone(&settle),
        done_tx,
    ));
    set.spawn(watch(derived, Arc::clone(&cfg), Arc::clone(&errs), settle, done_rx));

    let mut panic = None;
    while let Some(joined) = set.join_next().await {
        match joined {
            Err(e) if e.is_panic() && panic.is_none() => panic = Some(e.into_panic()),
            _ => {}
        }
    }
    if let Some(payload) = panic {
        std::panic::resume_unwind(payload);
    }

    errs.error_or_nil()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use tokio::time;

    use super::*;
    use crate::events::{Bus, EventKind};
    use crate::options::{with_bus, with_cancel, with_catch_panics, with_name, with_timeout};

    #[tokio::test(start_paused = true)]
    async fn fast_path_returns_workload_error_unchanged() {
        let err = run(
            &Context::background(),
            |_ctx| async { Err(TaskError::fail("boom")) },
            [],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, TaskError::Fail { ref error } if error == "boom"));
    }

    #[tokio::test(start_paused = true)]
    async fn fast_path_passes_original_context() {
        let res = run(
            &Context::background(),
            |ctx: Context| async move {
                assert!(ctx.deadline().is_none());
                Ok(())
            },
            [],
        )
        .await;
        assert!(res.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_option_skips_workload() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);

        let err = run(
            &Context::background(),
            move |_ctx| async move {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
            [with_timeout(Duration::from_millis(100)), with_name("")],
        )
        .await
        .unwrap_err();

        assert_eq!(err.as_label(), "task_invalid_option");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cleanup_alone_applies_default_timeout() {
        let res = run(
            &Context::background(),
            |ctx: Context| async move {
                assert_eq!(ctx.remaining(), Some(crate::config::DEFAULT_TASK_TIMEOUT));
                Ok(())
            },
            [with_cancel(|_ctx: Context| async { Ok(()) })],
        )
        .await;
        assert!(res.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn cleanup_not_called_on_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);

        let res = run(
            &Context::background(),
            |_ctx| async {
                time::sleep(Duration::from_millis(10)).await;
                Ok(())
            },
            [
                with_timeout(Duration::from_millis(100)),
                with_cancel(move |_ctx: Context| {
                    seen.fetch_add(1, Ordering::SeqCst);
                    async { Ok(()) }
                }),
            ],
        )
        .await;

        assert!(res.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn workload_error_and_timeout_are_both_kept() {
        let err = run(
            &Context::background(),
            |ctx: Context| async move {
                ctx.done().await;
                Err(TaskError::fail("gave up"))
            },
            [with_timeout(Duration::from_millis(100))],
        )
        .await
        .unwrap_err();

        assert!(err.is_timeout());
        assert!(err.has_label("task_failed"));
        assert_eq!(err.members().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn caught_panic_is_reported() {
        let err = run(
            &Context::background(),
            |_ctx| async { panic!("worker exploded") },
            [
                with_timeout(Duration::from_millis(100)),
                with_catch_panics(true),
            ],
        )
        .await
        .unwrap_err();

        assert!(matches!(err, TaskError::Panicked { ref message } if message == "worker exploded"));
    }

    #[tokio::test(start_paused = true)]
    #[should_panic(expected = "worker exploded")]
    async fn uncaught_panic_reaches_caller() {
        let _ = run(
            &Context::background(),
            |_ctx| async { panic!("worker exploded") },
            [with_timeout(Duration::from_millis(100))],
        )
        .await;
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_publishes_events_in_order() {
        let bus = Bus::new(32);
        let mut rx = bus.subscribe();

        let _ = run(
            &Context::background(),
            |_ctx| async {
                time::sleep(Duration::from_millis(500)).await;
                Ok(())
            },
            [
                with_timeout(Duration::from_millis(100)),
                with_name("slow"),
                with_bus(bus.clone()),
                with_cancel(|_ctx: Context| async { Ok(()) }),
            ],
        )
        .await;

        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            assert_eq!(ev.task.as_deref(), Some("slow"));
            kinds.push(ev.kind);
        }
        assert_eq!(
            kinds,
            [
                EventKind::TaskStarting,
                EventKind::TimeoutHit,
                EventKind::CancelStarting,
                EventKind::TaskStopped,
            ]
        );
    }

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_run_aborts_both_units() {
        let dropped = Arc::new(AtomicBool::new(false));
        let flag = DropFlag(Arc::clone(&dropped));
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);

        let outer = time::timeout(
            Duration::from_millis(10),
            run(
                &Context::background(),
                move |_ctx| async move {
                    let _flag = flag;
                    time::sleep(Duration::from_secs(5)).await;
                    Ok(())
                },
                [
                    with_timeout(Duration::from_secs(1)),
                    with_cancel(move |_ctx: Context| {
                        seen.fetch_add(1, Ordering::SeqCst);
                        async { Ok(()) }
                    }),
                ],
            ),
        )
        .await;
        assert!(outer.is_err());

        time::sleep(Duration::from_secs(2)).await;
        assert!(dropped.load(Ordering::SeqCst));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
