//! # Run the workload and report how it ended.
//!
//! Shared by both execution paths of [`run`](crate::run):
//! - **fast path**: [`run_workload`] is awaited inline on the caller's task;
//! - **supervised path**: [`worker`] wraps it, records the result in the shared
//!   [`ErrorGroup`] and signals completion to the Watcher.
//!
//! ## Event flow
//! ```text
//! Success:  workload → Ok(())              → publish TaskStopped
//! Failure:  workload → Err(e)              → publish TaskFailed
//! Panic:    workload panics (catch on)     → publish TaskPanicked → Err(Panicked)
//!           workload panics (catch off)    → unwinds to the caller
//! ```
//!
//! ## Rules
//! - Publishes **exactly one** terminal event per workload that returns.
//! - The Worker claims the shared [`Settle`] verdict **before** appending and
//!   signalling; the Watcher acts on that same verdict, never on its own sample.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::oneshot;

use crate::{
    config::TaskConfig,
    context::Context,
    error::{TaskError, panic_message},
    events::{Event, EventKind},
    group::ErrorGroup,
};

use super::settle::{Settle, Verdict};

/// Executes `workload` once with `ctx`, publishing its terminal event.
pub(crate) async fn run_workload<F, Fut>(
    workload: F,
    ctx: Context,
    cfg: &TaskConfig,
) -> Result<(), TaskError>
where
    F: FnOnce(Context) -> Fut,
    Fut: Future<Output = Result<(), TaskError>>,
{
    let res = guarded(cfg.catch_panics, async move { workload(ctx).await }).await;
    match &res {
        Ok(()) => publish(cfg, Event::new(EventKind::TaskStopped)),
        Err(TaskError::Panicked { message }) => publish(
            cfg,
            Event::new(EventKind::TaskPanicked).with_reason(message.as_str()),
        ),
        Err(e) => publish(
            cfg,
            Event::new(EventKind::TaskFailed).with_reason(e.to_string()),
        ),
    }
    res
}

/// Worker unit of the supervised path.
///
/// Runs the workload, claims the verdict, appends its error (if any), then sends
/// the standing verdict on `done`.
pub(crate) async fn worker<F, Fut>(
    workload: F,
    ctx: Context,
    cfg: Arc<TaskConfig>,
    errs: Arc<ErrorGroup>,
    settle: Arc<Settle>,
    done: oneshot::Sender<Verdict>,
) where
    F: FnOnce(Context) -> Fut,
    Fut: Future<Output = Result<(), TaskError>>,
{
    let res = run_workload(workload, ctx.clone(), &cfg).await;
    let verdict = settle.claim(if ctx.is_done() {
        Verdict::Expired
    } else {
        Verdict::Completed
    });
    errs.append(res.err());
    // The watcher may already be gone if it took the deadline branch.
    let _ = done.send(verdict);
}

/// Awaits `fut`; with `catch` set, a panic becomes [`TaskError::Panicked`].
pub(crate) async fn guarded<Fut>(catch: bool, fut: Fut) -> Result<(), TaskError>
where
    Fut: Future<Output = Result<(), TaskError>>,
{
    if !catch {
        return fut.await;
    }
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(res) => res,
        Err(panic) => Err(TaskError::Panicked {
            message: panic_message(&*panic),
        }),
    }
}

/// Publishes `ev` tagged with the task name, if a bus is configured.
pub(crate) fn publish(cfg: &TaskConfig, ev: Event) {
    if let Some(bus) = &cfg.bus {
        bus.publish(ev.with_task(&*cfg.name));
    }
}

/// Publishes `TaskStarting` (with the applied timeout on the supervised path).
pub(crate) fn publish_starting(cfg: &TaskConfig, timeout: Option<Duration>) {
    let ev = Event::new(EventKind::TaskStarting);
    publish(
        cfg,
        match timeout {
            Some(d) => ev.with_timeout(d),
            None => ev,
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Bus;

    fn cfg_with_bus(bus: &Bus, catch_panics: bool) -> TaskConfig {
        TaskConfig {
            bus: Some(bus.clone()),
            name: "unit".into(),
            catch_panics,
            ..TaskConfig::default()
        }
    }

    #[tokio::test]
    async fn success_publishes_stopped() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let cfg = cfg_with_bus(&bus, false);

        let res = run_workload(|_ctx| async { Ok(()) }, Context::background(), &cfg).await;
        assert!(res.is_ok());

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::TaskStopped);
        assert_eq!(ev.task.as_deref(), Some("unit"));
    }

    #[tokio::test]
    async fn failure_is_returned_unchanged() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let cfg = cfg_with_bus(&bus, false);

        let res = run_workload(
            |_ctx| async { Err(TaskError::fail("boom")) },
            Context::background(),
            &cfg,
        )
        .await;
        assert!(matches!(res, Err(TaskError::Fail { ref error }) if error == "boom"));

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::TaskFailed);
        assert_eq!(ev.reason.as_deref(), Some("execution failed: boom"));
    }

    #[tokio::test]
    async fn caught_panic_becomes_error() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let cfg = cfg_with_bus(&bus, true);

        let res = run_workload(
            |_ctx| async { panic!("kaboom") },
            Context::background(),
            &cfg,
        )
        .await;
        assert!(matches!(res, Err(TaskError::Panicked { ref message }) if message == "kaboom"));
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::TaskPanicked);
    }

    #[tokio::test]
    async fn worker_claims_completion_before_deadline() {
        let cfg = Arc::new(TaskConfig::default());
        let errs = Arc::new(ErrorGroup::new());
        let settle = Arc::new(Settle::new());
        let (tx, rx) = oneshot::channel();

        worker(
            |_ctx| async { Err(TaskError::fail("early")) },
            Context::background(),
            cfg,
            Arc::clone(&errs),
            Arc::clone(&settle),
            tx,
        )
        .await;

        assert_eq!(rx.await.unwrap(), Verdict::Completed);
        assert_eq!(settle.claim(Verdict::Expired), Verdict::Completed);
        assert_eq!(errs.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn worker_returning_after_deadline_claims_expiry() {
        let cfg = Arc::new(TaskConfig::default());
        let errs = Arc::new(ErrorGroup::new());
        let settle = Arc::new(Settle::new());
        let (tx, rx) = oneshot::channel();
        let ctx = Context::background().with_timeout_cause(
            Duration::from_millis(10),
            TaskError::Timeout {
                timeout: Duration::from_millis(10),
            },
        );

        worker(
            |_ctx| async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(())
            },
            ctx,
            cfg,
            Arc::clone(&errs),
            Arc::clone(&settle),
            tx,
        )
        .await;

        assert_eq!(rx.await.unwrap(), Verdict::Expired);
        assert!(errs.is_empty());
    }

    #[tokio::test]
    async fn worker_yields_to_an_earlier_watcher_claim() {
        let settle = Arc::new(Settle::new());
        settle.claim(Verdict::Expired);
        let (tx, rx) = oneshot::channel();

        worker(
            |_ctx| async { Ok(()) },
            Context::background(),
            Arc::new(TaskConfig::default()),
            Arc::new(ErrorGroup::new()),
            settle,
            tx,
        )
        .await;

        assert_eq!(rx.await.unwrap(), Verdict::Expired);
    }
}
