//! # Watcher: decide between completion and deadline, then clean up.
//!
//! ```text
//! select! (biased)
//!   ├─ done(Completed)                    → exit, nothing recorded
//!   ├─ ctx.done(), claim lost (Completed) → exit, nothing recorded
//!   ├─ done(Expired)                      ┐
//!   └─ ctx.done(), claim won (Expired)    ┴─► append ctx.cause()
//!                                             publish TimeoutHit
//!                                             cleanup (once, bounded by cancel_timeout)
//!                                               ├─ Ok        → nothing more
//!                                               ├─ Err(e)    → append e, publish CancelFailed
//!                                               └─ elapsed   → append CancelTimeout, publish CancelTimeout
//! ```
//!
//! A dropped done signal means the Worker unwound; the Watcher exits and the
//! supervisor deals with the panic.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time;

use crate::{
    config::{CancelFn, TaskConfig},
    context::Context,
    core::runner::{guarded, publish},
    error::TaskError,
    events::{Event, EventKind},
    group::ErrorGroup,
};

use super::settle::{Settle, Verdict};

/// Watcher unit of the supervised path.
pub(crate) async fn watch(
    ctx: Context,
    cfg: Arc<TaskConfig>,
    errs: Arc<ErrorGroup>,
    settle: Arc<Settle>,
    done: oneshot::Receiver<Verdict>,
) {
    let timeout = cfg.effective_timeout();

    let verdict = tokio::select! {
        biased;
        signal = done => match signal {
            Ok(verdict) => verdict,
            Err(_) => return,
        },
        _ = ctx.done() => settle.claim(Verdict::Expired),
    };
    if verdict == Verdict::Completed {
        return;
    }

    let cause = ctx.cause().unwrap_or(TaskError::Timeout { timeout });
    if cause.is_timeout() {
        publish(&cfg, Event::new(EventKind::TimeoutHit).with_timeout(timeout));
    }
    errs.append(cause);

    if let Some(cancel) = &cfg.cancel {
        errs.append(cleanup(cancel, ctx, &cfg).await.err());
    }
}

/// Runs the cleanup callback once, bounded by `cfg.cancel_timeout`.
async fn cleanup(cancel: &CancelFn, ctx: Context, cfg: &TaskConfig) -> Result<(), TaskError> {
    let limit = cfg.cancel_timeout_opt();
    let starting = Event::new(EventKind::CancelStarting);
    publish(
        cfg,
        match limit {
            Some(d) => starting.with_timeout(d),
            None => starting,
        },
    );

    let cancel = Arc::clone(cancel);
    let fut = guarded(cfg.catch_panics, async move { cancel(ctx).await });
    let res = match limit {
        Some(d) => bounded(d, fut).await,
        None => fut.await,
    };

    match &res {
        Ok(()) => {}
        Err(TaskError::CancelTimeout { timeout }) => publish(
            cfg,
            Event::new(EventKind::CancelTimeout).with_timeout(*timeout),
        ),
        Err(e) => publish(
            cfg,
            Event::new(EventKind::CancelFailed).with_reason(e.to_string()),
        ),
    }
    res
}

async fn bounded<F>(limit: Duration, fut: F) -> Result<(), TaskError>
where
    F: Future<Output = Result<(), TaskError>>,
{
    time::timeout(limit, fut)
        .await
        .unwrap_or(Err(TaskError::CancelTimeout { timeout: limit }))
}
