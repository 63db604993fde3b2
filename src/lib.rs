//! # taskguard
//!
//! **Taskguard** runs a single async workload under a bounded lifetime.
//!
//! It enforces a deadline, cooperatively signals cancellation through a
//! [`Context`] when the deadline elapses, optionally runs a cleanup callback,
//! and returns every failure (workload error, timeout cause, cleanup error) as a
//! single [`TaskError`] that can be queried member by member.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   run(ctx, workload, [options])
//!        │
//!        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │ apply_options ──► TaskConfig (timeout, cancel, name, bus…)  │
//! └──────┬──────────────────────────────────────┬───────────────┘
//!        │ no timeout, no cleanup               │ otherwise
//!        ▼                                      ▼
//!   workload(ctx).await               derived = ctx.with_timeout_cause(..)
//!   (inline, unchanged result)              ┌───────┴────────┐
//!                                           ▼                ▼
//!                                    ┌────────────┐   ┌─────────────┐
//!                                    │   Worker   │   │   Watcher   │
//!                                    │ workload() │──►│ done | ctx  │
//!                                    └─────┬──────┘   └──────┬──────┘
//!                                          ▼                 ▼
//!                                   ┌──────────────────────────────┐
//!                                   │  ErrorGroup (shared, locked) │
//!                                   └──────────────┬───────────────┘
//!                                                  ▼
//!                                          error_or_nil()
//! ```
//!
//! Lifecycle events are published to an optional [`Bus`] and can be fanned out to
//! [`Subscribe`] implementations through a [`SubscriberSet`].
//!
//! ## Features
//! | Area              | Description                                                  | Key types / functions                      |
//! |-------------------|--------------------------------------------------------------|--------------------------------------------|
//! | **Supervision**   | Deadline, cooperative cancellation, bounded cleanup.         | [`run`], [`Context`]                       |
//! | **Options**       | Functional options, fail-fast.                               | [`TaskConfig`], [`TaskOption`]             |
//! | **Errors**        | Typed errors and multi-error aggregation.                    | [`TaskError`], [`ErrorGroup`], [`Errors`]  |
//! | **Events**        | Lifecycle events and subscribers.                            | [`Event`], [`Bus`], [`Subscribe`]          |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskguard::{Context, run, with_timeout};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let res = run(
//!         &Context::background(),
//!         |ctx: Context| async move {
//!             tokio::select! {
//!                 _ = ctx.done() => {}
//!                 _ = tokio::time::sleep(Duration::from_secs(10)) => {}
//!             }
//!             Ok(())
//!         },
//!         [with_timeout(Duration::from_millis(50))],
//!     )
//!     .await;
//!
//!     assert!(res.unwrap_err().is_timeout());
//! }
//! ```
mod config;
mod context;
mod core;
mod error;
mod events;
mod group;
mod options;
mod subscribers;

// ---- Public re-exports ----

pub use config::{CancelFn, CancelFuture, DEFAULT_CANCEL_TIMEOUT, DEFAULT_TASK_TIMEOUT, TaskConfig};
pub use context::Context;
pub use crate::core::run;
pub use error::{BoxError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use group::{ErrorGroup, Errors};
pub use options::{
    TaskOption, apply_options, with_bus, with_cancel, with_cancel_timeout, with_catch_panics,
    with_name, with_timeout,
};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
