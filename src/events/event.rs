//! # Events emitted while a task is supervised.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Lifecycle events**: workload flow (starting, stopped, failed, timeout, panicked)
//! - **Cleanup events**: the cancel callback run after a timeout
//! - **Subscriber events**: delivery problems inside a [`SubscriberSet`](crate::SubscriberSet)
//!
//! The [`Event`] struct carries additional metadata such as timestamps, task name and reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskguard::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TimeoutHit)
//!     .with_task("import")
//!     .with_timeout(Duration::from_millis(250));
//!
//! assert_eq!(ev.kind, EventKind::TimeoutHit);
//! assert_eq!(ev.task.as_deref(), Some("import"));
//! assert_eq!(ev.timeout_ms, Some(250));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Task lifecycle events ===
    /// Workload is about to run.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `timeout_ms`: applied timeout (supervised path only)
    TaskStarting,

    /// Workload returned `Ok(())`.
    ///
    /// Sets:
    /// - `task`: task name
    TaskStopped,

    /// Workload returned an error.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `reason`: failure message
    TaskFailed,

    /// Workload panicked and the panic was caught.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `reason`: panic message
    TaskPanicked,

    /// Deadline elapsed before the workload completed.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `timeout_ms`: the timeout that was exceeded
    TimeoutHit,

    // === Cleanup events ===
    /// Cleanup callback is about to run.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `timeout_ms`: cleanup bound, if any
    CancelStarting,

    /// Cleanup callback returned an error (or panicked and was caught).
    ///
    /// Sets:
    /// - `task`: task name
    /// - `reason`: failure message
    CancelFailed,

    /// Cleanup callback exceeded its bound.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `timeout_ms`: cleanup bound
    CancelTimeout,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the task, if applicable.
    pub task: Option<Arc<str>>,
    /// Timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            timeout_ms: None,
            reason: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a timeout duration (stored as milliseconds, saturating).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = u32::try_from(d.as_millis()).unwrap_or(u32::MAX);
        self.timeout_ms = Some(ms);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    #[inline]
    pub fn is_subscriber_panic(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberPanicked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_increase() {
        let a = Event::new(EventKind::TaskStarting);
        let b = Event::new(EventKind::TaskStopped);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn timeout_saturates() {
        let ev = Event::new(EventKind::TimeoutHit).with_timeout(Duration::MAX);
        assert_eq!(ev.timeout_ms, Some(u32::MAX));
    }

    #[test]
    fn subscriber_helpers_set_kind() {
        let ev = Event::subscriber_overflow("audit", "full");
        assert!(ev.is_subscriber_overflow());
        assert_eq!(ev.reason.as_deref(), Some("subscriber=audit reason=full"));
        assert!(Event::subscriber_panicked("audit", "boom".into()).is_subscriber_panic());
    }
}
