//! # LogWriter: simple event printer
//!
//! A minimal subscriber that prints incoming [`Event`]s to stdout.
//! Use it for tests or demos.
//!
//! ## Example output
//! ```text
//! [starting] task="import" timeout_ms=Some(100)
//! [timeout] task="import" timeout_ms=Some(100)
//! [cancel-starting] task="import" timeout_ms=Some(30000)
//! [cancel-failed] task="import" err="execution failed: cancel failed"
//! [failed] task="import" err="execution failed: boom"
//! [stopped] task="import"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::TaskStarting => {
                println!("[starting] task={task:?} timeout_ms={:?}", e.timeout_ms);
            }
            EventKind::TaskStopped => {
                println!("[stopped] task={task:?}");
            }
            EventKind::TaskFailed => {
                println!("[failed] task={task:?} err={:?}", e.reason);
            }
            EventKind::TaskPanicked => {
                println!("[panicked] task={task:?} err={:?}", e.reason);
            }
            EventKind::TimeoutHit => {
                println!("[timeout] task={task:?} timeout_ms={:?}", e.timeout_ms);
            }
            EventKind::CancelStarting => {
                println!("[cancel-starting] task={task:?} timeout_ms={:?}", e.timeout_ms);
            }
            EventKind::CancelFailed => {
                println!("[cancel-failed] task={task:?} err={:?}", e.reason);
            }
            EventKind::CancelTimeout => {
                println!("[cancel-timeout] task={task:?} timeout_ms={:?}", e.timeout_ms);
            }
            EventKind::SubscriberPanicked => {
                println!("[subscriber-panicked] subscriber={task:?} err={:?}", e.reason);
            }
            EventKind::SubscriberOverflow => {
                println!("[subscriber-overflow] {:?}", e.reason);
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
