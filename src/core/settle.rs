//! # Single verdict shared by the Worker and the Watcher.
//!
//! Both units race to record how the invocation ended; the first claim wins and
//! every later claim reads it back.
//!
//! ```text
//! Worker  (workload returned) ── claim(Completed | Expired) ──┐
//!                                                             ├─► PENDING → first verdict
//! Watcher (ctx.done() fired)  ── claim(Expired) ──────────────┘
//! ```
//!
//! The Worker claims `Expired` when the deadline already passed at the moment it
//! claims, so a workload returning late is never reported as completed.

use std::sync::atomic::{AtomicU8, Ordering};

const PENDING: u8 = 0;
const COMPLETED: u8 = 1;
const EXPIRED: u8 = 2;

/// How a supervised invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verdict {
    /// The workload finished before the deadline.
    Completed,
    /// The deadline (or the parent's cancellation) came first.
    Expired,
}

impl Verdict {
    fn as_raw(self) -> u8 {
        match self {
            Verdict::Completed => COMPLETED,
            Verdict::Expired => EXPIRED,
        }
    }

    fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            COMPLETED => Some(Verdict::Completed),
            EXPIRED => Some(Verdict::Expired),
            _ => None,
        }
    }
}

/// Write-once verdict cell.
#[derive(Debug)]
pub(crate) struct Settle(AtomicU8);

impl Settle {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(PENDING))
    }

    /// Records `verdict` unless one is already recorded; returns the verdict that stands.
    pub(crate) fn claim(&self, verdict: Verdict) -> Verdict {
        match self
            .0
            .compare_exchange(PENDING, verdict.as_raw(), Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => verdict,
            Err(prev) => Verdict::from_raw(prev).unwrap_or(verdict),
        }
    }
}
