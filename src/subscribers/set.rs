//! # SubscriberSet: non-blocking fan-out over multiple subscribers
//!
//! [`SubscriberSet`] distributes each [`Event`] to multiple subscribers **without
//! awaiting** their processing.
//!
//! ## What it guarantees
//! - `emit(&Event)` returns immediately.
//! - Per-subscriber FIFO (queue order).
//! - Panics inside subscribers are caught (isolation) and reported on the bus
//!   when the set was created with [`SubscriberSet::listen`].
//!
//! ## What it does **not** guarantee
//! - No global ordering across different subscribers.
//! - No retries on per-subscriber queue overflow.
//!
//! ## Diagram
//! ```text
//!   Bus ──► listener ──► emit(&Event)
//!                          │                (Arc-clone per subscriber)
//!                          ├──────────► [queue S1] ─► worker S1 ─► on_event()
//!                          └──────────► [queue SN] ─► worker SN ─► on_event()
//! ```

use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::error::panic_message;
use crate::events::{Bus, Event};

use super::Subscribe;

/// Per-subscriber channel with metadata.
#[derive(Clone)]
struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Composite fan-out with per-subscriber bounded queues and worker tasks.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
    listener: Option<JoinHandle<()>>,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker per subscriber.
    ///
    /// Must be called within a tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        Self::build(subs, None)
    }

    /// Creates a set fed by `bus`: every event published there is fanned out.
    ///
    /// Subscriber panics and overflows are published back to `bus`.
    #[must_use]
    pub fn listen(subs: Vec<Arc<dyn Subscribe>>, bus: &Bus) -> Self {
        let mut set = Self::build(subs, Some(bus.clone()));
        let mut rx = bus.subscribe();
        let channels = set.channels.clone();
        let report = bus.clone();

        set.listener = Some(tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => fan_out(&channels, Some(&report), &ev),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }));
        set
    }

    fn build(subs: Vec<Arc<dyn Subscribe>>, report: Option<Bus>) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let cap = sub.queue_capacity().max(1);
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(cap);
            let report = report.clone();

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = sub.on_event(ev.as_ref());
                    if let Err(panic) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        let info = panic_message(&*panic);
                        match &report {
                            // Never report a failure about a failure report.
                            Some(bus) if !is_subscriber_event(&ev) => {
                                bus.publish(Event::subscriber_panicked(name, info));
                            }
                            _ => eprintln!("[taskguard] subscriber '{name}' panicked: {info}"),
                        }
                    }
                }
            });

            channels.push(SubscriberChannel { name, sender: tx });
            workers.push(handle);
        }

        Self {
            channels,
            workers,
            listener: None,
        }
    }

    /// Fan-out one event to all subscribers (non-blocking).
    ///
    /// If a subscriber's queue is **full** or **closed**, the event is dropped for it.
    pub fn emit(&self, event: &Event) {
        fan_out(&self.channels, None, event);
    }

    /// Graceful shutdown: stop listening, close all queues and await worker completion.
    ///
    /// Events already queued are still delivered.
    pub async fn shutdown(self) {
        if let Some(listener) = self.listener {
            listener.abort();
            let _ = listener.await;
        }
        drop(self.channels);
        for h in self.workers {
            let _ = h.await;
        }
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }
}

fn is_subscriber_event(ev: &Event) -> bool {
    ev.is_subscriber_overflow() || ev.is_subscriber_panic()
}

fn fan_out(channels: &[SubscriberChannel], report: Option<&Bus>, event: &Event) {
    let ev = Arc::new(event.clone());
    for channel in channels {
        let reason = match channel.sender.try_send(Arc::clone(&ev)) {
            Ok(()) => continue,
            Err(mpsc::error::TrySendError::Full(_)) => "full",
            Err(mpsc::error::TrySendError::Closed(_)) => "closed",
        };
        match report {
            Some(bus) if !is_subscriber_event(event) => {
                bus.publish(Event::subscriber_overflow(channel.name, reason));
            }
            _ => eprintln!(
                "[taskguard] subscriber '{}' dropped event: {reason}",
                channel.name
            ),
        }
    }
}
