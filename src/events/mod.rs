//! Task events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `run()` (starting), the Worker (stopped/failed/panicked),
//!   the Watcher (timeout and cleanup events), `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: anything holding `Bus::subscribe()`, typically a
//!   [`SubscriberSet`](crate::SubscriberSet) via `SubscriberSet::listen`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
