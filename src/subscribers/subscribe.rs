//! # Event subscriber trait.
//!
//! [`Subscribe`] is the extension point for reacting to task events (logging,
//! metrics, alerts). Subscribers are driven by a [`SubscriberSet`](crate::SubscriberSet):
//!
//! - **Dedicated worker task** per subscriber
//! - **Per-subscriber bounded queue** (capacity via [`Subscribe::queue_capacity`])
//! - **Panic isolation** (panics are caught and reported as `EventKind::SubscriberPanicked`)
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use taskguard::{Event, EventKind, Subscribe};
//!
//! struct Timeouts;
//!
//! #[async_trait]
//! impl Subscribe for Timeouts {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::TimeoutHit {
//!             // bump a counter, page someone...
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "timeouts"
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event subscribers.
///
/// Called from a subscriber-dedicated worker task. Implementations should avoid
/// blocking the async runtime.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs/metrics).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    ///
    /// On overflow, events for this subscriber are **dropped**.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
