//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out, and
//! (with the `logging` feature) the [`LogWriter`] printer.
//!
//! ## Architecture
//! ```text
//! run() ── publish(Event) ──► Bus ──► SubscriberSet::listen
//!                                          │
//!                                 ┌────────┼─────────┐
//!                                 ▼        ▼         ▼
//!                             LogWriter  Metrics   Custom ...
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
