//! Runtime core: supervised execution of one workload.
//!
//! The only public API from this module is [`run`].
//!
//! Internal modules:
//! - [`runner`]: executes the workload, publishes its terminal event; hosts the Worker unit;
//! - [`watcher`]: the Watcher unit, timeout cause and bounded cleanup;
//! - [`settle`]: the single completion-vs-deadline verdict both units claim;
//! - [`supervisor`]: option handling, fast/supervised path selection, joining both units.

mod runner;
mod settle;
mod supervisor;
mod watcher;

pub use supervisor::run;
