//! Strike bot runtime
//!
//! Wires the swap-log feed into the decision engine and fans events out to
//! concurrent cycles.

pub mod dispatcher;

pub use dispatcher::{DispatchSummary, Dispatcher};
