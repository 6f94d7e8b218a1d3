//! Opportunity detection for a fixed token triangle
//!
//! Features:
//! - Allocation-free topic relevance filter
//! - Optional swap-size gate
//! - Both loop directions from a static triangle
//! - Integer cost floor
//! - Deterministic best-direction selection

pub mod filter;
pub mod paths;
pub mod costs;
pub mod decision;

pub use filter::{EventGate, RelevanceFilter, WhaleGate};
pub use paths::generate_paths;
pub use costs::{CostBreakdown, CostModel};
pub use decision::{decide, select_best, Candidate, Verdict};
