//! Core types and utilities for the triangular strike bot
//!
//! This crate provides shared types used across all components:
//! - Token and triangle definitions
//! - Loop paths, simulation results and execution attempts
//! - Static configuration
//! - Error taxonomy

pub mod types;
pub mod tokens;
pub mod config;
pub mod errors;

pub use types::*;
pub use tokens::*;
pub use config::*;
pub use errors::*;
