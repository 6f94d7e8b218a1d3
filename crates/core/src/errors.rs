//! Error types

use std::time::Duration;

use alloy_primitives::Address;
use thiserror::Error;

/// Core error types
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Config load error: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    #[error("Path does not close: starts at {first}, ends at {last}")]
    OpenPath { first: Address, last: Address },

    #[error("Triangle member listed twice: {0}")]
    DuplicateMember(Address),

    #[error("Zero address for {0}")]
    ZeroAddress(&'static str),
}

/// Log subscription errors
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("WebSocket connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Subscription failed: {0}")]
    SubscriptionFailed(String),

    #[error("Feed disconnected")]
    Disconnected,

    #[error("Invalid message format: {0}")]
    InvalidMessage(String),
}

/// Capital sizing errors
#[derive(Debug, Error)]
pub enum SizingError {
    #[error("Capital unavailable: {0}")]
    Unavailable(String),
}

/// Read-only simulation errors. Never surfaced past the simulator.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Call reverted: {0}")]
    Reverted(String),

    #[error("Malformed return data: {len} bytes")]
    Malformed { len: usize },

    #[error("Simulation timed out after {0:?}")]
    Timeout(Duration),
}

/// Submission and sequencing errors
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Nonce too low")]
    NonceTooLow,

    #[error("Nonce too high")]
    NonceTooHigh,

    #[error("Replacement transaction underpriced")]
    Underpriced,

    #[error("Insufficient balance")]
    InsufficientBalance,

    #[error("Transaction already in the node's pool")]
    AlreadyKnown,

    #[error("Transaction rejected: {0}")]
    Rejected(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Nonce sync failed: {0}")]
    NonceSync(String),
}

impl ExecutionError {
    /// Classify a node's rejection message.
    pub fn from_node_message(message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        if lower.contains("nonce too low") {
            ExecutionError::NonceTooLow
        } else if lower.contains("nonce too high") {
            ExecutionError::NonceTooHigh
        } else if lower.contains("underpriced") {
            ExecutionError::Underpriced
        } else if lower.contains("already known") || lower.contains("known transaction") {
            ExecutionError::AlreadyKnown
        } else if lower.contains("insufficient funds") {
            ExecutionError::InsufficientBalance
        } else {
            ExecutionError::Rejected(message.to_string())
        }
    }

    /// Only transport failures are worth resending with the same nonce;
    /// a node rejection will be rejected again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExecutionError::Transport(_))
    }

    /// The node holds this exact transaction, typically from an earlier
    /// send whose response was lost.
    pub fn is_in_pool(&self) -> bool {
        matches!(self, ExecutionError::AlreadyKnown)
    }

    pub fn is_nonce_gap(&self) -> bool {
        matches!(self, ExecutionError::NonceTooLow | ExecutionError::NonceTooHigh)
    }
}

/// Result type alias
pub type CoreResult<T> = Result<T, CoreError>;
pub type FeedResult<T> = Result<T, FeedError>;
pub type SizingResult<T> = Result<T, SizingError>;
pub type SimulationOutcome<T> = Result<T, SimulationError>;
pub type ExecutionResult<T> = Result<T, ExecutionError>;
