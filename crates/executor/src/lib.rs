//! Strike execution
//!
//! Features:
//! - Read-only simulation of both loop directions against the strike contract
//! - Nonce management for concurrent submissions from one account
//! - EIP-1559 transaction building and submission with transport retries
//! - The per-event decision engine tying detector and execution together

pub mod builder;
pub mod engine;
pub mod nonce;
pub mod rpc;
pub mod simulator;
pub mod sizer;
pub mod submitter;

pub use builder::{BuiltTransaction, TransactionBuilder};
pub use engine::{
    Collaborators, CycleOutcome, DecisionEngine, DiscardReason, EngineStats, StatsSnapshot,
};
pub use nonce::{NonceManager, NonceSource};
pub use rpc::RpcNode;
pub use simulator::{decode_profit, encode_call, PathSimulator, SimulationCall};
pub use sizer::{CapitalSizer, StaticSizer};
pub use submitter::{SubmitterConfig, TransactionSink, TransactionSubmitter};
