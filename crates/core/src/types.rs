//! Core type definitions

use alloy_primitives::{Address, Bytes, B256, I256, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{CoreError, CoreResult};

/// Loan size in base-asset units
pub type LoanAmount = U256;

/// Supported blockchain networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainId {
    Ethereum,
    Arbitrum,
    Base,
    Polygon,
}

impl ChainId {
    pub fn chain_id(&self) -> u64 {
        match self {
            ChainId::Ethereum => 1,
            ChainId::Arbitrum => 42161,
            ChainId::Base => 8453,
            ChainId::Polygon => 137,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ChainId::Ethereum => "ethereum",
            ChainId::Arbitrum => "arbitrum",
            ChainId::Base => "base",
            ChainId::Polygon => "polygon",
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Closed 3-hop loop: `[base, x, y, base]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Path([Address; 4]);

impl Path {
    pub fn new(hops: [Address; 4]) -> CoreResult<Self> {
        if hops[0] != hops[3] {
            return Err(CoreError::OpenPath {
                first: hops[0],
                last: hops[3],
            });
        }
        Ok(Self(hops))
    }

    /// `[base, first, second, base]`; closed by construction
    pub fn cycle(base: Address, first: Address, second: Address) -> Self {
        Self([base, first, second, base])
    }

    pub fn base(&self) -> Address {
        self.0[0]
    }

    pub fn hops(&self) -> &[Address; 4] {
        &self.0
    }

    /// The two tokens visited between leaving and returning to base
    pub fn intermediates(&self) -> [Address; 2] {
        [self.0[1], self.0[2]]
    }

    /// Same loop traversed the other way round
    pub fn reversed(&self) -> Self {
        Self([self.0[0], self.0[2], self.0[1], self.0[3]])
    }

    pub fn to_vec(&self) -> Vec<Address> {
        self.0.to_vec()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} -> {} -> {}", self.0[0], self.0[1], self.0[2], self.0[3])
    }
}

/// Projected outcome of running a loop with a given loan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationResult {
    pub predicted_profit: I256,
    pub call_payload: Option<Bytes>,
}

impl SimulationResult {
    pub fn succeeded(predicted_profit: I256, call_payload: Bytes) -> Self {
        Self {
            predicted_profit,
            call_payload: Some(call_payload),
        }
    }

    /// Zero-profit sentinel with no payload
    pub fn failed() -> Self {
        Self {
            predicted_profit: I256::ZERO,
            call_payload: None,
        }
    }

    /// True only if there is a payload to send and the projected profit is
    /// strictly above `floor`.
    pub fn clears(&self, floor: U256) -> bool {
        if self.call_payload.is_none() || !self.predicted_profit.is_positive() {
            return false;
        }
        self.predicted_profit.into_raw() > floor
    }
}

/// A trade that cleared its cost floor and holds a claimed nonce.
/// Consumed by exactly one submission.
#[derive(Debug, Clone)]
pub struct ExecutionAttempt {
    pub path: Path,
    pub loan_amount: LoanAmount,
    pub call_payload: Bytes,
    pub nonce: u64,
    pub expected_profit: I256,
    pub cost_floor: U256,
    pub created_at: DateTime<Utc>,
}

/// Acknowledgement that a transaction entered the pending pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub tx_hash: B256,
    pub nonce: u64,
    pub attempts: u32,
    pub latency_us: u64,
}
