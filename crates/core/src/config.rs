//! Configuration types
//!
//! Loaded once at startup from an optional TOML file layered under
//! `TRIARB__*` environment variables. Wei amounts are written as decimal or
//! `0x` strings.

use alloy_primitives::{address, Address, U256};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{ChainId, CoreError, CoreResult, Triangle};

/// 1 gwei
const GWEI: u64 = 1_000_000_000;
/// 1 ether
const ETHER: u128 = 1_000_000_000_000_000_000;

/// The three loop tokens. `base` is borrowed and must be returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TriangleConfig {
    pub base: Address,
    pub first: Address,
    pub second: Address,
}

impl Default for TriangleConfig {
    fn default() -> Self {
        Self {
            base: address!("4200000000000000000000000000000000000006"),   // WETH
            first: address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"),  // USDC
            second: address!("2Ae3F1Ec7F1F5563a3d161649c025dac7e983970"), // cbETH
        }
    }
}

impl TriangleConfig {
    pub fn triangle(&self) -> CoreResult<Triangle> {
        Triangle::new(self.base, self.first, self.second)
    }
}

/// Inputs to the cost floor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    pub gas_units: u64,
    pub gas_price_wei: U256,
    pub fee_bps: u32,
    pub min_margin_wei: U256,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            gas_units: 1_200_000,                      // 3-hop swap plus flash loan
            gas_price_wei: U256::from(GWEI / 20),      // 0.05 gwei, conservative for Base
            fee_bps: 9,                                // 0.09% flash loan fee
            min_margin_wei: U256::from(ETHER / 200),   // 0.005 ETH
        }
    }
}

/// Execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub rpc_url: String,
    pub gas_limit: u64,
    pub max_fee_per_gas_wei: u128,
    pub max_priority_fee_wei: u128,
    pub simulation_timeout_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    /// Cycles allowed to run at once; further events wait in the feed channel
    pub max_in_flight_cycles: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            rpc_url: "wss://mainnet.base.org".to_string(),
            gas_limit: 1_200_000,
            max_fee_per_gas_wei: (GWEI / 10) as u128,     // 0.1 gwei
            max_priority_fee_wei: (GWEI / 100) as u128,   // 0.01 gwei
            simulation_timeout_ms: 1_500,
            max_retries: 2,
            retry_delay_ms: 100,
            max_in_flight_cycles: 64,
        }
    }
}

impl ExecutionConfig {
    pub fn simulation_timeout(&self) -> Duration {
        Duration::from_millis(self.simulation_timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Event subscription configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub ws_url: String,
    pub reconnect_delay_ms: u64,
    pub max_reconnects: u32,
    pub channel_capacity: usize,
    /// Swap size gate. Off unless `whale_gate` is set.
    pub whale_threshold_wei: U256,
    pub whale_gate: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            ws_url: "wss://mainnet.base.org".to_string(),
            reconnect_delay_ms: 1_000,
            max_reconnects: 10,
            channel_capacity: 4_096,
            whale_threshold_wei: U256::from(5 * ETHER),
            whale_gate: false,
        }
    }
}

impl FeedConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn whale_threshold(&self) -> Option<U256> {
        self.whale_gate.then_some(self.whale_threshold_wei)
    }
}

/// Capital sizing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    pub loan_amount_wei: U256,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            loan_amount_wei: U256::from(10 * ETHER),
        }
    }
}

/// Complete bot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrikeConfig {
    pub chain: ChainId,
    pub target_contract: Address,
    pub triangle: TriangleConfig,
    pub costs: CostConfig,
    pub execution: ExecutionConfig,
    pub feed: FeedConfig,
    pub sizing: SizingConfig,
}

impl Default for StrikeConfig {
    fn default() -> Self {
        Self {
            chain: ChainId::Base,
            target_contract: address!("83EF5c401fAa5B9674BAfAcFb089b30bAc67C9A0"),
            triangle: TriangleConfig::default(),
            costs: CostConfig::default(),
            execution: ExecutionConfig::default(),
            feed: FeedConfig::default(),
            sizing: SizingConfig::default(),
        }
    }
}

impl StrikeConfig {
    /// Load from an optional file, then `TRIARB__SECTION__KEY` overrides.
    pub fn load(path: &str) -> CoreResult<Self> {
        let loaded: StrikeConfig = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("TRIARB")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        loaded.validate()?;
        Ok(loaded)
    }

    pub fn validate(&self) -> CoreResult<()> {
        self.triangle.triangle()?;

        if self.target_contract.is_zero() {
            return Err(CoreError::ZeroAddress("target contract"));
        }
        if self.costs.fee_bps >= 10_000 {
            return Err(CoreError::InvalidConfig(format!(
                "fee_bps {} must be below 10000",
                self.costs.fee_bps
            )));
        }
        if self.execution.gas_limit == 0 {
            return Err(CoreError::InvalidConfig("gas_limit must be non-zero".into()));
        }
        if self.execution.simulation_timeout_ms == 0 {
            return Err(CoreError::InvalidConfig(
                "simulation_timeout_ms must be non-zero".into(),
            ));
        }
        if self.execution.max_in_flight_cycles == 0 {
            return Err(CoreError::InvalidConfig(
                "max_in_flight_cycles must be non-zero".into(),
            ));
        }
        if self.feed.channel_capacity == 0 {
            return Err(CoreError::InvalidConfig("channel_capacity must be non-zero".into()));
        }
        Ok(())
    }
}
