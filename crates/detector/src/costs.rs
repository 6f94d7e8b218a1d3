//! Cost floor for a strike
//!
//! Everything is `U256` and saturating, so the floor can only move up as the
//! loan grows and never wraps.

use alloy_primitives::U256;

use triarb_core::{CostConfig, LoanAmount};

const BPS_DENOMINATOR: u64 = 10_000;

/// Per-component view of a floor, for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostBreakdown {
    pub gas: U256,
    pub loan_fee: U256,
    pub margin: U256,
    pub total: U256,
}

/// gas × price + loan × fee_bps / 10000 + margin
#[derive(Debug, Clone)]
pub struct CostModel {
    gas_cost: U256,
    fee_bps: U256,
    min_margin: U256,
}

impl CostModel {
    pub fn new(config: &CostConfig) -> Self {
        Self {
            gas_cost: U256::from(config.gas_units).saturating_mul(config.gas_price_wei),
            fee_bps: U256::from(config.fee_bps),
            min_margin: config.min_margin_wei,
        }
    }

    pub fn gas_cost(&self) -> U256 {
        self.gas_cost
    }

    /// Flash loan fee, rounded down
    pub fn loan_fee(&self, loan: LoanAmount) -> U256 {
        loan.saturating_mul(self.fee_bps) / U256::from(BPS_DENOMINATOR)
    }

    pub fn floor(&self, loan: LoanAmount) -> U256 {
        self.breakdown(loan).total
    }

    pub fn breakdown(&self, loan: LoanAmount) -> CostBreakdown {
        let loan_fee = self.loan_fee(loan);
        CostBreakdown {
            gas: self.gas_cost,
            loan_fee,
            margin: self.min_margin,
            total: self
                .gas_cost
                .saturating_add(loan_fee)
                .saturating_add(self.min_margin),
        }
    }
}
