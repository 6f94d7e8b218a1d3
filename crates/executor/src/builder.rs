//! Transaction builder for strike execution

use alloy_primitives::{Address, Bytes, U256};

use triarb_core::{ChainId, ExecutionAttempt, ExecutionConfig};

/// Built transaction ready for submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltTransaction {
    pub chain_id: u64,
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub gas_limit: u64,
    pub max_fee_per_gas: u128,
    pub max_priority_fee: u128,
    pub nonce: u64,
}

/// Turns an attempt into a fully specified EIP-1559 call to the strike contract
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    chain: ChainId,
    target: Address,
    from: Address,
    gas_limit: u64,
    max_fee_per_gas: u128,
    max_priority_fee: u128,
}

impl TransactionBuilder {
    pub fn new(chain: ChainId, target: Address, from: Address, config: &ExecutionConfig) -> Self {
        Self {
            chain,
            target,
            from,
            gas_limit: config.gas_limit,
            max_fee_per_gas: config.max_fee_per_gas_wei,
            max_priority_fee: config.max_priority_fee_wei,
        }
    }

    /// The payload is sent exactly as it was simulated
    pub fn build(&self, attempt: &ExecutionAttempt) -> BuiltTransaction {
        BuiltTransaction {
            chain_id: self.chain.chain_id(),
            from: self.from,
            to: self.target,
            value: U256::ZERO,
            data: attempt.call_payload.clone(),
            gas_limit: self.gas_limit,
            max_fee_per_gas: self.max_fee_per_gas,
            max_priority_fee: self.max_priority_fee.min(self.max_fee_per_gas),
            nonce: attempt.nonce,
        }
    }
}
