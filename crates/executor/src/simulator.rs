//! Read-only projection of a loop against the strike contract
//!
//! Every failure collapses into `SimulationResult::failed()`. The caller
//! cannot tell a revert from an unprofitable loop and is not meant to.

use alloy_primitives::{Address, Bytes, I256, U256};
use alloy_sol_types::{sol, SolCall};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

use triarb_core::{LoanAmount, Path, SimulationError, SimulationOutcome, SimulationResult};
use triarb_detector::Candidate;

sol! {
    /// Flash-borrows `amount` of `path[0]`, swaps along `path`, repays the
    /// loan and returns the net profit in base units.
    function executeTriangle(address[] path, uint256 amount) external returns (int256 profit);
}

/// `eth_call` style access to the node
#[async_trait]
pub trait SimulationCall: Send + Sync {
    async fn call(&self, to: Address, from: Address, data: Bytes) -> SimulationOutcome<Bytes>;
}

/// Calldata for `executeTriangle(path, amount)`
pub fn encode_call(path: &Path, amount: LoanAmount) -> Bytes {
    executeTriangleCall {
        path: path.to_vec(),
        amount,
    }
    .abi_encode()
    .into()
}

/// The contract returns a single int256 word
pub fn decode_profit(output: &[u8]) -> SimulationOutcome<I256> {
    if output.len() != 32 {
        return Err(SimulationError::Malformed { len: output.len() });
    }
    Ok(I256::from_raw(U256::from_be_slice(output)))
}

/// Runs `executeTriangle` as a call from the strike account
#[derive(Clone)]
pub struct PathSimulator {
    caller: Arc<dyn SimulationCall>,
    target: Address,
    from: Address,
    timeout: Duration,
}

impl PathSimulator {
    pub fn new(caller: Arc<dyn SimulationCall>, target: Address, from: Address, timeout: Duration) -> Self {
        Self {
            caller,
            target,
            from,
            timeout,
        }
    }

    pub async fn simulate(&self, path: &Path, amount: LoanAmount) -> SimulationResult {
        match self.try_simulate(path, amount).await {
            Ok(result) => result,
            Err(e) => {
                trace!(target: "engine", %path, error = %e, "Simulation failed");
                SimulationResult::failed()
            }
        }
    }

    async fn try_simulate(&self, path: &Path, amount: LoanAmount) -> SimulationOutcome<SimulationResult> {
        let payload = encode_call(path, amount);

        let output = tokio::time::timeout(
            self.timeout,
            self.caller.call(self.target, self.from, payload.clone()),
        )
        .await
        .map_err(|_| SimulationError::Timeout(self.timeout))??;

        let profit = decode_profit(&output)?;
        Ok(SimulationResult::succeeded(profit, payload))
    }

    /// Both directions with the same loan, joined
    pub async fn simulate_both(&self, paths: &[Path; 2], amount: LoanAmount) -> (Candidate, Candidate) {
        let (first, second) = tokio::join!(
            self.simulate(&paths[0], amount),
            self.simulate(&paths[1], amount),
        );
        (
            Candidate::new(paths[0], first),
            Candidate::new(paths[1], second),
        )
    }
}
