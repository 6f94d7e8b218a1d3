//! Go/no-go decision over the two simulated directions

use alloy_primitives::{Bytes, I256, U256};

use triarb_core::{Path, SimulationResult};

/// A direction and what simulating it predicted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: Path,
    pub result: SimulationResult,
}

impl Candidate {
    pub fn new(path: Path, result: SimulationResult) -> Self {
        Self { path, result }
    }

    pub fn profit(&self) -> I256 {
        self.result.predicted_profit
    }
}

/// Outcome of the deciding step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Execute {
        path: Path,
        profit: I256,
        payload: Bytes,
        floor: U256,
    },
    Discard {
        best_profit: I256,
        floor: U256,
    },
}

impl Verdict {
    pub fn is_execute(&self) -> bool {
        matches!(self, Verdict::Execute { .. })
    }
}

/// The second candidate wins only with a strictly greater profit
pub fn select_best(first: Candidate, second: Candidate) -> Candidate {
    if second.profit() > first.profit() {
        second
    } else {
        first
    }
}

pub fn decide(first: Candidate, second: Candidate, floor: U256) -> Verdict {
    let best = select_best(first, second);
    let profit = best.profit();
    let clears = best.result.clears(floor);

    match (clears, best.result.call_payload) {
        (true, Some(payload)) => Verdict::Execute {
            path: best.path,
            profit,
            payload,
            floor,
        },
        _ => Verdict::Discard {
            best_profit: profit,
            floor,
        },
    }
}
