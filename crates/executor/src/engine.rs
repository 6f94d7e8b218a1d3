//! Per-event decision cycle
//!
//! filter -> size -> simulate both directions -> decide -> execute.
//! Everything before execution fails soft into a discard. Once a nonce is
//! claimed, failures are surfaced and the counter is resynced.

use alloy_primitives::{Address, Bytes, I256, U256};
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use triarb_core::{
    CoreResult, ExecutionAttempt, ExecutionResult, LoanAmount, Path, StrikeConfig,
    SubmissionReceipt,
};
use triarb_detector::{
    decide, generate_paths, CostModel, EventGate, RelevanceFilter, Verdict, WhaleGate,
};
use triarb_log_feed::SwapLog;

use crate::builder::TransactionBuilder;
use crate::nonce::NonceManager;
use crate::simulator::{PathSimulator, SimulationCall};
use crate::sizer::CapitalSizer;
use crate::submitter::{SubmitterConfig, TransactionSink, TransactionSubmitter};

const SUMMARY_EVERY: u64 = 50;

/// Why a cycle stopped short of execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscardReason {
    Filtered { gate: &'static str },
    SizingUnavailable(String),
    ZeroLoan,
    Unprofitable { best_profit: I256, floor: U256 },
}

/// Terminal state of one cycle
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    Discarded(DiscardReason),
    Submitted {
        attempt: ExecutionAttempt,
        receipt: SubmissionReceipt,
    },
}

impl CycleOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, CycleOutcome::Submitted { .. })
    }
}

/// Engine counters
#[derive(Debug, Default)]
pub struct EngineStats {
    processed: AtomicU64,
    filtered: AtomicU64,
    sizing_discards: AtomicU64,
    unprofitable: AtomicU64,
    submitted: AtomicU64,
    submission_failures: AtomicU64,
}

/// Point-in-time copy of [`EngineStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub processed: u64,
    pub filtered: u64,
    pub sizing_discards: u64,
    pub unprofitable: u64,
    pub submitted: u64,
    pub submission_failures: u64,
}

impl EngineStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            processed: self.processed.load(Ordering::Relaxed),
            filtered: self.filtered.load(Ordering::Relaxed),
            sizing_discards: self.sizing_discards.load(Ordering::Relaxed),
            unprofitable: self.unprofitable.load(Ordering::Relaxed),
            submitted: self.submitted.load(Ordering::Relaxed),
            submission_failures: self.submission_failures.load(Ordering::Relaxed),
        }
    }
}

/// External collaborators the engine drives
pub struct Collaborators {
    pub sizer: Arc<dyn CapitalSizer>,
    pub caller: Arc<dyn SimulationCall>,
    pub sink: Arc<dyn TransactionSink>,
    pub nonces: Arc<NonceManager>,
}

/// Re-entrant: share behind an `Arc` and call [`DecisionEngine::process`]
/// from as many tasks as there are events.
pub struct DecisionEngine {
    gates: Vec<Box<dyn EventGate>>,
    paths: [Path; 2],
    sizer: Arc<dyn CapitalSizer>,
    simulator: PathSimulator,
    costs: CostModel,
    nonces: Arc<NonceManager>,
    builder: TransactionBuilder,
    submitter: TransactionSubmitter,
    stats: EngineStats,
}

impl DecisionEngine {
    pub fn new(config: &StrikeConfig, parts: Collaborators) -> CoreResult<Self> {
        config.validate()?;
        let triangle = config.triangle.triangle()?;
        let account: Address = parts.nonces.account();

        let mut gates: Vec<Box<dyn EventGate>> = vec![Box::new(RelevanceFilter::new(&triangle))];
        if let Some(threshold) = config.feed.whale_threshold() {
            gates.push(Box::new(WhaleGate::new(threshold)));
        }

        Ok(Self {
            gates,
            paths: generate_paths(&triangle),
            sizer: parts.sizer,
            simulator: PathSimulator::new(
                parts.caller,
                config.target_contract,
                account,
                config.execution.simulation_timeout(),
            ),
            costs: CostModel::new(&config.costs),
            nonces: parts.nonces,
            builder: TransactionBuilder::new(
                config.chain,
                config.target_contract,
                account,
                &config.execution,
            ),
            submitter: TransactionSubmitter::new(
                parts.sink,
                SubmitterConfig::from(&config.execution),
            ),
            stats: EngineStats::default(),
        })
    }

    pub fn paths(&self) -> &[Path; 2] {
        &self.paths
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Run one full cycle for `log`
    pub async fn process(&self, log: &SwapLog) -> ExecutionResult<CycleOutcome> {
        let outcome = self.run_cycle(log).await;
        self.record(&outcome);
        outcome
    }

    async fn run_cycle(&self, log: &SwapLog) -> ExecutionResult<CycleOutcome> {
        if let Some(gate) = self.gates.iter().find(|g| !g.admits(log)) {
            return Ok(CycleOutcome::Discarded(DiscardReason::Filtered { gate: gate.name() }));
        }

        let loan = match self.sizer.loan_amount().await {
            Ok(loan) if loan.is_zero() => {
                return Ok(CycleOutcome::Discarded(DiscardReason::ZeroLoan));
            }
            Ok(loan) => loan,
            Err(e) => {
                debug!(target: "engine", error = %e, "Sizing unavailable");
                return Ok(CycleOutcome::Discarded(DiscardReason::SizingUnavailable(e.to_string())));
            }
        };

        let (first, second) = self.simulator.simulate_both(&self.paths, loan).await;
        let floor = self.costs.floor(loan);

        match decide(first, second, floor) {
            Verdict::Execute {
                path,
                profit,
                payload,
                floor,
            } => self.execute(path, loan, profit, payload, floor).await,
            Verdict::Discard { best_profit, floor } => {
                debug!(
                    target: "engine",
                    block = ?log.block(),
                    %best_profit,
                    %floor,
                    "Below cost floor"
                );
                Ok(CycleOutcome::Discarded(DiscardReason::Unprofitable { best_profit, floor }))
            }
        }
    }

    /// Claims a nonce, submits, and always settles the claim
    async fn execute(
        &self,
        path: Path,
        loan: LoanAmount,
        profit: I256,
        payload: Bytes,
        floor: U256,
    ) -> ExecutionResult<CycleOutcome> {
        let attempt = ExecutionAttempt {
            path,
            loan_amount: loan,
            call_payload: payload,
            nonce: self.nonces.claim().await?,
            expected_profit: profit,
            cost_floor: floor,
            created_at: Utc::now(),
        };

        let breakdown = self.costs.breakdown(attempt.loan_amount);
        info!(
            target: "execution",
            path = %attempt.path,
            loan = %attempt.loan_amount,
            profit = %attempt.expected_profit,
            gas = %breakdown.gas,
            loan_fee = %breakdown.loan_fee,
            floor = %attempt.cost_floor,
            nonce = attempt.nonce,
            "Striking"
        );

        let tx = self.builder.build(&attempt);
        let submitted = self.submitter.submit(&tx).await;
        let accepted = match &submitted {
            Ok(_) => true,
            Err(e) => e.is_in_pool(),
        };
        self.nonces.settle(attempt.nonce, accepted).await;

        match submitted {
            Ok(receipt) => Ok(CycleOutcome::Submitted { attempt, receipt }),
            Err(e) => {
                error!(
                    target: "execution",
                    nonce = attempt.nonce,
                    path = %attempt.path,
                    error = %e,
                    nonce_gap = e.is_nonce_gap(),
                    "Submission failed"
                );
                match self.nonces.resync().await {
                    Ok(next) => warn!(target: "nonce", next, "Nonce counter resynced after failed submission"),
                    Err(sync_err) => error!(target: "nonce", error = %sync_err, "Nonce resync failed; claims blocked until it succeeds"),
                }
                Err(e)
            }
        }
    }

    fn record(&self, outcome: &ExecutionResult<CycleOutcome>) {
        let counter = match outcome {
            Ok(CycleOutcome::Discarded(DiscardReason::Filtered { .. })) => &self.stats.filtered,
            Ok(CycleOutcome::Discarded(DiscardReason::SizingUnavailable(_)))
            | Ok(CycleOutcome::Discarded(DiscardReason::ZeroLoan)) => &self.stats.sizing_discards,
            Ok(CycleOutcome::Discarded(DiscardReason::Unprofitable { .. })) => &self.stats.unprofitable,
            Ok(CycleOutcome::Submitted { .. }) => &self.stats.submitted,
            Err(_) => &self.stats.submission_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        let processed = self.stats.processed.fetch_add(1, Ordering::Relaxed) + 1;
        if processed % SUMMARY_EVERY == 0 {
            let s = self.stats.snapshot();
            info!(
                target: "engine",
                processed = s.processed,
                filtered = s.filtered,
                sizing_discards = s.sizing_discards,
                unprofitable = s.unprofitable,
                submitted = s.submitted,
                submission_failures = s.submission_failures,
                "Engine summary"
            );
        }
    }
}
