//! Decision engine behaviour against scripted collaborators

use alloy_primitives::{Address, Bytes, B256, I256, U256};
use async_trait::async_trait;
use parking_lot::Mutex;
use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use triarb_core::{
    CostConfig, ExecutionError, ExecutionResult, SimulationError, SimulationOutcome,
    SizingError, SizingResult, StrikeConfig,
};
use triarb_executor::{
    encode_call, BuiltTransaction, CapitalSizer, Collaborators, CycleOutcome, DecisionEngine,
    DiscardReason, NonceManager, NonceSource, SimulationCall, TransactionSink,
};
use triarb_log_feed::{SwapLog, SWAP_TOPIC};

const LOAN: u64 = 1_000;

struct Sizer {
    amount: Option<U256>,
    calls: AtomicUsize,
}

#[async_trait]
impl CapitalSizer for Sizer {
    async fn loan_amount(&self) -> SizingResult<U256> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.amount
            .ok_or_else(|| SizingError::Unavailable("no quote".into()))
    }
}

/// Answers by calldata; anything unscripted reverts
#[derive(Default)]
struct Node {
    profits: HashMap<Bytes, i64>,
    calls: AtomicUsize,
}

#[async_trait]
impl SimulationCall for Node {
    async fn call(&self, _to: Address, _from: Address, data: Bytes) -> SimulationOutcome<Bytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.profits.get(&data) {
            Some(p) => Ok(word(*p)),
            None => Err(SimulationError::Reverted("execution reverted".into())),
        }
    }
}

/// Records every send; rejects all of them when `reject` is set
#[derive(Default)]
struct Sink {
    reject: bool,
    sent: Mutex<Vec<BuiltTransaction>>,
}

#[async_trait]
impl TransactionSink for Sink {
    async fn send(&self, tx: &BuiltTransaction) -> ExecutionResult<B256> {
        self.sent.lock().push(tx.clone());
        if self.reject {
            return Err(ExecutionError::Rejected("replacement transaction underpriced".into()));
        }
        Ok(B256::with_last_byte(tx.nonce as u8))
    }
}

struct Chain {
    pending: AtomicU64,
    queries: AtomicUsize,
}

#[async_trait]
impl NonceSource for Chain {
    async fn pending_nonce(&self, _account: Address) -> ExecutionResult<u64> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.pending.load(Ordering::SeqCst))
    }
}

struct Harness {
    engine: DecisionEngine,
    sizer: Arc<Sizer>,
    node: Arc<Node>,
    sink: Arc<Sink>,
    chain: Arc<Chain>,
}

fn word(v: i64) -> Bytes {
    Bytes::from(I256::try_from(v).unwrap().into_raw().to_be_bytes::<32>().to_vec())
}

/// Floor for a 1000 loan is 20 gas + 10 fee = 30
fn config() -> StrikeConfig {
    let mut config = StrikeConfig::default();
    config.costs = CostConfig {
        gas_units: 1,
        gas_price_wei: U256::from(20),
        fee_bps: 100,
        min_margin_wei: U256::ZERO,
    };
    config.execution.retry_delay_ms = 0;
    config
}

/// `profits` are (first direction, second direction); `None` reverts
async fn harness(
    loan: Option<u64>,
    profits: (Option<i64>, Option<i64>),
    reject: bool,
    start_nonce: u64,
) -> Harness {
    harness_with(config(), loan, profits, reject, start_nonce).await
}

async fn harness_with(
    config: StrikeConfig,
    loan: Option<u64>,
    profits: (Option<i64>, Option<i64>),
    reject: bool,
    start_nonce: u64,
) -> Harness {
    let triangle = config.triangle.triangle().unwrap();
    let paths = triarb_detector::generate_paths(&triangle);
    let amount = U256::from(loan.unwrap_or(LOAN));

    let mut scripted = HashMap::new();
    if let Some(p) = profits.0 {
        scripted.insert(encode_call(&paths[0], amount), p);
    }
    if let Some(p) = profits.1 {
        scripted.insert(encode_call(&paths[1], amount), p);
    }

    let sizer = Arc::new(Sizer {
        amount: loan.map(U256::from),
        calls: AtomicUsize::new(0),
    });
    let node = Arc::new(Node {
        profits: scripted,
        calls: AtomicUsize::new(0),
    });
    let sink = Arc::new(Sink {
        reject,
        sent: Mutex::new(Vec::new()),
    });
    let chain = Arc::new(Chain {
        pending: AtomicU64::new(start_nonce),
        queries: AtomicUsize::new(0),
    });

    let nonces = NonceManager::synced(Address::repeat_byte(0x11), chain.clone())
        .await
        .unwrap();

    let engine = DecisionEngine::new(
        &config,
        Collaborators {
            sizer: sizer.clone(),
            caller: node.clone(),
            sink: sink.clone(),
            nonces: Arc::new(nonces),
        },
    )
    .unwrap();

    Harness {
        engine,
        sizer,
        node,
        sink,
        chain,
    }
}

fn relevant_log() -> SwapLog {
    let config = config();
    SwapLog::from_topics(vec![SWAP_TOPIC, config.triangle.first.into_word()])
}

#[tokio::test]
async fn test_irrelevant_event_touches_nothing() {
    let h = harness(Some(LOAN), (Some(50), Some(5)), false, 0).await;
    let log = SwapLog::from_topics(vec![SWAP_TOPIC, Address::repeat_byte(0x77).into_word()]);

    let outcome = h.engine.process(&log).await.unwrap();

    assert!(matches!(
        outcome,
        CycleOutcome::Discarded(DiscardReason::Filtered { gate: "relevance" })
    ));
    assert_eq!(h.sizer.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.node.calls.load(Ordering::SeqCst), 0);
    assert!(h.sink.sent.lock().is_empty());
    assert_eq!(h.engine.stats().filtered, 1);
}

fn amount_word(amount: u64) -> Bytes {
    Bytes::from(U256::from(amount).to_be_bytes::<32>().to_vec())
}

async fn whale_harness() -> Harness {
    let mut config = config();
    config.feed.whale_gate = true;
    config.feed.whale_threshold_wei = U256::from(10_000);
    harness_with(config, Some(LOAN), (Some(50), Some(5)), false, 0).await
}

#[tokio::test]
async fn test_whale_gate_discards_small_swap() {
    let h = whale_harness().await;
    let log = relevant_log().with_data(amount_word(9_999));

    let outcome = h.engine.process(&log).await.unwrap();

    assert!(matches!(
        outcome,
        CycleOutcome::Discarded(DiscardReason::Filtered { gate: "whale" })
    ));
    assert_eq!(h.sizer.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.node.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.engine.stats().filtered, 1);
}

#[tokio::test]
async fn test_whale_gate_admits_large_swap() {
    let h = whale_harness().await;
    let log = relevant_log().with_data(amount_word(10_000));

    let outcome = h.engine.process(&log).await.unwrap();

    assert!(outcome.is_submitted());
    assert_eq!(h.sink.sent.lock().len(), 1);
}

#[tokio::test]
async fn test_better_direction_is_executed_once() {
    let h = harness(Some(LOAN), (Some(50), Some(5)), false, 7).await;
    let expected_path = h.engine.paths()[0];
    let expected_payload = encode_call(&expected_path, U256::from(LOAN));

    let outcome = h.engine.process(&relevant_log()).await.unwrap();

    match outcome {
        CycleOutcome::Submitted { attempt, receipt } => {
            assert_eq!(attempt.path, expected_path);
            assert_eq!(attempt.expected_profit, I256::try_from(50i64).unwrap());
            assert_eq!(attempt.cost_floor, U256::from(30));
            assert_eq!(attempt.nonce, 7);
            assert_eq!(receipt.nonce, 7);
            assert_eq!(receipt.attempts, 1);
        }
        other => panic!("expected submission, got {:?}", other),
    }

    assert_eq!(h.node.calls.load(Ordering::SeqCst), 2);
    let sent = h.sink.sent.lock();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].data, expected_payload);
    assert_eq!(sent[0].nonce, 7);
}

#[tokio::test]
async fn test_reverse_direction_can_win() {
    let h = harness(Some(LOAN), (Some(5), Some(80)), false, 0).await;
    let reverse = h.engine.paths()[1];

    let outcome = h.engine.process(&relevant_log()).await.unwrap();

    match outcome {
        CycleOutcome::Submitted { attempt, .. } => assert_eq!(attempt.path, reverse),
        other => panic!("expected submission, got {:?}", other),
    }
}

#[tokio::test]
async fn test_zero_profit_is_discarded() {
    let h = harness(Some(LOAN), (Some(0), Some(0)), false, 0).await;

    let outcome = h.engine.process(&relevant_log()).await.unwrap();

    assert!(matches!(
        outcome,
        CycleOutcome::Discarded(DiscardReason::Unprofitable { .. })
    ));
    assert!(h.sink.sent.lock().is_empty());
}

#[tokio::test]
async fn test_profit_at_floor_is_discarded() {
    let h = harness(Some(LOAN), (Some(30), Some(-4)), false, 0).await;

    let outcome = h.engine.process(&relevant_log()).await.unwrap();

    match outcome {
        CycleOutcome::Discarded(DiscardReason::Unprofitable { best_profit, floor }) => {
            assert_eq!(best_profit, I256::try_from(30i64).unwrap());
            assert_eq!(floor, U256::from(30));
        }
        other => panic!("expected discard, got {:?}", other),
    }
    assert_eq!(h.engine.stats().unprofitable, 1);
}

#[tokio::test]
async fn test_reverted_simulations_never_execute() {
    let h = harness(Some(LOAN), (None, None), false, 0).await;

    let outcome = h.engine.process(&relevant_log()).await.unwrap();

    assert!(!outcome.is_submitted());
    assert_eq!(h.node.calls.load(Ordering::SeqCst), 2);
    assert!(h.sink.sent.lock().is_empty());
}

#[tokio::test]
async fn test_sizing_failure_discards() {
    let h = harness(None, (Some(50), Some(5)), false, 0).await;

    let outcome = h.engine.process(&relevant_log()).await.unwrap();

    assert!(matches!(
        outcome,
        CycleOutcome::Discarded(DiscardReason::SizingUnavailable(_))
    ));
    assert_eq!(h.node.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_zero_loan_discards() {
    let h = harness(Some(0), (Some(50), Some(5)), false, 0).await;

    let outcome = h.engine.process(&relevant_log()).await.unwrap();

    assert!(matches!(outcome, CycleOutcome::Discarded(DiscardReason::ZeroLoan)));
    assert_eq!(h.node.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.engine.stats().sizing_discards, 1);
}

#[tokio::test]
async fn test_rejected_submission_surfaces_and_resyncs() {
    let h = harness(Some(LOAN), (Some(50), Some(5)), true, 3).await;
    assert_eq!(h.chain.queries.load(Ordering::SeqCst), 1);

    let err = h.engine.process(&relevant_log()).await.unwrap_err();

    assert!(matches!(err, ExecutionError::Rejected(_)));
    // rejections are not retried
    assert_eq!(h.sink.sent.lock().len(), 1);
    assert_eq!(h.chain.queries.load(Ordering::SeqCst), 2);
    assert_eq!(h.engine.stats().submission_failures, 1);

    // the chain never saw nonce 3, so it is reused
    let _ = h.engine.process(&relevant_log()).await;
    let sent = h.sink.sent.lock();
    assert_eq!(sent[1].nonce, 3);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_concurrent_cycles_claim_distinct_contiguous_nonces(
        cycles in 1usize..24,
        start in 0u64..1_000,
    ) {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(4)
            .enable_all()
            .build()
            .unwrap();

        let mut nonces = runtime.block_on(async {
            let h = Arc::new(harness(Some(LOAN), (Some(50), Some(5)), false, start).await);
            let log = relevant_log();

            let tasks: Vec<_> = (0..cycles)
                .map(|_| {
                    let h = h.clone();
                    let log = log.clone();
                    tokio::spawn(async move { h.engine.process(&log).await })
                })
                .collect();

            for outcome in futures::future::join_all(tasks).await {
                assert!(outcome.unwrap().unwrap().is_submitted());
            }

            let nonces: Vec<u64> = h.sink.sent.lock().iter().map(|tx| tx.nonce).collect();
            nonces
        });

        nonces.sort_unstable();
        let expected: Vec<u64> = (start..start + cycles as u64).collect();
        prop_assert_eq!(nonces, expected);
    }
}
