//! Fans swap events out to concurrent engine cycles

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use triarb_core::ExecutionResult;
use triarb_executor::{CycleOutcome, DecisionEngine};
use triarb_log_feed::SwapLog;

/// What the dispatcher saw over its lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub received: u64,
    pub submitted: u64,
    pub discarded: u64,
    pub failed: u64,
}

impl DispatchSummary {
    fn tally(&mut self, finished: Result<ExecutionResult<CycleOutcome>, JoinError>) {
        match finished {
            Ok(Ok(CycleOutcome::Submitted { attempt, receipt })) => {
                self.submitted += 1;
                info!(
                    target: "execution",
                    tx_hash = %receipt.tx_hash,
                    nonce = receipt.nonce,
                    path = %attempt.path,
                    profit = %attempt.expected_profit,
                    latency_us = receipt.latency_us,
                    "Strike submitted"
                );
            }
            Ok(Ok(CycleOutcome::Discarded(reason))) => {
                self.discarded += 1;
                debug!(target: "engine", ?reason, "Cycle discarded");
            }
            Ok(Err(e)) => {
                self.failed += 1;
                warn!(target: "engine", error = %e, "Cycle failed");
            }
            Err(e) => {
                self.failed += 1;
                error!(target: "engine", error = %e, "Cycle task aborted");
            }
        }
    }
}

/// One spawned cycle per event, no ordering between them. At most
/// `max_in_flight` cycles run at once; past that, events stay queued in the
/// channel and the feed sees backpressure.
pub struct Dispatcher {
    engine: Arc<DecisionEngine>,
    max_in_flight: usize,
}

impl Dispatcher {
    pub fn new(engine: Arc<DecisionEngine>, max_in_flight: usize) -> Self {
        Self {
            engine,
            max_in_flight: max_in_flight.max(1),
        }
    }

    /// Runs until `shutdown` fires or the event channel closes, then waits
    /// for every in-flight cycle so claimed nonces are settled.
    pub async fn run(
        &self,
        mut events: mpsc::Receiver<SwapLog>,
        mut shutdown: oneshot::Receiver<()>,
    ) -> DispatchSummary {
        let mut cycles = JoinSet::new();
        let mut summary = DispatchSummary::default();

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, no longer accepting events");
                    break;
                }
                event = events.recv(), if cycles.len() < self.max_in_flight => match event {
                    Some(log) => {
                        summary.received += 1;
                        let engine = Arc::clone(&self.engine);
                        cycles.spawn(async move { engine.process(&log).await });
                    }
                    None => {
                        info!("Event channel closed");
                        break;
                    }
                },
                Some(finished) = cycles.join_next(), if !cycles.is_empty() => {
                    summary.tally(finished);
                }
            }
        }

        if !cycles.is_empty() {
            info!(in_flight = cycles.len(), "Waiting for in-flight cycles");
        }
        while let Some(finished) = cycles.join_next().await {
            summary.tally(finished);
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, Bytes, B256, U256};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use triarb_core::{SimulationOutcome, StrikeConfig};
    use triarb_executor::{
        BuiltTransaction, Collaborators, NonceManager, NonceSource, SimulationCall,
        StaticSizer, TransactionSink,
    };
    use triarb_log_feed::SWAP_TOPIC;

    /// Every simulation returns one ether of profit
    struct Rich;

    #[async_trait]
    impl SimulationCall for Rich {
        async fn call(&self, _to: Address, _from: Address, _data: Bytes) -> SimulationOutcome<Bytes> {
            let ether = U256::from(1_000_000_000_000_000_000u128);
            Ok(Bytes::from(ether.to_be_bytes::<32>().to_vec()))
        }
    }

    /// Accepts after a short delay, tracking how many sends overlap
    #[derive(Default)]
    struct Accepting {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl TransactionSink for Accepting {
        async fn send(&self, tx: &BuiltTransaction) -> ExecutionResult<B256> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(B256::with_last_byte(tx.nonce as u8))
        }
    }

    struct Fresh;

    #[async_trait]
    impl NonceSource for Fresh {
        async fn pending_nonce(&self, _account: Address) -> ExecutionResult<u64> {
            Ok(0)
        }
    }

    async fn engine() -> (Arc<DecisionEngine>, StrikeConfig) {
        let (engine, config, _) = engine_with_sink().await;
        (engine, config)
    }

    async fn engine_with_sink() -> (Arc<DecisionEngine>, StrikeConfig, Arc<Accepting>) {
        let config = StrikeConfig::default();
        let sink = Arc::new(Accepting::default());
        let nonces = NonceManager::synced(Address::repeat_byte(0x11), Arc::new(Fresh))
            .await
            .unwrap();
        let engine = DecisionEngine::new(
            &config,
            Collaborators {
                sizer: Arc::new(StaticSizer::from_config(&config.sizing)),
                caller: Arc::new(Rich),
                sink: sink.clone(),
                nonces: Arc::new(nonces),
            },
        )
        .unwrap();
        (Arc::new(engine), config, sink)
    }

    #[tokio::test]
    async fn test_drains_until_channel_closes() {
        let (engine, config) = engine().await;
        let (events_tx, events_rx) = mpsc::channel(8);
        let (_shutdown_tx, shutdown_rx) = oneshot::channel();

        let relevant = SwapLog::from_topics(vec![SWAP_TOPIC, config.triangle.second.into_word()]);
        let irrelevant = SwapLog::from_topics(vec![SWAP_TOPIC]);
        events_tx.send(relevant.clone()).await.unwrap();
        events_tx.send(irrelevant).await.unwrap();
        events_tx.send(relevant).await.unwrap();
        drop(events_tx);

        let summary = Dispatcher::new(Arc::clone(&engine), 8).run(events_rx, shutdown_rx).await;

        assert_eq!(
            summary,
            DispatchSummary {
                received: 3,
                submitted: 2,
                discarded: 1,
                failed: 0,
            }
        );
        assert_eq!(engine.stats().processed, 3);
    }

    #[tokio::test]
    async fn test_shutdown_stops_intake() {
        let (engine, _) = engine().await;
        let (_events_tx, events_rx) = mpsc::channel(8);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        shutdown_tx.send(()).unwrap();

        let summary = Dispatcher::new(engine, 8).run(events_rx, shutdown_rx).await;
        assert_eq!(summary, DispatchSummary::default());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_in_flight_cycles_are_bounded() {
        let (engine, config, sink) = engine_with_sink().await;
        let (events_tx, events_rx) = mpsc::channel(32);
        let (_shutdown_tx, shutdown_rx) = oneshot::channel();

        let relevant = SwapLog::from_topics(vec![SWAP_TOPIC, config.triangle.first.into_word()]);
        for _ in 0..12 {
            events_tx.send(relevant.clone()).await.unwrap();
        }
        drop(events_tx);

        let summary = Dispatcher::new(engine, 2).run(events_rx, shutdown_rx).await;

        assert_eq!(summary.submitted, 12);
        assert!(sink.peak.load(Ordering::SeqCst) <= 2);
    }
}
