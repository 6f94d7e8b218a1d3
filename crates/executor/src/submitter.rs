//! Transaction submission with bounded resend

use alloy_primitives::B256;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use triarb_core::{ExecutionConfig, ExecutionResult, SubmissionReceipt};

use crate::builder::BuiltTransaction;

/// Signs and broadcasts; `Ok` means the node accepted it into the pending pool
#[async_trait]
pub trait TransactionSink: Send + Sync {
    async fn send(&self, tx: &BuiltTransaction) -> ExecutionResult<B256>;
}

/// Submission configuration
#[derive(Debug, Clone)]
pub struct SubmitterConfig {
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for SubmitterConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_delay: Duration::from_millis(100),
        }
    }
}

impl From<&ExecutionConfig> for SubmitterConfig {
    fn from(config: &ExecutionConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            retry_delay: config.retry_delay(),
        }
    }
}

/// Transaction submitter
pub struct TransactionSubmitter {
    sink: Arc<dyn TransactionSink>,
    config: SubmitterConfig,
}

impl TransactionSubmitter {
    pub fn new(sink: Arc<dyn TransactionSink>, config: SubmitterConfig) -> Self {
        Self { sink, config }
    }

    /// Resends with the same nonce on transport errors only. A node
    /// rejection is returned immediately.
    pub async fn submit(&self, tx: &BuiltTransaction) -> ExecutionResult<SubmissionReceipt> {
        let start = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            match self.sink.send(tx).await {
                Ok(tx_hash) => {
                    info!(
                        target: "execution",
                        %tx_hash,
                        nonce = tx.nonce,
                        attempts,
                        "Transaction accepted"
                    );
                    return Ok(SubmissionReceipt {
                        tx_hash,
                        nonce: tx.nonce,
                        attempts,
                        latency_us: start.elapsed().as_micros() as u64,
                    });
                }
                Err(e) if e.is_retryable() && attempts <= self.config.max_retries => {
                    warn!(
                        target: "execution",
                        nonce = tx.nonce,
                        error = %e,
                        "Resending in {:?} (attempt {}/{})",
                        self.config.retry_delay,
                        attempts,
                        self.config.max_retries + 1
                    );
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                Err(e) => {
                    debug!(target: "execution", nonce = tx.nonce, attempts, "Giving up on submission");
                    return Err(e);
                }
            }
        }
    }
}
