//! WebSocket swap log feed

use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use triarb_core::{FeedConfig, FeedError, FeedResult};

use crate::log::{parse_message, FeedMessage, SwapLog, SWAP_TOPIC};

/// Counters shared with whoever wants to report on the feed
#[derive(Debug)]
pub struct FeedStats {
    received: AtomicU64,
    dropped_removed: AtomicU64,
    reconnects: AtomicU64,
    last_event: RwLock<Option<Instant>>,
}

impl FeedStats {
    fn new() -> Self {
        Self {
            received: AtomicU64::new(0),
            dropped_removed: AtomicU64::new(0),
            reconnects: AtomicU64::new(0),
            last_event: RwLock::new(None),
        }
    }

    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    pub fn reconnects(&self) -> u64 {
        self.reconnects.load(Ordering::Relaxed)
    }

    pub fn dropped_removed(&self) -> u64 {
        self.dropped_removed.load(Ordering::Relaxed)
    }

    /// Milliseconds since the last forwarded log
    pub fn idle_ms(&self) -> Option<u128> {
        self.last_event.read().map(|t| t.elapsed().as_millis())
    }
}

/// Subscribes to swap logs and forwards them on a channel
pub struct LogFeed {
    config: FeedConfig,
    stats: Arc<FeedStats>,
}

impl LogFeed {
    pub fn new(config: FeedConfig) -> Self {
        Self {
            config,
            stats: Arc::new(FeedStats::new()),
        }
    }

    pub fn stats(&self) -> Arc<FeedStats> {
        Arc::clone(&self.stats)
    }

    /// Run until the receiver goes away or reconnects are exhausted
    pub async fn run(&self, updates_tx: mpsc::Sender<SwapLog>) {
        let mut reconnect_count = 0;

        loop {
            match self.connect_and_listen(&updates_tx, &mut reconnect_count).await {
                Ok(()) => {
                    info!(target: "feed", "Log feed stopped: receiver closed");
                    break;
                }
                Err(e) => {
                    error!(target: "feed", "Log feed error: {}", e);
                    reconnect_count += 1;
                    self.stats.reconnects.fetch_add(1, Ordering::Relaxed);

                    if reconnect_count >= self.config.max_reconnects {
                        error!(target: "feed", "Max reconnects reached for {}", self.config.ws_url);
                        break;
                    }

                    warn!(
                        target: "feed",
                        "Reconnecting in {:?} (attempt {}/{})",
                        self.config.reconnect_delay(),
                        reconnect_count,
                        self.config.max_reconnects
                    );

                    tokio::time::sleep(self.config.reconnect_delay()).await;
                }
            }
        }
    }

    /// `Ok(())` only when the consumer hung up; every other exit is an error
    async fn connect_and_listen(
        &self,
        updates_tx: &mpsc::Sender<SwapLog>,
        reconnect_count: &mut u32,
    ) -> FeedResult<()> {
        info!(target: "feed", "Connecting to {}", self.config.ws_url);

        let (ws_stream, _) = connect_async(self.config.ws_url.as_str())
            .await
            .map_err(|e| FeedError::ConnectionFailed(e.to_string()))?;
        let (mut write, mut read) = ws_stream.split();

        let subscribe_msg = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_subscribe",
            "params": ["logs", { "topics": [SWAP_TOPIC] }]
        });

        write
            .send(Message::Text(subscribe_msg.to_string()))
            .await
            .map_err(|e| FeedError::SubscriptionFailed(e.to_string()))?;

        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => match parse_message(&text) {
                    Err(e @ FeedError::SubscriptionFailed(_)) => return Err(e),
                    Err(e) => debug!(target: "feed", "Skipping frame: {}", e),
                    Ok(FeedMessage::Subscribed(id)) => {
                        info!(target: "feed", subscription = %id, "Subscribed to swap logs");
                        *reconnect_count = 0;
                    }
                    Ok(FeedMessage::Log(log)) if log.removed => {
                        self.stats.dropped_removed.fetch_add(1, Ordering::Relaxed);
                    }
                    Ok(FeedMessage::Log(log)) => {
                        self.stats.received.fetch_add(1, Ordering::Relaxed);
                        *self.stats.last_event.write() = Some(Instant::now());

                        if updates_tx.send(log).await.is_err() {
                            debug!(target: "feed", "Updates channel closed");
                            return Ok(());
                        }
                    }
                    Ok(FeedMessage::Ignored) => {}
                },
                Ok(Message::Ping(data)) => {
                    write
                        .send(Message::Pong(data))
                        .await
                        .map_err(|e| FeedError::ConnectionFailed(e.to_string()))?;
                }
                Ok(Message::Close(_)) => {
                    info!(target: "feed", "WebSocket closed by server");
                    return Err(FeedError::Disconnected);
                }
                Err(e) => {
                    return Err(FeedError::ConnectionFailed(e.to_string()));
                }
                _ => {}
            }
        }

        Err(FeedError::Disconnected)
    }
}
