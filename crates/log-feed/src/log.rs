//! Swap log records and `eth_subscribe` message parsing

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use alloy_sol_types::{sol, SolEvent};
use serde::Deserialize;

use triarb_core::{FeedError, FeedResult};

sol! {
    /// Uniswap V2 style pair swap
    event Swap(
        address indexed sender,
        uint256 amount0In,
        uint256 amount1In,
        uint256 amount0Out,
        uint256 amount1Out,
        address indexed to
    );
}

/// keccak256("Swap(address,uint256,uint256,uint256,uint256,address)")
pub const SWAP_TOPIC: B256 = Swap::SIGNATURE_HASH;

/// A log record as delivered by the subscription
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapLog {
    pub address: Address,
    pub topics: Vec<B256>,
    #[serde(default)]
    pub data: Bytes,
    #[serde(default)]
    pub block_number: Option<U64>,
    #[serde(default)]
    pub transaction_hash: Option<B256>,
    #[serde(default)]
    pub removed: bool,
}

impl SwapLog {
    /// Build a log from topics alone
    pub fn from_topics(topics: Vec<B256>) -> Self {
        Self {
            address: Address::ZERO,
            topics,
            data: Bytes::new(),
            block_number: None,
            transaction_hash: None,
            removed: false,
        }
    }

    pub fn with_data(mut self, data: Bytes) -> Self {
        self.data = data;
        self
    }

    /// Non-indexed data split into 32-byte words; a trailing partial word is ignored
    pub fn data_words(&self) -> impl Iterator<Item = U256> + '_ {
        self.data.chunks_exact(32).map(U256::from_be_slice)
    }

    pub fn block(&self) -> Option<u64> {
        self.block_number.map(|n| n.to::<u64>())
    }
}

/// What a single websocket text frame turned out to be
#[derive(Debug, Clone, PartialEq)]
pub enum FeedMessage {
    Subscribed(String),
    Log(SwapLog),
    Ignored,
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    params: Option<NotificationParams>,
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct NotificationParams {
    result: SwapLog,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// Parse one frame from the node
pub fn parse_message(text: &str) -> FeedResult<FeedMessage> {
    let envelope: RpcEnvelope =
        serde_json::from_str(text).map_err(|e| FeedError::InvalidMessage(e.to_string()))?;

    if let Some(err) = envelope.error {
        return Err(FeedError::SubscriptionFailed(format!("{} ({})", err.message, err.code)));
    }

    if envelope.method.as_deref() == Some("eth_subscription") {
        return match envelope.params {
            Some(params) => Ok(FeedMessage::Log(params.result)),
            None => Err(FeedError::InvalidMessage("notification without params".into())),
        };
    }

    match (envelope.id, envelope.result) {
        (Some(_), Some(serde_json::Value::String(sub_id))) => Ok(FeedMessage::Subscribed(sub_id)),
        _ => Ok(FeedMessage::Ignored),
    }
}
