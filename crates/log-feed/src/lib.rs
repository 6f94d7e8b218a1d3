//! Swap log subscription
//!
//! Features:
//! - Raw websocket `eth_subscribe` for pair `Swap` logs
//! - Typed notification parsing
//! - Automatic reconnection
//! - Lightweight feed statistics

pub mod feed;
pub mod log;

pub use feed::{FeedStats, LogFeed};
pub use log::{parse_message, FeedMessage, SwapLog, SWAP_TOPIC};
