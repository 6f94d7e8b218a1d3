//! Cheap event gates run before any RPC work
//!
//! The relevance test is a substring match on each topic's lowercase hex,
//! not address decoding. It can match a value that merely contains the same
//! nibbles at any offset within one word; anything it lets through that is
//! not a real opportunity is priced out by simulation.

use alloy_primitives::{hex, Address, B256, U256};

use triarb_core::Triangle;
use triarb_log_feed::SwapLog;

const ADDRESS_HEX_LEN: usize = 40;
const TOPIC_HEX_LEN: usize = 64;

/// A pre-simulation check on a raw log
pub trait EventGate: Send + Sync {
    fn name(&self) -> &'static str;
    fn admits(&self, log: &SwapLog) -> bool;
}

/// Passes a log if any topic mentions a non-base triangle member
#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    needles: Vec<[u8; ADDRESS_HEX_LEN]>,
}

impl RelevanceFilter {
    pub fn new(triangle: &Triangle) -> Self {
        Self::for_addresses(&triangle.legs())
    }

    pub fn for_addresses(addresses: &[Address]) -> Self {
        let needles = addresses
            .iter()
            .map(|addr| {
                let mut needle = [0u8; ADDRESS_HEX_LEN];
                // lengths are fixed, this cannot fail
                let _ = hex::encode_to_slice(addr, &mut needle);
                needle
            })
            .collect();
        Self { needles }
    }

    pub fn is_relevant(&self, topics: &[B256]) -> bool {
        let mut encoded = [0u8; TOPIC_HEX_LEN];
        topics.iter().any(|topic| {
            hex::encode_to_slice(topic, &mut encoded).is_ok()
                && self.needles.iter().any(|needle| {
                    encoded
                        .windows(ADDRESS_HEX_LEN)
                        .any(|window| window == needle.as_slice())
                })
        })
    }
}

impl EventGate for RelevanceFilter {
    fn name(&self) -> &'static str {
        "relevance"
    }

    fn admits(&self, log: &SwapLog) -> bool {
        self.is_relevant(&log.topics)
    }
}

/// Passes a log only if some data word (swap amount) reaches the threshold
#[derive(Debug, Clone)]
pub struct WhaleGate {
    threshold: U256,
}

impl WhaleGate {
    pub fn new(threshold: U256) -> Self {
        Self { threshold }
    }
}

impl EventGate for WhaleGate {
    fn name(&self) -> &'static str {
        "whale"
    }

    fn admits(&self, log: &SwapLog) -> bool {
        log.data_words().any(|word| word >= self.threshold)
    }
}
