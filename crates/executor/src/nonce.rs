//! Process-wide nonce sequencing for the strike account
//!
//! A nonce is only ever observed by claiming it. Claimed nonces stay
//! in flight until their submission settles. A resync never hands out a
//! nonce that is still in flight or that the node already accepted above a
//! rejected one: the pending count stops at the first gap, so those would
//! otherwise be claimed twice.

use alloy_primitives::Address;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use triarb_core::ExecutionResult;

/// Where the account's pending nonce comes from
#[async_trait]
pub trait NonceSource: Send + Sync {
    async fn pending_nonce(&self, account: Address) -> ExecutionResult<u64>;
}

#[derive(Debug)]
struct NonceState {
    next: u64,
    in_flight: BTreeSet<u64>,
    /// Accepted by the node but possibly queued behind a gap
    accepted: BTreeSet<u64>,
    /// Rejected and not yet claimed again
    gaps: BTreeSet<u64>,
    /// Set when a resync failed; the next claim must sync first
    needs_sync: bool,
}

impl NonceState {
    fn new(next: u64) -> Self {
        Self {
            next,
            in_flight: BTreeSet::new(),
            accepted: BTreeSet::new(),
            gaps: BTreeSet::new(),
            needs_sync: false,
        }
    }

    fn is_taken(&self, nonce: u64) -> bool {
        self.in_flight.contains(&nonce) || self.accepted.contains(&nonce)
    }

    /// Accepted nonces below every gap, every in-flight claim and the
    /// counter can never be handed out again.
    fn prune_accepted(&mut self) {
        let horizon = [
            self.gaps.first().copied(),
            self.in_flight.first().copied(),
            Some(self.next),
        ]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(self.next);
        self.accepted = self.accepted.split_off(&horizon);
    }

    fn rebase(&mut self, chain_next: u64) {
        self.next = chain_next;
        self.gaps = self.gaps.split_off(&chain_next);
        self.accepted = self.accepted.split_off(&chain_next);
        self.needs_sync = false;
    }
}

pub struct NonceManager {
    account: Address,
    source: Arc<dyn NonceSource>,
    state: Mutex<NonceState>,
}

impl NonceManager {
    /// Seeds the counter from the chain before any cycle can claim
    pub async fn synced(account: Address, source: Arc<dyn NonceSource>) -> ExecutionResult<Self> {
        let next = source.pending_nonce(account).await?;
        info!(target: "nonce", %account, next, "Nonce counter synced");
        Ok(Self {
            account,
            source,
            state: Mutex::new(NonceState::new(next)),
        })
    }

    pub fn account(&self) -> Address {
        self.account
    }

    /// Read-and-increment as one step
    pub async fn claim(&self) -> ExecutionResult<u64> {
        let mut state = self.state.lock().await;
        if state.needs_sync {
            let chain_next = self.source.pending_nonce(self.account).await?;
            state.rebase(chain_next);
            info!(target: "nonce", next = state.next, "Deferred nonce resync succeeded");
        }
        while state.is_taken(state.next) {
            state.next += 1;
        }
        let nonce = state.next;
        state.next += 1;
        state.in_flight.insert(nonce);
        state.gaps.remove(&nonce);
        Ok(nonce)
    }

    /// Mark a claimed nonce's submission as finished. `accepted` is whether
    /// the node took the transaction into its pool.
    pub async fn settle(&self, nonce: u64, accepted: bool) {
        let mut state = self.state.lock().await;
        state.in_flight.remove(&nonce);
        if accepted {
            state.accepted.insert(nonce);
        } else {
            state.gaps.insert(nonce);
        }
        state.prune_accepted();
    }

    /// Re-read the pending nonce from the chain. Claims wait until this
    /// returns; if it fails, no nonce is handed out until a sync succeeds.
    pub async fn resync(&self) -> ExecutionResult<u64> {
        let mut state = self.state.lock().await;
        let chain_next = match self.source.pending_nonce(self.account).await {
            Ok(n) => n,
            Err(e) => {
                state.needs_sync = true;
                return Err(e);
            }
        };
        if chain_next != state.next {
            warn!(
                target: "nonce",
                local = state.next,
                chain = chain_next,
                in_flight = state.in_flight.len(),
                queued = state.accepted.len(),
                "Nonce counter drifted from chain"
            );
        }
        state.rebase(chain_next);
        Ok(chain_next)
    }
}
