//! Node access over alloy
//!
//! One provider serves simulation calls, nonce queries and signed
//! submissions for the strike account. Transactions are signed locally so
//! their hash is known before the node answers.

use alloy::network::{EthereumWallet, TransactionBuilder as _};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::{RpcError, TransportErrorKind};
use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use tracing::info;

use triarb_core::{ExecutionError, ExecutionResult, SimulationError, SimulationOutcome};

use crate::builder::BuiltTransaction;
use crate::nonce::NonceSource;
use crate::simulator::SimulationCall;
use crate::submitter::TransactionSink;

/// Provider with the strike account's wallet attached
#[derive(Clone)]
pub struct RpcNode {
    provider: DynProvider,
    wallet: EthereumWallet,
    account: Address,
}

impl RpcNode {
    /// `url` may be ws(s):// or http(s)://
    pub async fn connect(url: &str, signer: PrivateKeySigner) -> anyhow::Result<Self> {
        let account = signer.address();
        let wallet = EthereumWallet::from(signer);
        let provider = ProviderBuilder::new()
            .wallet(wallet.clone())
            .connect(url)
            .await?
            .erased();

        let chain_id = provider.get_chain_id().await?;
        info!(%account, chain_id, "Connected to node");

        Ok(Self {
            provider,
            wallet,
            account,
        })
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub async fn chain_id(&self) -> anyhow::Result<u64> {
        Ok(self.provider.get_chain_id().await?)
    }
}

fn call_error(err: RpcError<TransportErrorKind>) -> SimulationError {
    match err {
        RpcError::ErrorResp(payload) => SimulationError::Reverted(payload.message.to_string()),
        other => SimulationError::Rpc(other.to_string()),
    }
}

fn send_error(err: RpcError<TransportErrorKind>) -> ExecutionError {
    match err {
        RpcError::ErrorResp(payload) => ExecutionError::from_node_message(&payload.message),
        other => ExecutionError::Transport(other.to_string()),
    }
}

/// A resend answered with "already known" means an earlier send landed
fn send_outcome<T>(sent: Result<T, RpcError<TransportErrorKind>>, tx_hash: B256) -> ExecutionResult<B256> {
    match sent.map_err(send_error) {
        Ok(_) => Ok(tx_hash),
        Err(e) if e.is_in_pool() => Ok(tx_hash),
        Err(e) => Err(e),
    }
}

#[async_trait]
impl SimulationCall for RpcNode {
    async fn call(&self, to: Address, from: Address, data: Bytes) -> SimulationOutcome<Bytes> {
        let request = TransactionRequest::default()
            .with_from(from)
            .with_to(to)
            .with_input(data);

        self.provider.call(request).await.map_err(call_error)
    }
}

#[async_trait]
impl NonceSource for RpcNode {
    async fn pending_nonce(&self, account: Address) -> ExecutionResult<u64> {
        self.provider
            .get_transaction_count(account)
            .pending()
            .await
            .map_err(|e| ExecutionError::NonceSync(e.to_string()))
    }
}

#[async_trait]
impl TransactionSink for RpcNode {
    async fn send(&self, tx: &BuiltTransaction) -> ExecutionResult<B256> {
        let request = TransactionRequest::default()
            .with_from(tx.from)
            .with_to(tx.to)
            .with_value(tx.value)
            .with_input(tx.data.clone())
            .with_nonce(tx.nonce)
            .with_chain_id(tx.chain_id)
            .with_gas_limit(tx.gas_limit)
            .with_max_fee_per_gas(tx.max_fee_per_gas)
            .with_max_priority_fee_per_gas(tx.max_priority_fee);

        let envelope = request
            .build(&self.wallet)
            .await
            .map_err(|e| ExecutionError::Rejected(format!("cannot sign transaction: {e}")))?;
        let tx_hash = *envelope.tx_hash();

        send_outcome(self.provider.send_tx_envelope(envelope).await, tx_hash)
    }
}
