use std::time::Duration;

use common::error::{Result, SendError};
use ethers::{
    providers::{Http, Middleware, Provider},
    types::{Address, TransactionReceipt, TxHash, U256},
};

use crate::transfer::SignedTransaction;

/// A node that answered its chain id. Every query after the connectivity check goes through here.
#[derive(Debug)]
pub struct Node<M> {
    provider: M,
    chain_id: u64,
}

/// Connects to an HTTP JSON-RPC endpoint. One attempt, no retries.
pub async fn connect(endpoint: &str) -> Result<Node<Provider<Http>>> {
    let provider = Provider::<Http>::try_from(endpoint)
        .map_err(|e| SendError::Connectivity(format!("{}: {}", endpoint, e)))?;

    Node::from_provider(provider).await
}

impl<M: Middleware> Node<M> {
    pub async fn from_provider(provider: M) -> Result<Self> {
        let chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| SendError::Connectivity(e.to_string()))?;

        Ok(Node {
            provider,
            chain_id: chain_id.low_u64(),
        })
    }

    /// The chain id the node reported when we connected.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub async fn get_balance(&self, address: Address) -> Result<U256> {
        self.provider
            .get_balance(address, None)
            .await
            .map_err(|e| SendError::rpc("checking balances", e))
    }

    /// Number of transactions the account has sent, i.e. the next nonce.
    pub async fn get_nonce(&self, address: Address) -> Result<U256> {
        self.provider
            .get_transaction_count(address, None)
            .await
            .map_err(|e| SendError::rpc("fetching nonce", e))
    }

    pub async fn get_gas_price(&self) -> Result<U256> {
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| SendError::rpc("fetching gas price", e))
    }

    /// Broadcasts the signed bytes and returns the hash the node assigned.
    pub async fn submit(&self, signed: &SignedTransaction) -> Result<TxHash> {
        let pending = self
            .provider
            .send_raw_transaction(signed.raw().clone())
            .await
            .map_err(|e| SendError::Submission(e.to_string()))?;

        let tx_hash = pending.tx_hash();
        if tx_hash != signed.hash() {
            log::warn!(
                "Node returned hash {:?}, expected {:?}",
                tx_hash,
                signed.hash()
            );
        }

        Ok(tx_hash)
    }

    /// Polls for the receipt every `poll_interval` until it shows up or `timeout` runs out.
    pub async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<TransactionReceipt> {
        let poll = async {
            loop {
                match self.provider.get_transaction_receipt(tx_hash).await {
                    Ok(Some(receipt)) => return Ok(receipt),
                    Ok(None) => {
                        log::debug!("No receipt yet for {:?}", tx_hash);
                        tokio::time::sleep(poll_interval).await;
                    }
                    Err(e) => return Err(SendError::rpc("fetching receipt", e)),
                }
            }
        };

        tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| SendError::Timeout {
                tx_hash,
                waited: timeout,
            })?
    }
}
