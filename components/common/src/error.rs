use std::time::Duration;

use ethers::types::{TxHash, U256};
use thiserror::Error;

/// Every way a transfer can stop before it reaches a receipt.
///
/// Variants follow the order the workflow runs in; the binary prints the first one it hits and exits.
/// A reverted transaction is not in here: it is mined, so it is reported as an outcome instead.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("could not connect to node: {0}")]
    Connectivity(String),

    #[error("invalid private key: {0}")]
    InvalidKey(String),

    /// Balance, nonce, gas price or receipt query failed.
    #[error("error {context}: {reason}")]
    Rpc {
        context: &'static str,
        reason: String,
    },

    #[error("insufficient balance: have {balance} wei, need at least {required} wei (plus gas)")]
    InsufficientFunds { balance: U256, required: U256 },

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("transaction rejected by node: {0}")]
    Submission(String),

    #[error("transaction {tx_hash:?} not confirmed after {waited:?}")]
    Timeout { tx_hash: TxHash, waited: Duration },
}

impl SendError {
    pub fn rpc(context: &'static str, reason: impl ToString) -> Self {
        SendError::Rpc {
            context,
            reason: reason.to_string(),
        }
    }

    /// Whether the error happened once the transaction was being prepared (nonce onwards), as
    /// opposed to setup: config, connection, key or balances.
    pub fn is_transaction_error(&self) -> bool {
        match self {
            SendError::Rpc { context, .. } => *context != "checking balances",
            SendError::Signing(_) | SendError::Submission(_) | SendError::Timeout { .. } => true,
            SendError::Config(_)
            | SendError::Connectivity(_)
            | SendError::InvalidKey(_)
            | SendError::InsufficientFunds { .. } => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SendError>;
