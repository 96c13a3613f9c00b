//! An in-process Ethereum node for driving the workflow end to end.
//!
//! It answers the handful of JSON-RPC methods the transfer needs, keeps balances and nonces in
//! memory, decodes and verifies every raw transaction it is sent, and charges gas the way a real
//! node would. Every method it receives is recorded so tests can assert which stages ran.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use ethers::{
    providers::{JsonRpcClient, JsonRpcError, Provider, ProviderError, RpcError},
    types::{
        transaction::eip2718::TypedTransaction, Address, Bytes, NameOrAddress, TransactionReceipt,
        TxHash, H256, U256, U64,
    },
    utils::{keccak256, rlp::Rlp},
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

const TRANSFER_GAS: u64 = 21_000;

#[derive(Debug, Error)]
pub enum SimulatedNodeError {
    #[error("connection refused")]
    Unreachable,

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error("{0}")]
    JsonRpc(JsonRpcError),
}

impl RpcError for SimulatedNodeError {
    fn as_error_response(&self) -> Option<&JsonRpcError> {
        match self {
            SimulatedNodeError::JsonRpc(e) => Some(e),
            _ => None,
        }
    }

    fn as_serde_error(&self) -> Option<&serde_json::Error> {
        match self {
            SimulatedNodeError::SerdeJson(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SimulatedNodeError> for ProviderError {
    fn from(src: SimulatedNodeError) -> Self {
        ProviderError::JsonRpcClientError(Box::new(src))
    }
}

#[derive(Debug, Default)]
struct State {
    chain_id: u64,
    gas_price: U256,
    balances: HashMap<Address, U256>,
    nonces: HashMap<Address, u64>,
    receipts: HashMap<TxHash, TransactionReceipt>,
    block_number: u64,
    calls: Vec<String>,
    failing_methods: Vec<String>,
    unreachable: bool,
    withhold_receipts: bool,
    revert_transfers: bool,
    polls_before_mined: u32,
}

#[derive(Clone, Debug)]
pub struct SimulatedNode {
    state: Arc<Mutex<State>>,
}

impl SimulatedNode {
    pub fn new(chain_id: u64, gas_price: U256) -> Self {
        let state = State {
            chain_id,
            gas_price,
            block_number: 1_000,
            ..Default::default()
        };

        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn provider(&self) -> Provider<SimulatedNode> {
        Provider::new(self.clone())
    }

    pub fn fund(&self, address: Address, amount: U256) {
        self.state.lock().unwrap().balances.insert(address, amount);
    }

    pub fn balance(&self, address: Address) -> U256 {
        self.state
            .lock()
            .unwrap()
            .balances
            .get(&address)
            .copied()
            .unwrap_or_default()
    }

    pub fn nonce(&self, address: Address) -> u64 {
        self.state
            .lock()
            .unwrap()
            .nonces
            .get(&address)
            .copied()
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn set_unreachable(&self) {
        self.state.lock().unwrap().unreachable = true;
    }

    /// Answer `method` with a JSON-RPC internal error from now on.
    pub fn fail_method(&self, method: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_methods
            .push(method.to_string());
    }

    /// Transactions are still applied, their receipts just never show up.
    pub fn withhold_receipts(&self) {
        self.state.lock().unwrap().withhold_receipts = true;
    }

    /// Mine transfers with status 0: gas is charged, value stays with the sender.
    pub fn revert_transfers(&self) {
        self.state.lock().unwrap().revert_transfers = true;
    }

    /// Answer `null` to the first `polls` receipt queries of each transaction.
    pub fn mine_after_polls(&self, polls: u32) {
        self.state.lock().unwrap().polls_before_mined = polls;
    }

    fn handle(&self, method: &str, params: Value) -> Result<Value, SimulatedNodeError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(method.to_string());

        if state.unreachable {
            return Err(SimulatedNodeError::Unreachable);
        }
        if state.failing_methods.iter().any(|failing| failing == method) {
            return Err(rpc_error(-32603, "internal error"));
        }

        match method {
            "eth_chainId" => Ok(serde_json::to_value(U256::from(state.chain_id))?),
            "eth_gasPrice" => Ok(serde_json::to_value(state.gas_price)?),
            "eth_getBalance" => {
                let address: Address = param(&params, 0)?;
                let balance = state.balances.get(&address).copied().unwrap_or_default();
                Ok(serde_json::to_value(balance)?)
            }
            "eth_getTransactionCount" => {
                let address: Address = param(&params, 0)?;
                let nonce = state.nonces.get(&address).copied().unwrap_or_default();
                Ok(serde_json::to_value(U256::from(nonce))?)
            }
            "eth_sendRawTransaction" => {
                let raw: Bytes = param(&params, 0)?;
                let tx_hash = state.apply(&raw)?;
                Ok(serde_json::to_value(tx_hash)?)
            }
            "eth_getTransactionReceipt" => {
                let tx_hash: TxHash = param(&params, 0)?;
                if state.withhold_receipts {
                    return Ok(Value::Null);
                }
                if state.polls_before_mined > 0 {
                    state.polls_before_mined -= 1;
                    return Ok(Value::Null);
                }
                Ok(serde_json::to_value(state.receipts.get(&tx_hash))?)
            }
            other => Err(rpc_error(-32601, format!("the method {} does not exist", other))),
        }
    }
}

impl State {
    fn apply(&mut self, raw: &Bytes) -> Result<TxHash, SimulatedNodeError> {
        let (tx, signature) = TypedTransaction::decode_signed(&Rlp::new(raw.as_ref()))
            .map_err(|e| rpc_error(-32000, format!("invalid transaction: {}", e)))?;

        let request = match &tx {
            TypedTransaction::Legacy(request) => request.clone(),
            _ => return Err(rpc_error(-32000, "only legacy transactions are supported")),
        };

        if request.chain_id.map(|id| id.as_u64()) != Some(self.chain_id) {
            return Err(rpc_error(-32000, "invalid chain id for signer"));
        }

        let from = signature
            .recover(tx.sighash())
            .map_err(|e| rpc_error(-32000, format!("invalid sender: {}", e)))?;
        let to = match request.to {
            Some(NameOrAddress::Address(to)) => to,
            _ => return Err(rpc_error(-32000, "contract creation is not supported")),
        };

        let value = request.value.unwrap_or_default();
        let gas = request.gas.unwrap_or_default();
        let gas_price = request.gas_price.unwrap_or_default();
        let nonce = request.nonce.unwrap_or_default();

        let expected_nonce = self.nonces.get(&from).copied().unwrap_or_default();
        if nonce < U256::from(expected_nonce) {
            return Err(rpc_error(-32000, "nonce too low"));
        }
        if nonce > U256::from(expected_nonce) {
            return Err(rpc_error(-32000, "nonce too high"));
        }
        if gas < U256::from(TRANSFER_GAS) {
            return Err(rpc_error(-32000, "intrinsic gas too low"));
        }
        if gas_price < self.gas_price {
            return Err(rpc_error(-32000, "transaction underpriced"));
        }

        let balance = self.balances.get(&from).copied().unwrap_or_default();
        if balance < value + gas * gas_price {
            return Err(rpc_error(
                -32000,
                "insufficient funds for gas * price + value",
            ));
        }

        let gas_used = U256::from(TRANSFER_GAS);
        let mut sender_balance = balance - gas_used * gas_price;
        let status = if self.revert_transfers {
            0
        } else {
            sender_balance -= value;
            *self.balances.entry(to).or_default() += value;
            1
        };
        self.balances.insert(from, sender_balance);
        self.nonces.insert(from, expected_nonce + 1);
        self.block_number += 1;

        let tx_hash = TxHash::from(keccak256(raw.as_ref()));
        let receipt = TransactionReceipt {
            transaction_hash: tx_hash,
            block_hash: Some(H256::from_low_u64_be(self.block_number)),
            block_number: Some(U64::from(self.block_number)),
            from,
            to: Some(to),
            cumulative_gas_used: gas_used,
            gas_used: Some(gas_used),
            effective_gas_price: Some(gas_price),
            status: Some(U64::from(status)),
            ..Default::default()
        };
        self.receipts.insert(tx_hash, receipt);

        Ok(tx_hash)
    }
}

#[async_trait]
impl JsonRpcClient for SimulatedNode {
    type Error = SimulatedNodeError;

    async fn request<T: Serialize + Send + Sync, R: DeserializeOwned>(
        &self,
        method: &str,
        params: T,
    ) -> Result<R, SimulatedNodeError> {
        let params = serde_json::to_value(params)?;
        let result = self.handle(method, params)?;

        Ok(serde_json::from_value(result)?)
    }
}

fn param<D: DeserializeOwned>(params: &Value, index: usize) -> Result<D, SimulatedNodeError> {
    let value = params.get(index).cloned().unwrap_or(Value::Null);
    Ok(serde_json::from_value(value)?)
}

fn rpc_error(code: i64, message: impl Into<String>) -> SimulatedNodeError {
    SimulatedNodeError::JsonRpc(JsonRpcError {
        code,
        message: message.into(),
        data: None,
    })
}
