use common::{
    error::{Result, SendError},
    utils::TRANSFER_GAS_LIMIT,
};
use ethers::{
    types::{
        transaction::eip2718::TypedTransaction, Address, Bytes, Signature, TransactionRequest,
        TxHash, U256,
    },
    utils::keccak256,
};

use crate::account::Account;

/// Only the transfer amount is compared against the balance. Gas is left to the node to reject.
pub fn ensure_sufficient_funds(balance: U256, amount: U256) -> Result<()> {
    if balance < amount {
        return Err(SendError::InsufficientFunds {
            balance,
            required: amount,
        });
    }

    Ok(())
}

/// A legacy (type 0) value transfer with every field the signer needs filled in.
pub fn build_transfer(
    from: Address,
    to: Address,
    value: U256,
    nonce: U256,
    gas_price: U256,
    chain_id: u64,
) -> TransactionRequest {
    TransactionRequest::new()
        .from(from)
        .to(to)
        .value(value)
        .gas(TRANSFER_GAS_LIMIT)
        .gas_price(gas_price)
        .nonce(nonce)
        .chain_id(chain_id)
}

/// Upper bound of the fee: gas limit times gas price.
pub fn estimated_fee(request: &TransactionRequest) -> Result<U256> {
    let gas = request.gas.unwrap_or_default();
    let gas_price = request.gas_price.unwrap_or_default();

    gas.checked_mul(gas_price).ok_or_else(|| {
        SendError::rpc(
            "fetching gas price",
            format!("gas price {} wei overflows the fee for {} gas", gas_price, gas),
        )
    })
}

/// A signed transfer. Nothing can change it after signing; build a new request instead.
#[derive(Clone, Debug)]
pub struct SignedTransaction {
    tx: TypedTransaction,
    signature: Signature,
    raw: Bytes,
    hash: TxHash,
}

impl SignedTransaction {
    pub fn tx(&self) -> &TypedTransaction {
        &self.tx
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// RLP bytes for `eth_sendRawTransaction`.
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    pub fn hash(&self) -> TxHash {
        self.hash
    }

    /// Address recovered from the signature.
    pub fn signer(&self) -> Result<Address> {
        self.signature
            .recover(self.tx.sighash())
            .map_err(|e| SendError::Signing(e.to_string()))
    }
}

pub fn sign_transfer(account: &Account, request: TransactionRequest) -> Result<SignedTransaction> {
    ensure_populated(&request)?;

    if request.from != Some(account.address()) {
        return Err(SendError::Signing(format!(
            "request is from {:?} but the key belongs to {:?}",
            request.from,
            account.address()
        )));
    }

    let chain_id = request
        .chain_id
        .map(|id| id.as_u64())
        .ok_or_else(|| missing("chain id"))?;

    let tx: TypedTransaction = request.into();
    let signature = account
        .signer(chain_id)
        .sign_transaction_sync(&tx)
        .map_err(|e| SendError::Signing(e.to_string()))?;

    let raw = tx.rlp_signed(&signature);
    let hash = TxHash::from(keccak256(&raw));

    let signed = SignedTransaction {
        tx,
        signature,
        raw,
        hash,
    };

    let signer = signed.signer()?;
    if signer != account.address() {
        return Err(SendError::Signing(format!(
            "signature recovers to {:?}, expected {:?}",
            signer,
            account.address()
        )));
    }

    Ok(signed)
}

fn ensure_populated(request: &TransactionRequest) -> Result<()> {
    if request.to.is_none() {
        return Err(missing("recipient"));
    }
    if request.value.is_none() {
        return Err(missing("value"));
    }
    if request.gas.is_none() {
        return Err(missing("gas limit"));
    }
    if request.gas_price.is_none() {
        return Err(missing("gas price"));
    }
    if request.nonce.is_none() {
        return Err(missing("nonce"));
    }
    if request.chain_id.is_none() {
        return Err(missing("chain id"));
    }

    Ok(())
}

fn missing(field: &str) -> SendError {
    SendError::Signing(format!("transaction request is missing its {}", field))
}
