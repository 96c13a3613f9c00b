use common::{
    error::{Result, SendError},
    utils::checksummed,
};
use ethers::{
    signers::{LocalWallet, Signer},
    types::Address,
};

/// The sending account: a local signing key and the address it controls.
#[derive(Clone, Debug)]
pub struct Account {
    wallet: LocalWallet,
}

impl Account {
    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    pub fn checksummed_address(&self) -> String {
        checksummed(&self.address())
    }

    /// Signer bound to `chain_id`, so signatures carry EIP-155 replay protection.
    pub(crate) fn signer(&self, chain_id: u64) -> LocalWallet {
        self.wallet.clone().with_chain_id(chain_id)
    }
}

/// Derives the account for a hex private key, with or without its `0x` prefix.
///
/// Fails on anything that isn't 32 bytes of hex or isn't a valid secp256k1 scalar (zero, or at or
/// above the curve order).
pub fn derive_account(private_key: &str) -> Result<Account> {
    let wallet = private_key
        .trim()
        .parse::<LocalWallet>()
        .map_err(|e| SendError::InvalidKey(e.to_string()))?;

    Ok(Account { wallet })
}
