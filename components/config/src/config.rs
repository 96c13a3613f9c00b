use common::{
    error::{Result, SendError},
    types::Network,
    utils::{
        parse_address, parse_eth_amount, DEFAULT_AMOUNT_ETH, DEFAULT_RECIPIENT,
        RECEIPT_POLL_INTERVAL, RECEIPT_TIMEOUT,
    },
};
use dotenv::dotenv;
use ethers::types::{Address, U256};
use std::{env, fmt, time::Duration};

pub const RPC_URL_VAR: &str = "SEPOLIA_RPC_URL";
pub const PRIVATE_KEY_VAR: &str = "SENDER_PRIVATE_KEY";

#[derive(Clone)]
pub struct Config {
    pub rpc_url: String,
    /// Always `0x`-prefixed.
    pub sender_private_key: String,
    pub recipient: Address,
    /// In wei.
    pub amount: U256,
    pub network: Network,
    pub receipt_timeout: Duration,
    pub poll_interval: Duration,
}

impl Config {
    pub fn new_from_env() -> Result<Config> {
        // a missing .env is fine, the variables may come from the shell
        dotenv().ok();

        Config::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let rpc_url = required(&lookup, RPC_URL_VAR)?;
        let sender_private_key = normalize_private_key(&required(&lookup, PRIVATE_KEY_VAR)?);

        let recipient = parse_address(
            &optional(&lookup, "RECIPIENT_ADDRESS").unwrap_or_else(|| DEFAULT_RECIPIENT.to_string()),
        )?;
        let amount = parse_eth_amount(
            &optional(&lookup, "AMOUNT_ETH").unwrap_or_else(|| DEFAULT_AMOUNT_ETH.to_string()),
        )?;

        let network = match optional(&lookup, "NETWORK") {
            Some(network) => network
                .parse::<Network>()
                .map_err(|e| SendError::Config(e.to_string()))?,
            None => Network::default(),
        };

        let receipt_timeout = match optional(&lookup, "RECEIPT_TIMEOUT_SECS") {
            Some(secs) => Duration::from_secs(parse_number("RECEIPT_TIMEOUT_SECS", &secs)?),
            None => RECEIPT_TIMEOUT,
        };
        let poll_interval = match optional(&lookup, "RECEIPT_POLL_INTERVAL_MS") {
            Some(ms) => Duration::from_millis(parse_number("RECEIPT_POLL_INTERVAL_MS", &ms)?),
            None => RECEIPT_POLL_INTERVAL,
        };

        log::debug!(
            "Loaded config for {} (chain id {})",
            network,
            network.chain_id()
        );

        Ok(Config {
            rpc_url,
            sender_private_key,
            recipient,
            amount,
            network,
            receipt_timeout,
            poll_interval,
        })
    }

    pub fn chain_id(&self) -> u64 {
        self.network.chain_id()
    }
}

// keep the key out of logs and panic messages
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("rpc_url", &self.rpc_url)
            .field("sender_private_key", &"<redacted>")
            .field("recipient", &self.recipient)
            .field("amount", &self.amount)
            .field("network", &self.network)
            .field("receipt_timeout", &self.receipt_timeout)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

pub fn normalize_private_key(key: &str) -> String {
    let key = key.trim();
    if key.starts_with("0x") || key.starts_with("0X") {
        key.to_string()
    } else {
        format!("0x{}", key)
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, key).ok_or_else(|| {
        SendError::Config(format!(
            "{} not found in environment variables or .env file.",
            key
        ))
    })
}

fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|value| !value.trim().is_empty())
}

fn parse_number(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| SendError::Config(format!("{} must be a whole number: {}", key, e)))
}
