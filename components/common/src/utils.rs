use std::{str::FromStr, time::Duration};

use ethers::{
    types::{Address, U256},
    utils::{format_ether, format_units, parse_ether, to_checksum},
};

use crate::error::SendError;

pub static DEFAULT_RECIPIENT: &str = "0xDD1D9b2d870A0a14d79d57E8ab66216df7eA5b81";
pub static DEFAULT_AMOUNT_ETH: &str = "0.01";

// intrinsic cost of a plain value transfer
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;

pub const RECEIPT_TIMEOUT: Duration = Duration::from_secs(120);
pub const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Wei to ETH, without the trailing zeros `format_ether` pads to 18 decimals.
pub fn format_eth(wei: U256) -> String {
    trim_decimal(format_ether(wei))
}

pub fn format_gwei(wei: U256) -> String {
    match format_units(wei, "gwei") {
        Ok(gwei) => trim_decimal(gwei),
        Err(_) => format!("{} wei", wei),
    }
}

fn trim_decimal(value: String) -> String {
    if !value.contains('.') {
        return value;
    }

    value
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

pub fn parse_eth_amount(amount: &str) -> Result<U256, SendError> {
    let amount = amount.trim();
    // parse_ether accepts signed input and wraps negatives into huge unsigned values
    if amount.starts_with('-') || amount.starts_with('+') {
        return Err(SendError::Config(format!(
            "Invalid ETH amount {:?}: must be an unsigned number",
            amount
        )));
    }

    parse_ether(amount)
        .map_err(|e| SendError::Config(format!("Invalid ETH amount {:?}: {}", amount, e)))
}

pub fn checksummed(address: &Address) -> String {
    to_checksum(address, None)
}

/// Parses a hex address the way wallets accept them: all-lowercase or all-uppercase hex is taken
/// as-is, mixed case must be a valid EIP-55 checksum.
pub fn parse_address(input: &str) -> Result<Address, SendError> {
    let input = input.trim();
    let body = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);

    if body.len() != 40 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(SendError::Config(format!("Invalid address: {}", input)));
    }

    let address = Address::from_str(body)
        .map_err(|e| SendError::Config(format!("Invalid address {}: {}", input, e)))?;

    let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper && checksummed(&address)[2..] != *body {
        return Err(SendError::Config(format!(
            "Address {} has an invalid checksum",
            input
        )));
    }

    Ok(address)
}
