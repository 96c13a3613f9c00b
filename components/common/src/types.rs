use std::{fmt::Display, str::FromStr};

use anyhow::anyhow;

/// The chain a transfer is signed for. Only the chain id reaches the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Network {
    #[default]
    Sepolia,
    Holesky,
    Mainnet,
    Custom(u64),
}

impl Network {
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Sepolia => 11_155_111,
            Network::Holesky => 17_000,
            Network::Mainnet => 1,
            Network::Custom(chain_id) => *chain_id,
        }
    }

    pub fn from_chain_id(chain_id: u64) -> Self {
        match chain_id {
            11_155_111 => Network::Sepolia,
            17_000 => Network::Holesky,
            1 => Network::Mainnet,
            other => Network::Custom(other),
        }
    }

    /// Label used next to balances, e.g. "Sepolia ETH".
    pub fn currency_label(&self) -> String {
        match self {
            Network::Mainnet => "ETH".to_string(),
            other => format!("{} ETH", other),
        }
    }
}

impl FromStr for Network {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sepolia" => Ok(Network::Sepolia),
            "holesky" => Ok(Network::Holesky),
            "mainnet" => Ok(Network::Mainnet),
            other => other
                .parse::<u64>()
                .map(Network::from_chain_id)
                .map_err(|_| anyhow!("Invalid network: {}", s)),
        }
    }
}

impl Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Network::Sepolia => write!(f, "Sepolia"),
            Network::Holesky => write!(f, "Holesky"),
            Network::Mainnet => write!(f, "Mainnet"),
            Network::Custom(chain_id) => write!(f, "Chain {}", chain_id),
        }
    }
}
