use common::{
    error::Result,
    utils::{checksummed, format_eth, format_gwei},
};
use config::Config;
use ethers::{
    providers::{Middleware, Provider},
    types::{TransactionReceipt, TxHash, U256, U64},
};

use crate::{
    account::derive_account,
    node::{connect, Node},
    transfer::{build_transfer, ensure_sufficient_funds, estimated_fee, sign_transfer},
};

/// How a submitted transfer ended. Both variants were mined.
#[derive(Clone, Debug)]
pub enum TransferOutcome {
    Confirmed {
        tx_hash: TxHash,
        receipt: TransactionReceipt,
        recipient_balance_before: U256,
        recipient_balance_after: U256,
    },
    Reverted {
        tx_hash: TxHash,
        receipt: TransactionReceipt,
    },
}

impl TransferOutcome {
    pub fn receipt(&self) -> &TransactionReceipt {
        match self {
            TransferOutcome::Confirmed { receipt, .. } | TransferOutcome::Reverted { receipt, .. } => {
                receipt
            }
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, TransferOutcome::Confirmed { .. })
    }
}

/// Connects to `config.rpc_url` over HTTP and runs the transfer.
pub async fn run(config: &Config) -> Result<TransferOutcome> {
    let node = connect(&config.rpc_url).await?;
    report_connection(config, &node);

    execute(config, &node).await
}

/// Same as [`run`] over any JSON-RPC transport.
pub async fn run_with_provider<P>(config: &Config, provider: Provider<P>) -> Result<TransferOutcome>
where
    P: ethers::providers::JsonRpcClient,
{
    let node = Node::from_provider(provider).await?;
    report_connection(config, &node);

    execute(config, &node).await
}

fn report_connection<M: Middleware>(config: &Config, node: &Node<M>) {
    println!("Connected to {} RPC: {}", config.network, config.rpc_url);
    println!("Chain ID: {}", node.chain_id());

    if node.chain_id() != config.chain_id() {
        log::warn!(
            "Node reports chain id {}, signing for {} ({})",
            node.chain_id(),
            config.network,
            config.chain_id()
        );
    }
}

/// Everything after the connectivity check, one stage at a time. Stops at the first error.
pub async fn execute<M: Middleware>(config: &Config, node: &Node<M>) -> Result<TransferOutcome> {
    let unit = config.network.currency_label();

    let account = derive_account(&config.sender_private_key)?;
    println!("Sender Address: {}", account.checksummed_address());

    let sender_balance = node.get_balance(account.address()).await?;
    let recipient_balance_before = node.get_balance(config.recipient).await?;
    println!("Sender Balance: {} {}", format_eth(sender_balance), unit);
    println!(
        "Recipient Balance (before): {} {}",
        format_eth(recipient_balance_before),
        unit
    );

    ensure_sufficient_funds(sender_balance, config.amount)?;

    println!(
        "\nPreparing to send {} ETH to {}...",
        format_eth(config.amount),
        checksummed(&config.recipient)
    );
    let nonce = node.get_nonce(account.address()).await?;
    let gas_price = node.get_gas_price().await?;

    let request = build_transfer(
        account.address(),
        config.recipient,
        config.amount,
        nonce,
        gas_price,
        config.chain_id(),
    );
    log::debug!("Transfer request: {:?}", request);

    let fee = estimated_fee(&request)?;
    println!("Gas Price: {} Gwei", format_gwei(gas_price));
    println!("Estimated Transaction Fee: {} ETH", format_eth(fee));

    let signed = sign_transfer(&account, request)?;
    println!("Transaction signed. Sending...");

    let tx_hash = node.submit(&signed).await?;
    println!("Transaction sent! Hash: {:?}", tx_hash);

    println!(
        "Waiting for transaction confirmation (up to {} seconds)...",
        config.receipt_timeout.as_secs()
    );
    let receipt = node
        .wait_for_receipt(tx_hash, config.receipt_timeout, config.poll_interval)
        .await?;

    if receipt.status != Some(U64::from(1)) {
        println!("❌ Transaction failed or was reverted.");
        println!("Receipt: {:?}", receipt);
        return Ok(TransferOutcome::Reverted { tx_hash, receipt });
    }

    println!("✅ Transaction confirmed successfully!");
    if let Some(block_number) = receipt.block_number {
        println!("Block Number: {}", block_number);
    }

    let recipient_balance_after = node.get_balance(config.recipient).await?;
    println!(
        "Recipient Balance (after): {} {}",
        format_eth(recipient_balance_after),
        unit
    );

    Ok(TransferOutcome::Confirmed {
        tx_hash,
        receipt,
        recipient_balance_before,
        recipient_balance_after,
    })
}
