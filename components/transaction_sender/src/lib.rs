pub mod account;
pub mod node;
pub mod transfer;
pub mod workflow;

pub use account::{derive_account, Account};
pub use node::{connect, Node};
pub use transfer::{build_transfer, ensure_sufficient_funds, sign_transfer, SignedTransaction};
pub use workflow::{execute, run, run_with_provider, TransferOutcome};
