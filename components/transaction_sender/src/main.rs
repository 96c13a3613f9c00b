use config::Config;
use transaction_sender::run;

#[tokio::main]
async fn main() {
    pretty_env_logger::init();

    let config = match Config::new_from_env() {
        Ok(config) => config,
        Err(e) => {
            println!("Error: {}", e);
            return;
        }
    };
    log::debug!("{:?}", config);

    // the workflow prints its own progress and the final ✅/❌ for mined transactions
    if let Err(e) = run(&config).await {
        log::error!("Transfer aborted: {:?}", e);
        if e.is_transaction_error() {
            println!("❌ Transaction error: {}", e);
        } else {
            println!("Error: {}", e);
        }
    }
}
