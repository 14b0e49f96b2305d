use std::error::Error;

use log::{error, info, warn};

use crate::chain::InfoStoreWriter;
use crate::classifier::OpenAiClassifier;
use crate::config::Config;
use crate::relay::Relay;

mod chain;
mod classifier;
mod config;
mod helper;
mod relay;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    // Logging
    simple_logger::SimpleLogger::new()
        .with_level(config::log_level())
        .init()?;

    // 1️⃣ Load config
    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Invalid configuration: {:#}", e);
            return Ok(());
        }
    };

    // 2️⃣ Node connection is the only hard requirement
    let writer = match InfoStoreWriter::connect(&cfg).await {
        Ok(writer) => writer,
        Err(e) => {
            error!("Failed to connect to blockchain node at {}: {:#}", cfg.rpc_url, e);
            return Ok(());
        }
    };

    match writer.signer_address() {
        Ok(address) => info!("Connected to blockchain. Account: {:#x}", address),
        Err(e) => warn!("Connected to blockchain, but the signing key is unusable: {}", e),
    }

    let classifier = OpenAiClassifier::new(&cfg);

    // 3️⃣ One pass over the samples
    info!("Starting relay over {} samples...", cfg.samples.len());
    let relay = Relay::new(cfg.samples.clone(), cfg.delay());
    relay.run(&classifier, &writer).await;

    match writer.current_info().await {
        Ok(stored) => info!("Stored on-chain info: '{}'", stored),
        Err(e) => warn!("Could not read back on-chain info: {}", e),
    }

    info!("Script finished.");
    Ok(())
}
