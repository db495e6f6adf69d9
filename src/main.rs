// src/main.rs
mod config;
mod edgar;
mod extractors;
mod pipeline;
mod storage;
mod utils;

use clap::Parser;
use config::{Args, Config};
use edgar::{ArchiveUrls, EdgarClient, IndexLoader};
use pipeline::Pipeline;
use storage::{Ledger, StorageManager};
use utils::AppError;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let args = Args::parse();
    tracing::debug!("Parsed args: {:?}", args);
    let config = Config::from_args(args)?;
    tracing::info!(
        "Processing {} date(s) for form type {}",
        config.dates.len(),
        config.form_type
    );

    // 3. Initialize collaborators
    let client = EdgarClient::new(&config.user_agent)?;
    let urls = ArchiveUrls::new(&config.archive_base);
    let loader = IndexLoader::new(&config.input_dir, urls.clone(), &config.form_type);
    let storage = StorageManager::new(&config.output_dir, &config.form_type)?;

    // 4. Run with the ledger held open for the whole run
    let mut ledger = Ledger::open(&config.ledger_path)?;
    let summary = {
        let mut pipeline = Pipeline::new(
            &client,
            &mut ledger,
            loader,
            storage,
            urls,
            config.formats.clone(),
            config.request_delay,
        );
        pipeline.run(&config.dates).await
    };
    ledger.close()?;

    if summary.filings_processed == 0 && summary.filings_failed > 0 {
        return Err(AppError::Processing(format!(
            "Failed to process any of {} filings",
            summary.filings_failed
        )));
    }

    Ok(())
}
