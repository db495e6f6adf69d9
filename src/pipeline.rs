// src/pipeline.rs
use crate::edgar::client::Fetch;
use crate::edgar::index::IndexLoader;
use crate::edgar::models::{ArchiveUrls, IndexEntry};
use crate::extractors::NportExtractor;
use crate::storage::{Ledger, OutputFormat, StorageManager};
use crate::utils::error::FilingError;
use chrono::NaiveDate;
use std::time::Duration;

/// Counters for one run over the configured dates.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub dates_loaded: usize,
    pub dates_failed: usize,
    pub filings_processed: usize,
    pub filings_skipped: usize,
    pub filings_failed: usize,
}

/// Drives dates through index loading, extraction, output and the ledger.
pub struct Pipeline<'a, F: Fetch> {
    fetcher: &'a F,
    ledger: &'a mut Ledger,
    loader: IndexLoader,
    extractor: NportExtractor,
    storage: StorageManager,
    urls: ArchiveUrls,
    formats: Vec<OutputFormat>,
    request_delay: Duration,
    fetched_any: bool,
}

impl<'a, F: Fetch> Pipeline<'a, F> {
    pub fn new(
        fetcher: &'a F,
        ledger: &'a mut Ledger,
        loader: IndexLoader,
        storage: StorageManager,
        urls: ArchiveUrls,
        formats: Vec<OutputFormat>,
        request_delay: Duration,
    ) -> Self {
        Self {
            fetcher,
            ledger,
            loader,
            extractor: NportExtractor::new(),
            storage,
            urls,
            formats,
            request_delay,
            fetched_any: false,
        }
    }

    /// Processes every date in order. Failures are logged and counted; they
    /// never abort the run.
    pub async fn run(&mut self, dates: &[NaiveDate]) -> RunSummary {
        let mut summary = RunSummary::default();

        for &date in dates {
            let entries = match self.loader.load(self.fetcher, date).await {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::error!("Skipping {}: could not load index: {}", date, e);
                    summary.dates_failed += 1;
                    continue;
                }
            };
            summary.dates_loaded += 1;

            for entry in &entries {
                let url = self.urls.filing_url(&entry.file_path);

                if self.ledger.contains(&url) {
                    tracing::debug!("Already processed {}", url);
                    summary.filings_skipped += 1;
                    continue;
                }

                match self.process_filing(&url, entry).await {
                    Ok(()) => summary.filings_processed += 1,
                    Err(e) => {
                        tracing::error!("Failed {} ({}): {}", url, entry.company_name, e);
                        summary.filings_failed += 1;
                    }
                }
            }
        }

        tracing::info!(
            "Run finished. Dates: {} loaded, {} failed. Filings: {} processed, {} skipped, {} failed",
            summary.dates_loaded,
            summary.dates_failed,
            summary.filings_processed,
            summary.filings_skipped,
            summary.filings_failed
        );
        summary
    }

    /// Fetch → extract → write every format → mark processed. The ledger is
    /// only touched once all outputs exist.
    async fn process_filing(&mut self, url: &str, entry: &IndexEntry) -> Result<(), FilingError> {
        if self.fetched_any && !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }
        self.fetched_any = true;

        tracing::info!("Fetching {} for {} (CIK {})", entry.form_type, entry.company_name, entry.cik);
        let record = self.extractor.extract(self.fetcher, url, entry).await?;
        tracing::info!(
            "Parsed {} ({}, {} holdings)",
            url,
            record.series_name,
            record.holdings.len()
        );

        for &format in &self.formats {
            self.storage.write(&record, format)?;
        }

        self.ledger.mark_processed(url)?;
        Ok(())
    }
}
