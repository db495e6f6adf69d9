// src/config.rs
use crate::edgar::client::DEFAULT_USER_AGENT;
use crate::edgar::models::DEFAULT_ARCHIVE_BASE;
use crate::storage::OutputFormat;
use crate::utils::AppError;
use chrono::{Datelike, NaiveDate, Weekday};
use clap::Parser;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// Command Line Interface for the NPORT-P holdings extractor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Index date to process, YYYYMMDD or YYYY-MM-DD (repeatable)
    #[arg(short, long = "date", value_parser = parse_date)]
    pub dates: Vec<NaiveDate>,

    /// First date of an inclusive range (weekends are skipped)
    #[arg(long, value_parser = parse_date, requires = "end_date")]
    pub start_date: Option<NaiveDate>,

    /// Last date of an inclusive range
    #[arg(long, value_parser = parse_date, requires = "start_date")]
    pub end_date: Option<NaiveDate>,

    /// Form type to pick out of each daily index
    #[arg(long, default_value = "NPORT-P")]
    pub form_type: String,

    /// Output format (repeatable); defaults to both csv and json
    #[arg(short, long = "format", value_enum)]
    pub formats: Vec<OutputFormat>,

    /// Directory for cached daily index files
    #[arg(long, default_value = "./input")]
    pub input_dir: PathBuf,

    /// Output directory for extracted filings
    #[arg(short, long, default_value = "./output")]
    pub output_dir: PathBuf,

    /// Processing ledger file
    #[arg(long, default_value = "./nport_ledger.json")]
    pub ledger: PathBuf,

    /// Base URL of the EDGAR archives
    #[arg(long, default_value = DEFAULT_ARCHIVE_BASE)]
    pub archive_base: String,

    /// User-Agent sent to SEC (SEC requires a contact address)
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Pause between successive filing downloads, in milliseconds
    #[arg(long, default_value_t = 150)]
    pub delay_ms: u64,
}

/// Validated run configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub dates: Vec<NaiveDate>,
    pub form_type: String,
    pub formats: Vec<OutputFormat>,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub ledger_path: PathBuf,
    pub archive_base: String,
    pub user_agent: String,
    pub request_delay: Duration,
}

impl Config {
    pub fn from_args(args: Args) -> Result<Self, AppError> {
        let mut dates = args.dates;

        if let (Some(start), Some(end)) = (args.start_date, args.end_date) {
            if start > end {
                return Err(AppError::Config(format!(
                    "start date {} is after end date {}",
                    start, end
                )));
            }
            dates.extend(
                start
                    .iter_days()
                    .take_while(|d| *d <= end)
                    .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun)),
            );
        }

        // Keep first occurrence, preserve order.
        let mut seen = HashSet::new();
        dates.retain(|d| seen.insert(*d));

        if dates.is_empty() {
            return Err(AppError::Config(
                "no dates to process; pass --date or --start-date/--end-date".to_string(),
            ));
        }

        let form_type = args.form_type.trim().to_string();
        if form_type.is_empty() {
            return Err(AppError::Config("form type must not be empty".to_string()));
        }

        let mut formats = args.formats;
        if formats.is_empty() {
            formats = vec![OutputFormat::Csv, OutputFormat::Json];
        }
        let mut seen = HashSet::new();
        formats.retain(|f| seen.insert(*f));

        Ok(Self {
            dates,
            form_type,
            formats,
            input_dir: args.input_dir,
            output_dir: args.output_dir,
            ledger_path: args.ledger,
            archive_base: args.archive_base,
            user_agent: args.user_agent,
            request_delay: Duration::from_millis(args.delay_ms),
        })
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
        .map_err(|_| format!("'{}' is not a date (expected YYYYMMDD or YYYY-MM-DD)", value))
}
