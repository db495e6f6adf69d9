// src/storage/mod.rs
pub mod ledger;

pub use ledger::Ledger;

use crate::edgar::models::FilingRecord;
use crate::utils::error::StorageError;
use clap::ValueEnum;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const CSV_HEADER: &str = "Holding Name,Holding Share,Holding Value\n";

/// Flat-file shapes a filing can be written as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum OutputFormat {
    /// Holdings report: quoted name, rounded share and value per holding.
    Csv,
    /// Lossless dump of the whole normalized record.
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

/// Writes filing records under a base directory, one file per record and format.
pub struct StorageManager {
    base_dir: PathBuf,
    form_type: String,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P, form_type: &str) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self {
            base_dir: base_path,
            form_type: form_type.to_string(),
        })
    }

    /// `<FORM>_<filing_date>_<company_name>_<series_name>` with path separators replaced.
    pub fn file_stem(&self, record: &FilingRecord) -> String {
        let stem = format!(
            "{}_{}_{}_{}",
            self.form_type,
            record.filing_date.format("%Y-%m-%d"),
            record.company_name,
            record.series_name
        );
        stem.replace(['/', '\\'], "-")
    }

    pub fn path_for(&self, record: &FilingRecord, format: OutputFormat) -> PathBuf {
        self.base_dir
            .join(format!("{}.{}", self.file_stem(record), format.extension()))
    }

    /// Writes `record` in `format`, replacing any existing file of the same name.
    pub fn write(&self, record: &FilingRecord, format: OutputFormat) -> Result<PathBuf, StorageError> {
        match format {
            OutputFormat::Csv => self.save_holdings_csv(record),
            OutputFormat::Json => self.save_json(record),
        }
    }

    /// Saves the holdings report in CSV format
    pub fn save_holdings_csv(&self, record: &FilingRecord) -> Result<PathBuf, StorageError> {
        let file_path = self.path_for(record, OutputFormat::Csv);

        let mut file = fs::File::create(&file_path)?;
        file.write_all(CSV_HEADER.as_bytes())?;

        // The name column is quoted by hand; the writer must not requote it.
        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Never)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(file);

        for holding in &record.holdings {
            writer.write_record([
                quoted(holding.display_name()),
                (holding.holding_share.round() as i64).to_string(),
                (holding.holding_value.round() as i64).to_string(),
            ])?;
        }
        writer.flush()?;

        tracing::info!("Saved holdings report to {}", file_path.display());

        Ok(file_path)
    }

    /// Saves the full record in JSON format
    pub fn save_json(&self, record: &FilingRecord) -> Result<PathBuf, StorageError> {
        let file_path = self.path_for(record, OutputFormat::Json);

        let json = serde_json::to_string_pretty(record)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        fs::write(&file_path, json).map_err(StorageError::IoError)?;

        tracing::info!("Saved filing dump to {}", file_path.display());

        Ok(file_path)
    }
}

/// Wraps a field in double quotes, doubling any quotes inside it.
fn quoted(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
