// src/edgar/models.rs
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Default location of the EDGAR archives.
pub const DEFAULT_ARCHIVE_BASE: &str = "https://www.sec.gov/Archives";

/// Sentinel used when a holding carries neither a name nor a title.
pub const MISSING_HOLDING_NAME: &str = "N/A";

/// Sentinel used when a holding carries no asset category.
pub const MISSING_HOLDING_TYPE: &str = "OTHER";

/// One row of a daily master index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub form_type: String,
    pub company_name: String,
    pub cik: String,
    pub file_path: String,
    pub date_filed: NaiveDate,
}

/// Normalized content of one NPORT-P filing.
///
/// Every field has a defined value once extraction succeeds: missing text is
/// empty, missing amounts are `0.0`, and identifiers that cannot be derived
/// are `None` (serialized as `null`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilingRecord {
    pub as_of_date: String,
    pub cik_number: Option<u64>,
    pub series_name: String,
    pub series_number: Option<u64>,
    pub total_assets: f64,
    pub net_assets: f64,
    pub series_tickers: Vec<String>,
    pub holdings: Vec<Holding>,
    pub filing_date: NaiveDate,
    pub company_name: String,
}

/// One position reported within a filing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub holding_name: String,
    pub holding_title: String,
    pub holding_share: f64,
    pub holding_value: f64,
    pub holding_type: String,
}

impl Holding {
    /// Name used in the holdings report: the primary name, unless it is the
    /// `"N/A"` sentinel, in which case the title.
    pub fn display_name(&self) -> &str {
        if self.holding_name == MISSING_HOLDING_NAME {
            &self.holding_title
        } else {
            &self.holding_name
        }
    }
}

/// Builds archive URLs from a configurable base.
#[derive(Debug, Clone)]
pub struct ArchiveUrls {
    base: String,
}

impl ArchiveUrls {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// File name of the daily master index, e.g. `master.20200717.idx`.
    /// Also used as the name of the local cached copy.
    pub fn index_file_name(date: NaiveDate) -> String {
        format!("master.{}.idx", date.format("%Y%m%d"))
    }

    /// `<base>/edgar/daily-index/<year>/QTR<q>/master.<YYYYMMDD>.idx`
    pub fn daily_index_url(&self, date: NaiveDate) -> String {
        let quarter = (date.month() - 1) / 3 + 1;
        format!(
            "{}/edgar/daily-index/{}/QTR{}/{}",
            self.base,
            date.year(),
            quarter,
            Self::index_file_name(date)
        )
    }

    /// `<base>/<file_path>`; this is also the ledger key for the filing.
    pub fn filing_url(&self, file_path: &str) -> String {
        format!("{}/{}", self.base, file_path.trim_start_matches('/'))
    }
}

impl Default for ArchiveUrls {
    fn default() -> Self {
        Self::new(DEFAULT_ARCHIVE_BASE)
    }
}
