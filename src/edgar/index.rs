// src/edgar/index.rs
use crate::edgar::client::Fetch;
use crate::edgar::models::{ArchiveUrls, IndexEntry};
use crate::utils::atomic::write_atomic;
use crate::utils::error::EdgarError;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

/// Fetches daily master indexes, caching each one under `cache_dir`.
///
/// The index for a past date never changes, so a cached copy is always
/// used as-is.
pub struct IndexLoader {
    cache_dir: PathBuf,
    urls: ArchiveUrls,
    form_type: String,
}

impl IndexLoader {
    pub fn new<P: AsRef<Path>>(cache_dir: P, urls: ArchiveUrls, form_type: &str) -> Self {
        Self {
            cache_dir: cache_dir.as_ref().to_path_buf(),
            urls,
            form_type: form_type.to_string(),
        }
    }

    pub fn cache_path(&self, date: NaiveDate) -> PathBuf {
        self.cache_dir.join(ArchiveUrls::index_file_name(date))
    }

    /// Returns the entries of the given date's index whose form type is the
    /// target form type, in file order.
    pub async fn load<F: Fetch>(&self, fetcher: &F, date: NaiveDate) -> Result<Vec<IndexEntry>, EdgarError> {
        let cache_path = self.cache_path(date);

        let content = if cache_path.exists() {
            tracing::debug!("Using cached index {}", cache_path.display());
            String::from_utf8_lossy(&fs::read(&cache_path)?).into_owned()
        } else {
            let url = self.urls.daily_index_url(date);
            tracing::info!("Downloading index {}", url);
            let body = fetcher.get_text(&url).await?;

            // Persist before parsing. A cached file is trusted forever, so it
            // must never exist half-written.
            write_atomic(&cache_path, body.as_bytes())?;
            tracing::debug!("Cached index to {}", cache_path.display());
            body
        };

        let entries = parse_master_index(&content, &self.form_type)?;
        tracing::info!("{}: {} {} filings in index", date, entries.len(), self.form_type);
        Ok(entries)
    }
}

/// Column positions within a pipe-delimited index row.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Columns {
    company_name: usize,
    form_type: usize,
    cik: usize,
    date_filed: usize,
    file_name: usize,
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            company_name: 0,
            form_type: 1,
            cik: 2,
            date_filed: 3,
            file_name: 4,
        }
    }
}

impl Columns {
    /// Reads column positions from a header row such as
    /// `CIK|Company Name|Form Type|Date Filed|Filename`.
    fn from_header(line: &str) -> Option<Self> {
        let names: Vec<String> = line
            .split('|')
            .map(|name| name.trim().to_ascii_lowercase())
            .collect();

        Some(Self {
            company_name: position(&names, &["company name"])?,
            form_type: position(&names, &["form type"])?,
            cik: position(&names, &["cik"])?,
            date_filed: position(&names, &["date filed"])?,
            file_name: position(&names, &["file name", "filename"])?,
        })
    }
}

fn position(names: &[String], wanted: &[&str]) -> Option<usize> {
    names.iter().position(|n| wanted.contains(&n.as_str()))
}

/// Parses the body of a daily master index, keeping rows of `form_type`.
///
/// Preamble lines (no `|`), the column header and the dashed separator are
/// skipped. Rows of other form types are not validated.
pub fn parse_master_index(content: &str, form_type: &str) -> Result<Vec<IndexEntry>, EdgarError> {
    let mut columns = Columns::default();
    let mut entries = Vec::new();

    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim_end();
        if !line.contains('|') {
            continue;
        }
        if let Some(header) = Columns::from_header(line) {
            columns = header;
            continue;
        }

        let fields: Vec<&str> = line.split('|').map(str::trim).collect();
        match fields.get(columns.form_type) {
            Some(form) if *form == form_type => {}
            _ => continue,
        }

        let field = |index: usize, name: &str| {
            fields.get(index).copied().ok_or_else(|| {
                EdgarError::Parse(format!("line {}: missing '{}' column", line_no + 1, name))
            })
        };

        let file_path = field(columns.file_name, "File Name")?;
        if file_path.is_empty() {
            return Err(EdgarError::Parse(format!("line {}: empty file name", line_no + 1)));
        }
        let date_text = field(columns.date_filed, "Date Filed")?;
        let date_filed = parse_date_filed(date_text).ok_or_else(|| {
            EdgarError::Parse(format!("line {}: invalid date '{}'", line_no + 1, date_text))
        })?;

        entries.push(IndexEntry {
            form_type: form_type.to_string(),
            company_name: field(columns.company_name, "Company Name")?.to_string(),
            cik: field(columns.cik, "CIK")?.to_string(),
            file_path: file_path.to_string(),
            date_filed,
        });
    }

    Ok(entries)
}

fn parse_date_filed(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%Y%m%d"))
        .ok()
}
