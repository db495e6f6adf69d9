// src/storage/ledger.rs
use crate::utils::atomic::write_atomic;
use crate::utils::error::StorageError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LedgerEntry {
    url: String,
    processed_at: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerDocument {
    processed: Vec<LedgerEntry>,
}

/// Durable, append-only record of filings that were fully extracted and written.
///
/// Opened once at startup and handed to the pipeline. Every
/// [`mark_processed`](Ledger::mark_processed) is committed to disk before it
/// returns, so the file on disk is always the source of truth for the next run.
pub struct Ledger {
    path: PathBuf,
    document: LedgerDocument,
    keys: HashSet<String>,
}

impl Ledger {
    /// Opens the ledger at `path`; a missing file is an empty ledger.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        let document = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                LedgerDocument::default()
            } else {
                serde_json::from_str(&raw).map_err(|e| StorageError::CorruptLedger {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?
            }
        } else {
            LedgerDocument::default()
        };

        let keys = document.processed.iter().map(|e| e.url.clone()).collect();
        tracing::info!("Opened ledger {} ({} processed filings)", path.display(), document.processed.len());

        Ok(Self { path, document, keys })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Records `key` as processed and commits the ledger. Marking a key twice
    /// is a no-op.
    pub fn mark_processed(&mut self, key: &str) -> Result<(), StorageError> {
        if self.keys.contains(key) {
            return Ok(());
        }

        self.document.processed.push(LedgerEntry {
            url: key.to_string(),
            processed_at: chrono::Utc::now().to_rfc3339(),
        });
        if let Err(e) = self.persist() {
            // Keep memory consistent with disk.
            self.document.processed.pop();
            return Err(e);
        }
        self.keys.insert(key.to_string());

        tracing::debug!("Ledger: marked {}", key);
        Ok(())
    }

    /// Flushes and releases the ledger.
    pub fn close(self) -> Result<(), StorageError> {
        self.persist()?;
        tracing::info!("Closed ledger {} ({} processed filings)", self.path.display(), self.len());
        Ok(())
    }

    fn persist(&self) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(&self.document)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        write_atomic(&self.path, json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const URL: &str = "https://www.sec.gov/Archives/edgar/data/877232/0001752724-20-141234.txt";

    #[test]
    fn missing_file_opens_empty() {
        let dir = tempdir().unwrap();
        let ledger = Ledger::open(dir.path().join("ledger.json")).unwrap();
        assert_eq!(ledger.len(), 0);
        assert!(!ledger.contains(URL));
    }

    #[test]
    fn marked_keys_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.json");

        let mut ledger = Ledger::open(&path).unwrap();
        ledger.mark_processed(URL).unwrap();
        assert!(ledger.contains(URL));
        // Dropped without close: the mark must already be on disk.
        drop(ledger);

        let reopened = Ledger::open(&path).unwrap();
        assert!(reopened.contains(URL));
        assert_eq!(reopened.len(), 1);
        reopened.close().unwrap();
    }

    #[test]
    fn marking_twice_keeps_one_entry() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.json");

        let mut ledger = Ledger::open(&path).unwrap();
        ledger.mark_processed(URL).unwrap();
        ledger.mark_processed(URL).unwrap();
        ledger.close().unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        let document: LedgerDocument = serde_json::from_str(&raw).unwrap();
        assert_eq!(document.processed.len(), 1);
        assert_eq!(document.processed[0].url, URL);
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(Ledger::open(&path), Err(StorageError::CorruptLedger { .. })));
    }
}
