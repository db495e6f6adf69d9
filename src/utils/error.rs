// src/utils/error.rs
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum EdgarError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error), // Automatically convert reqwest errors

    #[error("HTTP error: {0}")]
    Http(reqwest::StatusCode), // e.g., 500 Internal Server Error

    #[error("SEC Rate limit likely exceeded")]
    RateLimited,

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Failed to parse index file: {0}")]
    Parse(String),

    #[error("Index cache error: {0}")]
    Cache(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("XML parsing error: {0}")]
    Xml(String),

    #[error("Field '{field}' is not a valid number: '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Field '{field}' is not a valid integer: '{value}'")]
    InvalidInteger { field: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Ledger file {path} is corrupt: {reason}")]
    CorruptLedger { path: String, reason: String },
}

/// Failure of one filing's fetch → extract → write cycle.
#[derive(Error, Debug)]
pub enum FilingError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] EdgarError),

    #[error("parse failed: {0}")]
    Parse(#[from] ExtractError),

    #[error("write failed: {0}")]
    Write(#[from] StorageError),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("EDGAR interaction failed: {0}")]
    Edgar(#[from] EdgarError), // Automatically convert Edgar errors

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Data processing failed: {0}")]
    Processing(String),
}
