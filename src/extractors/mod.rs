// src/extractors/mod.rs
pub mod nport;

// Re-export key extraction types for convenience
pub use nport::NportExtractor;
