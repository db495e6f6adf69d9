// src/edgar/mod.rs
pub mod client;
pub mod index;
pub mod models;

pub use client::EdgarClient;
pub use index::IndexLoader;
pub use models::ArchiveUrls;
