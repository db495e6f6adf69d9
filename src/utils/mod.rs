// src/utils/mod.rs
pub mod atomic;
pub mod error;
pub mod logging;

pub use error::AppError; // Re-export main error type for convenience
